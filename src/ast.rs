//! Typed AST for Constela programs.
//!
//! Produced by the schema validator from raw JSON. The serde representation of
//! every type matches the input wire format, so expressions, handlers and
//! action steps survive lowering byte-for-byte.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const SUPPORTED_VERSION: &str = "1.0";

/// Transition duration used when a directive omits one.
pub const DEFAULT_TRANSITION_DURATION_MS: u64 = 300;

// ═══════════════════════════════════════════════════════════════════════════════
// PROGRAM
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteDef>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub imports: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub data: IndexMap<String, DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<LifecycleHooks>,
    #[serde(default)]
    pub state: IndexMap<String, StateField>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    pub view: ViewNode,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub components: IndexMap<String, ComponentDef>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub styles: IndexMap<String, StylePreset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub widgets: Vec<WidgetRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDef {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub layout_params: IndexMap<String, Expression>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub meta: IndexMap<String, Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(rename = "type")]
    pub kind: DataSourceKind,
    /// Loader-specific options, passed through untouched.
    #[serde(flatten)]
    pub options: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataSourceKind {
    Glob,
    File,
    Api,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleHooks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_mount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_unmount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_route_enter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_route_leave: Option<String>,
}

impl LifecycleHooks {
    /// `(wire name, action name)` for every hook that is set.
    pub fn hooks(&self) -> Vec<(&'static str, &str)> {
        [
            ("onMount", &self.on_mount),
            ("onUnmount", &self.on_unmount),
            ("onRouteEnter", &self.on_route_enter),
            ("onRouteLeave", &self.on_route_leave),
        ]
        .into_iter()
        .filter_map(|(key, action)| action.as_deref().map(|a| (key, a)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetRef {
    pub id: String,
    pub src: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateField {
    #[serde(rename = "type")]
    pub kind: StateType,
    pub initial: InitialValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateType {
    Number,
    String,
    List,
    Boolean,
    Object,
}

impl StateType {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "number" => Some(StateType::Number),
            "string" => Some(StateType::String),
            "list" => Some(StateType::List),
            "boolean" => Some(StateType::Boolean),
            "object" => Some(StateType::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StateType::Number => "number",
            StateType::String => "string",
            StateType::List => "list",
            StateType::Boolean => "boolean",
            StateType::Object => "object",
        }
    }

    /// Whether a literal initial value has this type. Object state may start
    /// out `null`.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            StateType::Number => value.is_number(),
            StateType::String => value.is_string(),
            StateType::List => value.is_array(),
            StateType::Boolean => value.is_boolean(),
            StateType::Object => value.is_object() || value.is_null(),
        }
    }
}

/// Either a literal or an expression the runtime resolves on first read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitialValue {
    Deferred(DeferredInitial),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "camelCase")]
pub enum DeferredInitial {
    Cookie { key: String, default: Value },
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "camelCase")]
pub enum Expression {
    Lit {
        value: Value,
    },
    State {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Var {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Param {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Route {
        name: String,
        #[serde(default)]
        source: RouteSource,
    },
    Import {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Data {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Ref {
        name: String,
    },
    Bin {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Not {
        operand: Box<Expression>,
    },
    Cond {
        #[serde(rename = "if")]
        condition: Box<Expression>,
        then: Box<Expression>,
        #[serde(rename = "else")]
        otherwise: Box<Expression>,
    },
    Get {
        base: Box<Expression>,
        path: String,
    },
    Index {
        base: Box<Expression>,
        key: Box<Expression>,
    },
    Concat {
        items: Vec<Expression>,
    },
    Array {
        elements: Vec<Expression>,
    },
    Obj {
        props: IndexMap<String, Expression>,
    },
    Style {
        name: String,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        variants: IndexMap<String, Expression>,
    },
    Validity {
        #[serde(rename = "ref")]
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        property: Option<String>,
    },
    Call {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<Box<Expression>>,
        method: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Expression>,
    },
    Lambda {
        param: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<String>,
        body: Box<Expression>,
    },
}

impl Expression {
    pub fn lit(value: impl Into<Value>) -> Self {
        Expression::Lit {
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteSource {
    #[default]
    Param,
    Query,
    Path,
}

impl RouteSource {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "param" => Some(RouteSource::Param),
            "query" => Some(RouteSource::Query),
            "path" => Some(RouteSource::Path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinaryOp {
    pub fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewNode {
    Element(ElementNode),
    Text(TextNode),
    If(IfNode),
    Each(EachNode),
    Component(ComponentNode),
    Slot(SlotNode),
    Markdown(MarkdownNode),
    Code(CodeNode),
    Portal(PortalNode),
    Island(IslandNode),
    Suspense(SuspenseNode),
    ErrorBoundary(ErrorBoundaryNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub props: IndexMap<String, PropValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ViewNode>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Handler(EventHandler),
    Expr(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHandler {
    pub event: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IfNode {
    pub condition: Expression,
    pub then: Box<ViewNode>,
    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<Box<ViewNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EachNode {
    pub items: Expression,
    #[serde(rename = "as")]
    pub binding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Expression>,
    pub body: Box<ViewNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionConfig {
    pub enter: String,
    pub enter_active: String,
    pub exit: String,
    pub exit_active: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Number>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub props: IndexMap<String, Expression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ViewNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownNode {
    pub content: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeNode {
    pub language: Expression,
    pub content: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalNode {
    pub target: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ViewNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslandNode {
    pub id: String,
    pub strategy: IslandStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_options: Option<Value>,
    pub content: Box<ViewNode>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub state: IndexMap<String, StateField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IslandStrategy {
    Load,
    Idle,
    Visible,
    Interaction,
    Media,
    Never,
}

impl IslandStrategy {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "load" => Some(IslandStrategy::Load),
            "idle" => Some(IslandStrategy::Idle),
            "visible" => Some(IslandStrategy::Visible),
            "interaction" => Some(IslandStrategy::Interaction),
            "media" => Some(IslandStrategy::Media),
            "never" => Some(IslandStrategy::Never),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspenseNode {
    pub id: String,
    pub fallback: Box<ViewNode>,
    pub content: Box<ViewNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBoundaryNode {
    pub fallback: Box<ViewNode>,
    pub content: Box<ViewNode>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENTS & STYLES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDef {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, ParamDef>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub local_state: IndexMap<String, StateField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_actions: Vec<ActionDef>,
    pub view: ViewNode,
}

impl ComponentDef {
    /// Instances of this component get their own state/action namespace.
    pub fn is_stateful(&self) -> bool {
        !self.local_state.is_empty() || !self.local_actions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    #[serde(rename = "type")]
    pub kind: ParamType,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Json,
}

impl ParamType {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(ParamType::String),
            "number" => Some(ParamType::Number),
            "boolean" => Some(ParamType::Boolean),
            "json" => Some(ParamType::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePreset {
    pub base: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variants: IndexMap<String, IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub default_variants: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compound_variants: Vec<IndexMap<String, String>>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub name: String,
    pub steps: Vec<ActionStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "do", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ActionStep {
    Set {
        target: String,
        value: Expression,
    },
    Update {
        target: String,
        operation: UpdateOperation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expression>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<Expression>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delete_count: Option<Expression>,
    },
    SetPath {
        target: String,
        path: Expression,
        value: Expression,
    },
    Fetch {
        url: Expression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Expression>,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        headers: IndexMap<String, Expression>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_success: Vec<ActionStep>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_error: Vec<ActionStep>,
    },
    Storage {
        operation: StorageOperation,
        key: Expression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expression>,
        storage: StorageKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_success: Vec<ActionStep>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_error: Vec<ActionStep>,
    },
    Clipboard {
        operation: ClipboardOperation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expression>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_success: Vec<ActionStep>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_error: Vec<ActionStep>,
    },
    Navigate {
        url: Expression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<NavigateTarget>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replace: Option<bool>,
    },
    Import {
        module: String,
        result: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_success: Vec<ActionStep>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_error: Vec<ActionStep>,
    },
    Call {
        target: Expression,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Expression>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_success: Vec<ActionStep>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_error: Vec<ActionStep>,
    },
    Subscribe {
        target: Expression,
        event: String,
        action: String,
    },
    Dispose {
        target: Expression,
    },
    Dom {
        operation: DomOperation,
        selector: Expression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expression>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribute: Option<String>,
    },
    Send {
        connection: String,
        data: Expression,
    },
    Close {
        connection: String,
    },
    Delay {
        ms: Expression,
        then: Vec<ActionStep>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
    Interval {
        ms: Expression,
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
    ClearTimer {
        target: Expression,
    },
    Focus {
        target: Expression,
        operation: FocusOperation,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_success: Vec<ActionStep>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_error: Vec<ActionStep>,
    },
    If {
        condition: Expression,
        then: Vec<ActionStep>,
        #[serde(rename = "else", default, skip_serializing_if = "Vec::is_empty")]
        otherwise: Vec<ActionStep>,
    },
    SseConnect {
        connection: String,
        url: Expression,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        event_types: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reconnect: Option<Value>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_open: Vec<ActionStep>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_message: Vec<ActionStep>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        on_error: Vec<ActionStep>,
    },
    SseClose {
        connection: String,
    },
    Optimistic {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<Expression>,
        value: Expression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
    Confirm {
        id: Expression,
    },
    Reject {
        id: Expression,
    },
    Bind {
        connection: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event: Option<String>,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<Expression>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transform: Option<Expression>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        patch: Option<bool>,
    },
    Unbind {
        connection: String,
        target: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateOperation {
    Increment,
    Decrement,
    Push,
    Pop,
    Remove,
    ReplaceAt,
    InsertAt,
    Splice,
    Toggle,
    Merge,
}

impl UpdateOperation {
    pub fn parse(tag: &str) -> Option<Self> {
        Some(match tag {
            "increment" => UpdateOperation::Increment,
            "decrement" => UpdateOperation::Decrement,
            "push" => UpdateOperation::Push,
            "pop" => UpdateOperation::Pop,
            "remove" => UpdateOperation::Remove,
            "replaceAt" => UpdateOperation::ReplaceAt,
            "insertAt" => UpdateOperation::InsertAt,
            "splice" => UpdateOperation::Splice,
            "toggle" => UpdateOperation::Toggle,
            "merge" => UpdateOperation::Merge,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOperation::Increment => "increment",
            UpdateOperation::Decrement => "decrement",
            UpdateOperation::Push => "push",
            UpdateOperation::Pop => "pop",
            UpdateOperation::Remove => "remove",
            UpdateOperation::ReplaceAt => "replaceAt",
            UpdateOperation::InsertAt => "insertAt",
            UpdateOperation::Splice => "splice",
            UpdateOperation::Toggle => "toggle",
            UpdateOperation::Merge => "merge",
        }
    }

    /// The only state type this operation can be applied to.
    pub fn target_type(&self) -> StateType {
        match self {
            UpdateOperation::Increment | UpdateOperation::Decrement => StateType::Number,
            UpdateOperation::Push
            | UpdateOperation::Pop
            | UpdateOperation::Remove
            | UpdateOperation::ReplaceAt
            | UpdateOperation::InsertAt
            | UpdateOperation::Splice => StateType::List,
            UpdateOperation::Toggle => StateType::Boolean,
            UpdateOperation::Merge => StateType::Object,
        }
    }

    /// Step fields (wire names) this operation cannot run without.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            UpdateOperation::Push | UpdateOperation::Remove | UpdateOperation::Merge => &["value"],
            UpdateOperation::ReplaceAt | UpdateOperation::InsertAt => &["index", "value"],
            UpdateOperation::Splice => &["index", "deleteCount"],
            UpdateOperation::Increment
            | UpdateOperation::Decrement
            | UpdateOperation::Pop
            | UpdateOperation::Toggle => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageOperation {
    Get,
    Set,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageKind {
    Local,
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClipboardOperation {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigateTarget {
    #[serde(rename = "_self")]
    SelfFrame,
    #[serde(rename = "_blank")]
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DomOperation {
    AddClass,
    RemoveClass,
    ToggleClass,
    SetAttribute,
    RemoveAttribute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FocusOperation {
    Focus,
    Blur,
    Select,
}
