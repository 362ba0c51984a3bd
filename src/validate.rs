//! Schema Validator
//!
//! Turns an arbitrary JSON value into a typed [`Program`] or the first
//! structural problem found, addressed by JSON Pointer. Checks run in a fixed
//! order (root shape, version, state, actions, view, optional sections) so
//! the reported error is deterministic.
//!
//! Every Expression, ViewNode and ActionStep entered costs one level of the
//! configured depth budget.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::ast::{
    ActionDef, ActionStep, BinaryOp, CodeNode, ComponentDef, ComponentNode, DataSource,
    DeferredInitial, EachNode, ElementNode, ErrorBoundaryNode, EventHandler, Expression, IfNode,
    InitialValue, IslandNode, IslandStrategy, LifecycleHooks, MarkdownNode, ParamDef, ParamType,
    PortalNode, Program, PropValue, RouteDef, RouteSource, SlotNode, StateField, StateType,
    StylePreset, SuspenseNode, TextNode, TransitionConfig, UpdateOperation, ViewNode, WidgetRef,
    SUPPORTED_VERSION,
};
use crate::error::{ConstelaError, ErrorCode};
use crate::options::CompileOptions;
use crate::pointer::{join, join_index};

// ═══════════════════════════════════════════════════════════════════════════════
// KNOWN TAGS
// ═══════════════════════════════════════════════════════════════════════════════

pub const EXPRESSION_TYPES: &[&str] = &[
    "lit", "state", "var", "param", "route", "import", "data", "ref", "bin", "not", "cond", "get",
    "index", "concat", "array", "obj", "style", "validity", "call", "lambda",
];

pub const VIEW_KINDS: &[&str] = &[
    "element",
    "text",
    "if",
    "each",
    "component",
    "slot",
    "markdown",
    "code",
    "portal",
    "island",
    "suspense",
    "errorBoundary",
];

pub const ACTION_STEP_TYPES: &[&str] = &[
    "set",
    "update",
    "setPath",
    "fetch",
    "storage",
    "clipboard",
    "navigate",
    "import",
    "call",
    "subscribe",
    "dispose",
    "dom",
    "send",
    "close",
    "delay",
    "interval",
    "clearTimer",
    "focus",
    "if",
    "sseConnect",
    "sseClose",
    "optimistic",
    "confirm",
    "reject",
    "bind",
    "unbind",
];

const STATE_TYPES: &[&str] = &["number", "string", "list", "boolean", "object"];
const BINARY_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "==", "!=", "<", "<=", ">", ">=", "&&", "||",
];
const ROUTE_SOURCES: &[&str] = &["param", "query", "path"];
const UPDATE_OPERATIONS: &[&str] = &[
    "increment",
    "decrement",
    "push",
    "pop",
    "remove",
    "replaceAt",
    "insertAt",
    "splice",
    "toggle",
    "merge",
];
const STORAGE_OPERATIONS: &[&str] = &["get", "set", "remove"];
const STORAGE_KINDS: &[&str] = &["local", "session"];
const CLIPBOARD_OPERATIONS: &[&str] = &["read", "write"];
const NAVIGATE_TARGETS: &[&str] = &["_self", "_blank"];
const DOM_OPERATIONS: &[&str] = &[
    "addClass",
    "removeClass",
    "toggleClass",
    "setAttribute",
    "removeAttribute",
];
const FOCUS_OPERATIONS: &[&str] = &["focus", "blur", "select"];
const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];
const ISLAND_STRATEGIES: &[&str] = &["load", "idle", "visible", "interaction", "media", "never"];
const PARAM_TYPES: &[&str] = &["string", "number", "boolean", "json"];
const DATA_SOURCE_KINDS: &[&str] = &["glob", "file", "api"];

type Schema<T> = Result<T, ConstelaError>;

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn validate(raw: &Value) -> Result<Program, ConstelaError> {
    validate_with_options(raw, &CompileOptions::default())
}

pub fn validate_with_options(raw: &Value, options: &CompileOptions) -> Result<Program, ConstelaError> {
    SchemaValidator::new(options).program(raw)
}

/// Layout programs: `state`/`actions` optional, no `route`, optional
/// `type: "layout"` marker.
pub fn validate_layout_with_options(
    raw: &Value,
    options: &CompileOptions,
) -> Result<Program, ConstelaError> {
    SchemaValidator::new(options).layout(raw)
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHALLOW GUARDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Only looks at the node's own shape. Used to pick how a prop value is
/// validated; the chosen path then checks it in depth.
pub fn is_event_handler_shape(value: &Value) -> bool {
    value.as_object().map_or(false, |o| o.contains_key("event"))
}

/// Only `cookie` is resolved by the runtime; any other object is a literal.
fn is_deferred_initial_shape(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|o| o.get("expr"))
        .and_then(Value::as_str)
        == Some("cookie")
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD ACCESS
// ═══════════════════════════════════════════════════════════════════════════════

fn object<'a>(value: &'a Value, path: &str, what: &str) -> Schema<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        ConstelaError::schema(path, format!("{} must be an object, got {}", what, kind_of(value)))
    })
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Schema<&'a Value> {
    obj.get(key).ok_or_else(|| {
        ConstelaError::schema(&join(path, key), format!("Missing required field '{}'", key))
    })
}

/// Absent and `null` are the same thing for optional fields.
fn optional_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn expect_str<'a>(value: &'a Value, path: &str, key: &str) -> Schema<&'a str> {
    value.as_str().ok_or_else(|| {
        ConstelaError::schema(
            path,
            format!("Field '{}' must be a string, got {}", key, kind_of(value)),
        )
    })
}

fn string(obj: &Map<String, Value>, key: &str, path: &str) -> Schema<String> {
    let value = field(obj, key, path)?;
    expect_str(value, &join(path, key), key).map(str::to_string)
}

fn optional_string(obj: &Map<String, Value>, key: &str, path: &str) -> Schema<Option<String>> {
    match optional_field(obj, key) {
        Some(value) => Ok(Some(expect_str(value, &join(path, key), key)?.to_string())),
        None => Ok(None),
    }
}

fn optional_bool(obj: &Map<String, Value>, key: &str, path: &str) -> Schema<Option<bool>> {
    match optional_field(obj, key) {
        Some(value) => value.as_bool().map(Some).ok_or_else(|| {
            ConstelaError::schema(
                &join(path, key),
                format!("Field '{}' must be a boolean, got {}", key, kind_of(value)),
            )
        }),
        None => Ok(None),
    }
}

fn optional_duration(obj: &Map<String, Value>, key: &str, path: &str) -> Schema<Option<Number>> {
    match optional_field(obj, key) {
        Some(Value::Number(n)) if n.as_f64().map_or(false, |f| f >= 0.0) => Ok(Some(n.clone())),
        Some(value) => Err(ConstelaError::schema(
            &join(path, key),
            format!(
                "Field '{}' must be a non-negative number, got {}",
                key,
                if value.is_number() { "a negative number" } else { kind_of(value) }
            ),
        )),
        None => Ok(None),
    }
}

fn optional_object<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Schema<Option<&'a Map<String, Value>>> {
    match optional_field(obj, key) {
        Some(value) => object(value, &join(path, key), &format!("Field '{}'", key)).map(Some),
        None => Ok(None),
    }
}

fn array<'a>(value: &'a Value, path: &str, key: &str) -> Schema<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| {
        ConstelaError::schema(
            path,
            format!("Field '{}' must be an array, got {}", key, kind_of(value)),
        )
    })
}

fn string_map(value: &Value, path: &str, what: &str) -> Schema<IndexMap<String, String>> {
    object(value, path, what)?
        .iter()
        .map(|(k, v)| Ok((k.clone(), expect_str(v, &join(path, k), k)?.to_string())))
        .collect()
}

fn tag<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
    what: &str,
    known: &[&str],
) -> Schema<&'a str> {
    let value = field(obj, key, path)?;
    let tag_path = join(path, key);
    let tag = expect_str(value, &tag_path, key)?;
    if known.contains(&tag) {
        Ok(tag)
    } else {
        Err(unknown_tag(&tag_path, what, tag, known))
    }
}

fn unknown_tag(path: &str, what: &str, tag: &str, known: &[&str]) -> ConstelaError {
    ConstelaError::schema(path, format!("Unknown {} '{}'", what, tag))
        .with_context("expected", known.join(", "))
}

fn parse_tag<T>(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    what: &str,
    known: &[&str],
    parse: impl Fn(&str) -> Option<T>,
) -> Schema<T> {
    let raw = tag(obj, key, path, what, known)?;
    parse(raw).ok_or_else(|| unknown_tag(&join(path, key), what, raw, known))
}

fn optional_tag<T>(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    what: &str,
    known: &[&str],
    parse: impl Fn(&str) -> Option<T>,
) -> Schema<Option<T>> {
    match optional_field(obj, key) {
        Some(_) => parse_tag(obj, key, path, what, known, parse).map(Some),
        None => Ok(None),
    }
}

/// Keyword enums whose serde names are their wire names.
fn from_keyword<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_value(Value::String(raw.to_string())).ok()
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATOR
// ═══════════════════════════════════════════════════════════════════════════════

struct SchemaValidator {
    max_depth: usize,
}

impl SchemaValidator {
    fn new(options: &CompileOptions) -> Self {
        SchemaValidator {
            max_depth: options.max_depth,
        }
    }

    fn descend(&self, depth: usize, path: &str) -> Schema<usize> {
        let next = depth + 1;
        if next > self.max_depth {
            return Err(ConstelaError::new(
                ErrorCode::MaxNestingExceeded,
                format!("Nesting exceeds the maximum depth of {}", self.max_depth),
            )
            .at(path)
            .with_context("maxDepth", self.max_depth));
        }
        Ok(next)
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Roots
    // ───────────────────────────────────────────────────────────────────────────

    fn program(&self, raw: &Value) -> Schema<Program> {
        let obj = object(raw, "", "Program")?;
        let version = self.version(obj)?;
        let state = self.state_map(field(obj, "state", "")?, "/state")?;
        let actions = self.action_defs(field(obj, "actions", "")?, "/actions", 0)?;
        let view = self.view_node(field(obj, "view", "")?, "/view", 0)?;
        let route = match optional_field(obj, "route") {
            Some(value) => Some(self.route(value, "/route")?),
            None => None,
        };

        Ok(Program {
            version,
            route,
            imports: self.imports(obj)?,
            data: self.data(obj)?,
            lifecycle: self.lifecycle(obj)?,
            state,
            actions,
            view,
            styles: self.styles(obj)?,
            components: self.components(obj)?,
            widgets: self.widgets(obj)?,
        })
    }

    fn layout(&self, raw: &Value) -> Schema<Program> {
        let obj = object(raw, "", "Layout")?;
        let version = self.version(obj)?;
        if let Some(marker) = optional_field(obj, "type") {
            if marker.as_str() != Some("layout") {
                return Err(ConstelaError::schema(
                    "/type",
                    format!("Layout 'type' must be \"layout\", got {}", marker),
                ));
            }
        }
        let state = match optional_field(obj, "state") {
            Some(value) => self.state_map(value, "/state")?,
            None => IndexMap::new(),
        };
        let actions = match optional_field(obj, "actions") {
            Some(value) => self.action_defs(value, "/actions", 0)?,
            None => Vec::new(),
        };
        let view = self.view_node(field(obj, "view", "")?, "/view", 0)?;

        Ok(Program {
            version,
            route: None,
            imports: self.imports(obj)?,
            data: self.data(obj)?,
            lifecycle: None,
            state,
            actions,
            view,
            styles: self.styles(obj)?,
            components: self.components(obj)?,
            widgets: Vec::new(),
        })
    }

    fn version(&self, obj: &Map<String, Value>) -> Schema<String> {
        let value = field(obj, "version", "")?;
        match value.as_str() {
            Some(SUPPORTED_VERSION) => Ok(SUPPORTED_VERSION.to_string()),
            _ => Err(ConstelaError::new(
                ErrorCode::UnsupportedVersion,
                format!(
                    "Unsupported version {}; expected \"{}\"",
                    value, SUPPORTED_VERSION
                ),
            )
            .at("/version")
            .with_context("version", value.clone())),
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // State
    // ───────────────────────────────────────────────────────────────────────────

    fn state_map(&self, value: &Value, path: &str) -> Schema<IndexMap<String, StateField>> {
        object(value, path, "State")?
            .iter()
            .map(|(name, field)| Ok((name.clone(), self.state_field(field, &join(path, name))?)))
            .collect()
    }

    fn state_field(&self, value: &Value, path: &str) -> Schema<StateField> {
        let obj = object(value, path, "State field")?;
        let kind = parse_tag(obj, "type", path, "state type", STATE_TYPES, StateType::parse)?;
        let raw_initial = field(obj, "initial", path)?;
        let initial_path = join(path, "initial");

        let initial = if is_deferred_initial_shape(raw_initial) {
            let deferred = object(raw_initial, &initial_path, "Initial value")?;
            let key = string(deferred, "key", &initial_path)?;
            let default = field(deferred, "default", &initial_path)?;
            if !kind.accepts(default) {
                return Err(ConstelaError::schema(
                    &join(&initial_path, "default"),
                    format!(
                        "Cookie default for '{}' state has the wrong type ({})",
                        kind.as_str(),
                        kind_of(default)
                    ),
                ));
            }
            InitialValue::Deferred(DeferredInitial::Cookie {
                key,
                default: default.clone(),
            })
        } else {
            if !kind.accepts(raw_initial) {
                return Err(ConstelaError::schema(
                    &initial_path,
                    format!(
                        "Initial value for '{}' state has the wrong type ({})",
                        kind.as_str(),
                        kind_of(raw_initial)
                    ),
                ));
            }
            InitialValue::Literal(raw_initial.clone())
        };

        Ok(StateField { kind, initial })
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Actions
    // ───────────────────────────────────────────────────────────────────────────

    fn action_defs(&self, value: &Value, path: &str, depth: usize) -> Schema<Vec<ActionDef>> {
        array(value, path, "actions")?
            .iter()
            .enumerate()
            .map(|(i, action)| self.action_def(action, &join_index(path, i), depth))
            .collect()
    }

    fn action_def(&self, value: &Value, path: &str, depth: usize) -> Schema<ActionDef> {
        let obj = object(value, path, "Action")?;
        let name = string(obj, "name", path)?;
        let steps = self.step_list(field(obj, "steps", path)?, &join(path, "steps"), depth)?;
        Ok(ActionDef { name, steps })
    }

    fn step_list(&self, value: &Value, path: &str, depth: usize) -> Schema<Vec<ActionStep>> {
        array(value, path, "steps")?
            .iter()
            .enumerate()
            .map(|(i, step)| self.step(step, &join_index(path, i), depth))
            .collect()
    }

    fn optional_steps(
        &self,
        obj: &Map<String, Value>,
        key: &str,
        path: &str,
        depth: usize,
    ) -> Schema<Vec<ActionStep>> {
        match optional_field(obj, key) {
            Some(value) => self.step_list(value, &join(path, key), depth),
            None => Ok(Vec::new()),
        }
    }

    fn step(&self, value: &Value, path: &str, depth: usize) -> Schema<ActionStep> {
        let depth = self.descend(depth, path)?;
        let obj = object(value, path, "Action step")?;
        let kind = tag(obj, "do", path, "action step", ACTION_STEP_TYPES)?;

        let expr = |key: &str| self.expression(field(obj, key, path)?, &join(path, key), depth);
        let opt_expr = |key: &str| self.optional_expression(obj, key, path, depth);
        let steps = |key: &str| self.optional_steps(obj, key, path, depth);
        let text = |key: &str| string(obj, key, path);
        let opt_text = |key: &str| optional_string(obj, key, path);

        Ok(match kind {
            "set" => ActionStep::Set {
                target: text("target")?,
                value: expr("value")?,
            },
            "update" => ActionStep::Update {
                target: text("target")?,
                operation: parse_tag(
                    obj,
                    "operation",
                    path,
                    "update operation",
                    UPDATE_OPERATIONS,
                    UpdateOperation::parse,
                )?,
                value: opt_expr("value")?,
                index: opt_expr("index")?,
                delete_count: opt_expr("deleteCount")?,
            },
            "setPath" => ActionStep::SetPath {
                target: text("target")?,
                path: expr("path")?,
                value: expr("value")?,
            },
            "fetch" => ActionStep::Fetch {
                url: expr("url")?,
                method: optional_tag(obj, "method", path, "HTTP method", HTTP_METHODS, |m| {
                    Some(m.to_string())
                })?,
                body: opt_expr("body")?,
                headers: self.expression_map(obj, "headers", path, depth)?,
                result: opt_text("result")?,
                on_success: steps("onSuccess")?,
                on_error: steps("onError")?,
            },
            "storage" => ActionStep::Storage {
                operation: parse_tag(
                    obj,
                    "operation",
                    path,
                    "storage operation",
                    STORAGE_OPERATIONS,
                    from_keyword,
                )?,
                key: expr("key")?,
                value: opt_expr("value")?,
                storage: parse_tag(obj, "storage", path, "storage kind", STORAGE_KINDS, from_keyword)?,
                result: opt_text("result")?,
                on_success: steps("onSuccess")?,
                on_error: steps("onError")?,
            },
            "clipboard" => ActionStep::Clipboard {
                operation: parse_tag(
                    obj,
                    "operation",
                    path,
                    "clipboard operation",
                    CLIPBOARD_OPERATIONS,
                    from_keyword,
                )?,
                value: opt_expr("value")?,
                result: opt_text("result")?,
                on_success: steps("onSuccess")?,
                on_error: steps("onError")?,
            },
            "navigate" => ActionStep::Navigate {
                url: expr("url")?,
                target: optional_tag(
                    obj,
                    "target",
                    path,
                    "navigation target",
                    NAVIGATE_TARGETS,
                    from_keyword,
                )?,
                replace: optional_bool(obj, "replace", path)?,
            },
            "import" => ActionStep::Import {
                module: text("module")?,
                result: text("result")?,
                on_success: steps("onSuccess")?,
                on_error: steps("onError")?,
            },
            "call" => ActionStep::Call {
                target: expr("target")?,
                args: self.optional_expression_list(obj, "args", path, depth)?,
                result: opt_text("result")?,
                on_success: steps("onSuccess")?,
                on_error: steps("onError")?,
            },
            "subscribe" => ActionStep::Subscribe {
                target: expr("target")?,
                event: text("event")?,
                action: text("action")?,
            },
            "dispose" => ActionStep::Dispose {
                target: expr("target")?,
            },
            "dom" => ActionStep::Dom {
                operation: parse_tag(obj, "operation", path, "DOM operation", DOM_OPERATIONS, from_keyword)?,
                selector: expr("selector")?,
                value: opt_expr("value")?,
                attribute: opt_text("attribute")?,
            },
            "send" => ActionStep::Send {
                connection: text("connection")?,
                data: expr("data")?,
            },
            "close" => ActionStep::Close {
                connection: text("connection")?,
            },
            "delay" => ActionStep::Delay {
                ms: expr("ms")?,
                then: self.step_list(field(obj, "then", path)?, &join(path, "then"), depth)?,
                result: opt_text("result")?,
            },
            "interval" => ActionStep::Interval {
                ms: expr("ms")?,
                action: text("action")?,
                result: opt_text("result")?,
            },
            "clearTimer" => ActionStep::ClearTimer {
                target: expr("target")?,
            },
            "focus" => ActionStep::Focus {
                target: expr("target")?,
                operation: parse_tag(
                    obj,
                    "operation",
                    path,
                    "focus operation",
                    FOCUS_OPERATIONS,
                    from_keyword,
                )?,
                on_success: steps("onSuccess")?,
                on_error: steps("onError")?,
            },
            "if" => ActionStep::If {
                condition: expr("condition")?,
                then: self.step_list(field(obj, "then", path)?, &join(path, "then"), depth)?,
                otherwise: steps("else")?,
            },
            "sseConnect" => ActionStep::SseConnect {
                connection: text("connection")?,
                url: expr("url")?,
                event_types: match optional_field(obj, "eventTypes") {
                    Some(value) => {
                        let types_path = join(path, "eventTypes");
                        array(value, &types_path, "eventTypes")?
                            .iter()
                            .enumerate()
                            .map(|(i, t)| {
                                expect_str(t, &join_index(&types_path, i), "eventTypes")
                                    .map(str::to_string)
                            })
                            .collect::<Schema<Vec<_>>>()?
                    }
                    None => Vec::new(),
                },
                reconnect: optional_object(obj, "reconnect", path)?
                    .map(|o| Value::Object(o.clone())),
                on_open: steps("onOpen")?,
                on_message: steps("onMessage")?,
                on_error: steps("onError")?,
            },
            "sseClose" => ActionStep::SseClose {
                connection: text("connection")?,
            },
            "optimistic" => ActionStep::Optimistic {
                target: text("target")?,
                path: opt_expr("path")?,
                value: expr("value")?,
                result: opt_text("result")?,
            },
            "confirm" => ActionStep::Confirm { id: expr("id")? },
            "reject" => ActionStep::Reject { id: expr("id")? },
            "bind" => ActionStep::Bind {
                connection: text("connection")?,
                event: opt_text("event")?,
                target: text("target")?,
                path: opt_expr("path")?,
                transform: opt_expr("transform")?,
                patch: optional_bool(obj, "patch", path)?,
            },
            "unbind" => ActionStep::Unbind {
                connection: text("connection")?,
                target: text("target")?,
            },
            other => {
                return Err(unknown_tag(&join(path, "do"), "action step", other, ACTION_STEP_TYPES))
            }
        })
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Expressions
    // ───────────────────────────────────────────────────────────────────────────

    fn expression(&self, value: &Value, path: &str, depth: usize) -> Schema<Expression> {
        let depth = self.descend(depth, path)?;
        let obj = object(value, path, "Expression")?;
        let kind = tag(obj, "expr", path, "expression type", EXPRESSION_TYPES)?;

        let child = |key: &str| -> Schema<Box<Expression>> {
            Ok(Box::new(self.expression(field(obj, key, path)?, &join(path, key), depth)?))
        };
        let name = || string(obj, "name", path);
        let sub_path = || optional_string(obj, "path", path);

        Ok(match kind {
            "lit" => Expression::Lit {
                value: field(obj, "value", path)?.clone(),
            },
            "state" => Expression::State {
                name: name()?,
                path: sub_path()?,
            },
            "var" => Expression::Var {
                name: name()?,
                path: sub_path()?,
            },
            "param" => Expression::Param {
                name: name()?,
                path: sub_path()?,
            },
            "route" => Expression::Route {
                name: name()?,
                source: optional_tag(obj, "source", path, "route source", ROUTE_SOURCES, RouteSource::parse)?
                    .unwrap_or_default(),
            },
            "import" => Expression::Import {
                name: name()?,
                path: sub_path()?,
            },
            "data" => Expression::Data {
                name: name()?,
                path: sub_path()?,
            },
            "ref" => Expression::Ref { name: name()? },
            "bin" => Expression::Bin {
                op: parse_tag(obj, "op", path, "binary operator", BINARY_OPERATORS, BinaryOp::parse)?,
                left: child("left")?,
                right: child("right")?,
            },
            "not" => Expression::Not {
                operand: child("operand")?,
            },
            "cond" => Expression::Cond {
                condition: child("if")?,
                then: child("then")?,
                otherwise: child("else")?,
            },
            "get" => Expression::Get {
                base: child("base")?,
                path: string(obj, "path", path)?,
            },
            "index" => Expression::Index {
                base: child("base")?,
                key: child("key")?,
            },
            "concat" => Expression::Concat {
                items: self.expression_list(obj, "items", path, depth)?,
            },
            "array" => Expression::Array {
                elements: self.expression_list(obj, "elements", path, depth)?,
            },
            "obj" => {
                field(obj, "props", path)?;
                Expression::Obj {
                    props: self.expression_map(obj, "props", path, depth)?,
                }
            }
            "style" => Expression::Style {
                name: name()?,
                variants: self.expression_map(obj, "variants", path, depth)?,
            },
            "validity" => Expression::Validity {
                target: string(obj, "ref", path)?,
                property: optional_string(obj, "property", path)?,
            },
            "call" => Expression::Call {
                target: match optional_field(obj, "target") {
                    Some(target) => Some(Box::new(self.expression(
                        target,
                        &join(path, "target"),
                        depth,
                    )?)),
                    None => None,
                },
                method: string(obj, "method", path)?,
                args: self.optional_expression_list(obj, "args", path, depth)?,
            },
            "lambda" => Expression::Lambda {
                param: string(obj, "param", path)?,
                index: optional_string(obj, "index", path)?,
                body: child("body")?,
            },
            other => {
                return Err(unknown_tag(
                    &join(path, "expr"),
                    "expression type",
                    other,
                    EXPRESSION_TYPES,
                ))
            }
        })
    }

    fn optional_expression(
        &self,
        obj: &Map<String, Value>,
        key: &str,
        path: &str,
        depth: usize,
    ) -> Schema<Option<Expression>> {
        match optional_field(obj, key) {
            Some(value) => Ok(Some(self.expression(value, &join(path, key), depth)?)),
            None => Ok(None),
        }
    }

    fn expression_list(
        &self,
        obj: &Map<String, Value>,
        key: &str,
        path: &str,
        depth: usize,
    ) -> Schema<Vec<Expression>> {
        let list_path = join(path, key);
        array(field(obj, key, path)?, &list_path, key)?
            .iter()
            .enumerate()
            .map(|(i, item)| self.expression(item, &join_index(&list_path, i), depth))
            .collect()
    }

    fn optional_expression_list(
        &self,
        obj: &Map<String, Value>,
        key: &str,
        path: &str,
        depth: usize,
    ) -> Schema<Vec<Expression>> {
        match optional_field(obj, key) {
            Some(_) => self.expression_list(obj, key, path, depth),
            None => Ok(Vec::new()),
        }
    }

    /// Optional `key -> Expression` map; absent means empty.
    fn expression_map(
        &self,
        obj: &Map<String, Value>,
        key: &str,
        path: &str,
        depth: usize,
    ) -> Schema<IndexMap<String, Expression>> {
        let map_path = join(path, key);
        match optional_object(obj, key, path)? {
            Some(entries) => entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), self.expression(v, &join(&map_path, k), depth)?)))
                .collect(),
            None => Ok(IndexMap::new()),
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // View
    // ───────────────────────────────────────────────────────────────────────────

    fn view_node(&self, value: &Value, path: &str, depth: usize) -> Schema<ViewNode> {
        let depth = self.descend(depth, path)?;
        let obj = object(value, path, "View node")?;
        let kind = tag(obj, "kind", path, "view node kind", VIEW_KINDS)?;

        let expr = |key: &str| self.expression(field(obj, key, path)?, &join(path, key), depth);
        let node = |key: &str| -> Schema<Box<ViewNode>> {
            Ok(Box::new(self.view_node(field(obj, key, path)?, &join(path, key), depth)?))
        };
        let children = || self.view_children(obj, path, depth);

        Ok(match kind {
            "element" => ViewNode::Element(ElementNode {
                tag: string(obj, "tag", path)?,
                props: self.element_props(obj, path, depth)?,
                children: children()?,
                ref_name: optional_string(obj, "ref", path)?,
            }),
            "text" => ViewNode::Text(TextNode {
                value: expr("value")?,
            }),
            "if" => ViewNode::If(IfNode {
                condition: expr("condition")?,
                then: node("then")?,
                otherwise: match optional_field(obj, "else") {
                    Some(value) => Some(Box::new(self.view_node(value, &join(path, "else"), depth)?)),
                    None => None,
                },
                transition: self.transition(obj, path)?,
            }),
            "each" => ViewNode::Each(EachNode {
                items: expr("items")?,
                binding: string(obj, "as", path)?,
                index: optional_string(obj, "index", path)?,
                key: self.optional_expression(obj, "key", path, depth)?,
                body: node("body")?,
                transition: self.transition(obj, path)?,
            }),
            "component" => ViewNode::Component(ComponentNode {
                name: string(obj, "name", path)?,
                props: self.expression_map(obj, "props", path, depth)?,
                children: children()?,
            }),
            "slot" => ViewNode::Slot(SlotNode {
                name: optional_string(obj, "name", path)?,
            }),
            "markdown" => ViewNode::Markdown(MarkdownNode {
                content: expr("content")?,
            }),
            "code" => ViewNode::Code(CodeNode {
                language: expr("language")?,
                content: expr("content")?,
            }),
            "portal" => ViewNode::Portal(PortalNode {
                target: string(obj, "target", path)?,
                children: children()?,
            }),
            "island" => ViewNode::Island(IslandNode {
                id: string(obj, "id", path)?,
                strategy: parse_tag(
                    obj,
                    "strategy",
                    path,
                    "island strategy",
                    ISLAND_STRATEGIES,
                    IslandStrategy::parse,
                )?,
                strategy_options: optional_object(obj, "strategyOptions", path)?
                    .map(|o| Value::Object(o.clone())),
                content: node("content")?,
                state: match optional_field(obj, "state") {
                    Some(value) => self.state_map(value, &join(path, "state"))?,
                    None => IndexMap::new(),
                },
                actions: match optional_field(obj, "actions") {
                    Some(value) => self.action_defs(value, &join(path, "actions"), depth)?,
                    None => Vec::new(),
                },
            }),
            "suspense" => ViewNode::Suspense(SuspenseNode {
                id: string(obj, "id", path)?,
                fallback: node("fallback")?,
                content: node("content")?,
            }),
            "errorBoundary" => ViewNode::ErrorBoundary(ErrorBoundaryNode {
                fallback: node("fallback")?,
                content: node("content")?,
            }),
            other => {
                return Err(unknown_tag(&join(path, "kind"), "view node kind", other, VIEW_KINDS))
            }
        })
    }

    fn view_children(
        &self,
        obj: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Schema<Vec<ViewNode>> {
        match optional_field(obj, "children") {
            Some(value) => {
                let children_path = join(path, "children");
                array(value, &children_path, "children")?
                    .iter()
                    .enumerate()
                    .map(|(i, child)| self.view_node(child, &join_index(&children_path, i), depth))
                    .collect()
            }
            None => Ok(Vec::new()),
        }
    }

    fn element_props(
        &self,
        obj: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Schema<IndexMap<String, PropValue>> {
        let props_path = join(path, "props");
        match optional_object(obj, "props", path)? {
            Some(props) => props
                .iter()
                .map(|(name, value)| {
                    let prop_path = join(&props_path, name);
                    let prop = if is_event_handler_shape(value) {
                        PropValue::Handler(self.event_handler(value, &prop_path, depth)?)
                    } else {
                        PropValue::Expr(self.expression(value, &prop_path, depth)?)
                    };
                    Ok((name.clone(), prop))
                })
                .collect(),
            None => Ok(IndexMap::new()),
        }
    }

    fn event_handler(&self, value: &Value, path: &str, depth: usize) -> Schema<EventHandler> {
        let obj = object(value, path, "Event handler")?;
        Ok(EventHandler {
            event: string(obj, "event", path)?,
            action: string(obj, "action", path)?,
            payload: self.optional_expression(obj, "payload", path, depth)?,
            debounce: optional_duration(obj, "debounce", path)?,
            throttle: optional_duration(obj, "throttle", path)?,
            options: optional_object(obj, "options", path)?.map(|o| Value::Object(o.clone())),
        })
    }

    fn transition(&self, obj: &Map<String, Value>, path: &str) -> Schema<Option<TransitionConfig>> {
        let transition_path = join(path, "transition");
        match optional_object(obj, "transition", path)? {
            Some(t) => Ok(Some(TransitionConfig {
                enter: string(t, "enter", &transition_path)?,
                enter_active: string(t, "enterActive", &transition_path)?,
                exit: string(t, "exit", &transition_path)?,
                exit_active: string(t, "exitActive", &transition_path)?,
                duration: optional_duration(t, "duration", &transition_path)?,
            })),
            None => Ok(None),
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Optional program sections
    // ───────────────────────────────────────────────────────────────────────────

    fn route(&self, value: &Value, path: &str) -> Schema<RouteDef> {
        let obj = object(value, path, "Route")?;
        Ok(RouteDef {
            path: string(obj, "path", path)?,
            title: self.optional_expression(obj, "title", path, 0)?,
            layout: optional_string(obj, "layout", path)?,
            layout_params: self.expression_map(obj, "layoutParams", path, 0)?,
            meta: self.expression_map(obj, "meta", path, 0)?,
        })
    }

    fn imports(&self, obj: &Map<String, Value>) -> Schema<IndexMap<String, String>> {
        match optional_field(obj, "imports") {
            Some(value) => string_map(value, "/imports", "Imports"),
            None => Ok(IndexMap::new()),
        }
    }

    fn data(&self, obj: &Map<String, Value>) -> Schema<IndexMap<String, DataSource>> {
        let Some(entries) = optional_object(obj, "data", "")? else {
            return Ok(IndexMap::new());
        };
        entries
            .iter()
            .map(|(name, value)| {
                let path = join("/data", name);
                let source = object(value, &path, "Data source")?;
                let kind = parse_tag(source, "type", &path, "data source type", DATA_SOURCE_KINDS, from_keyword)?;
                let options = source
                    .iter()
                    .filter(|(k, _)| k.as_str() != "type")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Ok((name.clone(), DataSource { kind, options }))
            })
            .collect()
    }

    fn lifecycle(&self, obj: &Map<String, Value>) -> Schema<Option<LifecycleHooks>> {
        let path = "/lifecycle";
        match optional_object(obj, "lifecycle", "")? {
            Some(hooks) => Ok(Some(LifecycleHooks {
                on_mount: optional_string(hooks, "onMount", path)?,
                on_unmount: optional_string(hooks, "onUnmount", path)?,
                on_route_enter: optional_string(hooks, "onRouteEnter", path)?,
                on_route_leave: optional_string(hooks, "onRouteLeave", path)?,
            })),
            None => Ok(None),
        }
    }

    fn styles(&self, obj: &Map<String, Value>) -> Schema<IndexMap<String, StylePreset>> {
        let Some(presets) = optional_object(obj, "styles", "")? else {
            return Ok(IndexMap::new());
        };
        presets
            .iter()
            .map(|(name, value)| {
                let path = join("/styles", name);
                let preset = object(value, &path, "Style preset")?;
                let variants_path = join(&path, "variants");
                let variants = match optional_object(preset, "variants", &path)? {
                    Some(groups) => groups
                        .iter()
                        .map(|(group, options)| {
                            Ok((
                                group.clone(),
                                string_map(options, &join(&variants_path, group), "Variant group")?,
                            ))
                        })
                        .collect::<Schema<IndexMap<_, _>>>()?,
                    None => IndexMap::new(),
                };
                let default_variants = match optional_field(preset, "defaultVariants") {
                    Some(value) => string_map(value, &join(&path, "defaultVariants"), "defaultVariants")?,
                    None => IndexMap::new(),
                };
                let compound_variants = match optional_field(preset, "compoundVariants") {
                    Some(value) => {
                        let compound_path = join(&path, "compoundVariants");
                        array(value, &compound_path, "compoundVariants")?
                            .iter()
                            .enumerate()
                            .map(|(i, entry)| {
                                string_map(entry, &join_index(&compound_path, i), "Compound variant")
                            })
                            .collect::<Schema<Vec<_>>>()?
                    }
                    None => Vec::new(),
                };
                Ok((
                    name.clone(),
                    StylePreset {
                        base: string(preset, "base", &path)?,
                        variants,
                        default_variants,
                        compound_variants,
                    },
                ))
            })
            .collect()
    }

    fn components(&self, obj: &Map<String, Value>) -> Schema<IndexMap<String, ComponentDef>> {
        let Some(defs) = optional_object(obj, "components", "")? else {
            return Ok(IndexMap::new());
        };
        defs.iter()
            .map(|(name, value)| {
                let path = join("/components", name);
                Ok((name.clone(), self.component_def(value, &path)?))
            })
            .collect()
    }

    fn component_def(&self, value: &Value, path: &str) -> Schema<ComponentDef> {
        let obj = object(value, path, "Component")?;
        let params_path = join(path, "params");
        let params = match optional_object(obj, "params", path)? {
            Some(params) => params
                .iter()
                .map(|(name, value)| {
                    let param_path = join(&params_path, name);
                    let param = object(value, &param_path, "Param definition")?;
                    Ok((
                        name.clone(),
                        ParamDef {
                            kind: parse_tag(param, "type", &param_path, "param type", PARAM_TYPES, ParamType::parse)?,
                            required: optional_bool(param, "required", &param_path)?.unwrap_or(true),
                        },
                    ))
                })
                .collect::<Schema<IndexMap<_, _>>>()?,
            None => IndexMap::new(),
        };
        let local_state = match optional_field(obj, "localState") {
            Some(value) => self.state_map(value, &join(path, "localState"))?,
            None => IndexMap::new(),
        };
        let local_actions = match optional_field(obj, "localActions") {
            Some(value) => self.action_defs(value, &join(path, "localActions"), 0)?,
            None => Vec::new(),
        };
        let view = self.view_node(field(obj, "view", path)?, &join(path, "view"), 0)?;

        Ok(ComponentDef {
            params,
            local_state,
            local_actions,
            view,
        })
    }

    fn widgets(&self, obj: &Map<String, Value>) -> Schema<Vec<WidgetRef>> {
        match optional_field(obj, "widgets") {
            Some(value) => array(value, "/widgets", "widgets")?
                .iter()
                .enumerate()
                .map(|(i, widget)| {
                    let path = join_index("/widgets", i);
                    let w = object(widget, &path, "Widget")?;
                    Ok(WidgetRef {
                        id: string(w, "id", &path)?,
                        src: string(w, "src", &path)?,
                    })
                })
                .collect(),
            None => Ok(Vec::new()),
        }
    }
}
