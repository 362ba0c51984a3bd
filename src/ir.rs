//! CompiledProgram: the renderer-facing IR.
//!
//! Shares expression, handler and action-step types with the AST. The view
//! type is separate so that `component` and `slot` nodes cannot survive
//! lowering, and the synthetic `localState` / `fragment` nodes cannot appear
//! in source programs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ast::{
    ActionStep, CodeNode, DataSource, Expression, IslandStrategy, LifecycleHooks, MarkdownNode,
    PropValue, StateField, StylePreset, TextNode, TransitionConfig, WidgetRef,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledProgram {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<CompiledRoute>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub imports: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub data: IndexMap<String, DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<LifecycleHooks>,
    pub state: IndexMap<String, StateField>,
    pub actions: IndexMap<String, CompiledAction>,
    pub view: CompiledNode,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub styles: IndexMap<String, StylePreset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub widgets: Vec<WidgetRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRoute {
    pub path: String,
    /// Path parameter names, in declaration order.
    #[serde(default)]
    pub params: Vec<String>,
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
pub struct CompiledAction {
    pub name: String,
    pub steps: Vec<ActionStep>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOWERED VIEW TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CompiledNode {
    Element(CompiledElement),
    Text(TextNode),
    If(CompiledIf),
    Each(CompiledEach),
    Markdown(MarkdownNode),
    Code(CodeNode),
    Portal(CompiledPortal),
    Island(CompiledIsland),
    Suspense(CompiledSuspense),
    ErrorBoundary(CompiledErrorBoundary),
    Fragment(CompiledFragment),
    LocalState(LocalStateNode),
}

impl CompiledNode {
    pub fn fragment(children: Vec<CompiledNode>) -> Self {
        CompiledNode::Fragment(CompiledFragment { children })
    }

    /// Child nodes in document order.
    pub fn children(&self) -> Vec<&CompiledNode> {
        match self {
            CompiledNode::Element(e) => e.children.iter().collect(),
            CompiledNode::Portal(p) => p.children.iter().collect(),
            CompiledNode::Fragment(f) => f.children.iter().collect(),
            CompiledNode::If(i) => {
                let mut out = vec![i.then.as_ref()];
                if let Some(otherwise) = &i.otherwise {
                    out.push(otherwise.as_ref());
                }
                out
            }
            CompiledNode::Each(e) => vec![e.body.as_ref()],
            CompiledNode::Island(i) => vec![i.content.as_ref()],
            CompiledNode::Suspense(s) => vec![s.fallback.as_ref(), s.content.as_ref()],
            CompiledNode::ErrorBoundary(b) => vec![b.fallback.as_ref(), b.content.as_ref()],
            CompiledNode::LocalState(l) => vec![l.child.as_ref()],
            CompiledNode::Text(_) | CompiledNode::Markdown(_) | CompiledNode::Code(_) => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledElement {
    pub tag: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub props: IndexMap<String, PropValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CompiledNode>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledIf {
    pub condition: Expression,
    pub then: Box<CompiledNode>,
    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<Box<CompiledNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledEach {
    pub items: Expression,
    #[serde(rename = "as")]
    pub binding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Expression>,
    pub body: Box<CompiledNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledPortal {
    pub target: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CompiledNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledIsland {
    pub id: String,
    pub strategy: IslandStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_options: Option<Value>,
    pub content: Box<CompiledNode>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub state: IndexMap<String, StateField>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub actions: IndexMap<String, CompiledAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledSuspense {
    pub id: String,
    pub fallback: Box<CompiledNode>,
    pub content: Box<CompiledNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledErrorBoundary {
    pub fallback: Box<CompiledNode>,
    pub content: Box<CompiledNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledFragment {
    #[serde(default)]
    pub children: Vec<CompiledNode>,
}

/// Scope boundary for one component instance's local state and actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalStateNode {
    pub state: IndexMap<String, StateField>,
    pub actions: IndexMap<String, CompiledAction>,
    pub child: Box<CompiledNode>,
}
