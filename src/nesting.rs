//! Nesting extents after component inlining.
//!
//! An [`Extent`] describes how deep a tree becomes once its holes are filled:
//! `fixed` is the depth reached without passing through a hole, `via_hole` is
//! the depth at which a hole's replacement is rooted. For view trees the hole
//! is a `slot`, for expressions it is a `param`. Composition is max-plus, so a
//! component's extent is computed once and reused for every instance.
//!
//! A [`Size`] does the same for node counts. Props are copied into every
//! `param` that reads them and slot content into every `slot`, so size is
//! linear in what fills the holes rather than max-plus.

use indexmap::IndexMap;
use serde::Serialize;

use crate::ast::{ActionStep, ComponentDef, EventHandler, Expression, ViewNode};
use crate::visitor::{walk_actions, walk_expression, walk_step, walk_steps, walk_view, Visitor};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extent {
    pub fixed: usize,
    pub via_hole: Option<usize>,
}

impl Extent {
    pub const EMPTY: Extent = Extent {
        fixed: 0,
        via_hole: None,
    };

    pub fn leaf() -> Self {
        Extent {
            fixed: 1,
            via_hole: None,
        }
    }

    pub fn hole() -> Self {
        Extent {
            fixed: 0,
            via_hole: Some(0),
        }
    }

    /// One more level above `self`.
    pub fn nest(self) -> Self {
        Extent {
            fixed: self.fixed.saturating_add(1),
            via_hole: self.via_hole.map(|h| h.saturating_add(1)),
        }
    }

    pub fn max(self, other: Extent) -> Self {
        Extent {
            fixed: self.fixed.max(other.fixed),
            via_hole: match (self.via_hole, other.via_hole) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            },
        }
    }

    /// Substitute `arg` into every hole. The result keeps `arg`'s own holes.
    pub fn fill(self, arg: Extent) -> Self {
        match self.via_hole {
            Some(h) => Extent {
                fixed: self.fixed.max(h.saturating_add(arg.fixed)),
                via_hole: arg.via_hole.map(|a| h.saturating_add(a)),
            },
            None => self,
        }
    }
}

/// Nodes produced by inlining: `fixed + per_param * P + per_slot * C`, where
/// `P` bounds the size of every bound prop and `C` is the size of the slot
/// content. Arithmetic saturates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    pub fixed: usize,
    pub per_param: usize,
    pub per_slot: usize,
}

impl Size {
    pub const ZERO: Size = Size {
        fixed: 0,
        per_param: 0,
        per_slot: 0,
    };

    pub fn nodes(count: usize) -> Self {
        Size {
            fixed: count,
            ..Size::ZERO
        }
    }

    pub fn add(self, other: Size) -> Self {
        Size {
            fixed: self.fixed.saturating_add(other.fixed),
            per_param: self.per_param.saturating_add(other.per_param),
            per_slot: self.per_slot.saturating_add(other.per_slot),
        }
    }

    pub fn max(self, other: Size) -> Self {
        Size {
            fixed: self.fixed.max(other.fixed),
            per_param: self.per_param.max(other.per_param),
            per_slot: self.per_slot.max(other.per_slot),
        }
    }

    fn scale(self, factor: usize) -> Self {
        Size {
            fixed: self.fixed.saturating_mul(factor),
            per_param: self.per_param.saturating_mul(factor),
            per_slot: self.per_slot.saturating_mul(factor),
        }
    }

    /// Size of one instance whose props are each at most `prop` and whose
    /// slot content is `slot`, in the caller's terms.
    pub fn apply(self, prop: Size, slot: Size) -> Self {
        Size::nodes(self.fixed)
            .add(prop.scale(self.per_param))
            .add(slot.scale(self.per_slot))
    }
}

/// Extents of one component body: `view` has the slot as hole, `expr` has
/// params as holes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComponentExtent {
    pub view: Extent,
    pub expr: Extent,
    pub size: Size,
}

pub type ExtentTable = IndexMap<String, ComponentExtent>;

fn deepest<'a>(exprs: impl IntoIterator<Item = &'a Expression>) -> Extent {
    exprs
        .into_iter()
        .fold(Extent::EMPTY, |acc, e| acc.max(expression_extent(e)))
}

pub fn expression_extent(expr: &Expression) -> Extent {
    match expr {
        Expression::Param { path: None, .. } => Extent::hole(),
        Expression::Param { path: Some(_), .. } => Extent::hole().nest(),
        Expression::Lit { .. }
        | Expression::State { .. }
        | Expression::Var { .. }
        | Expression::Route { .. }
        | Expression::Import { .. }
        | Expression::Data { .. }
        | Expression::Ref { .. }
        | Expression::Validity { .. } => Extent::leaf(),
        Expression::Bin { left, right, .. } => deepest([left.as_ref(), right.as_ref()]).nest(),
        Expression::Not { operand } => expression_extent(operand).nest(),
        Expression::Cond {
            condition,
            then,
            otherwise,
        } => deepest([condition.as_ref(), then.as_ref(), otherwise.as_ref()]).nest(),
        Expression::Get { base, .. } => expression_extent(base).nest(),
        Expression::Index { base, key } => deepest([base.as_ref(), key.as_ref()]).nest(),
        Expression::Concat { items } => deepest(items).nest(),
        Expression::Array { elements } => deepest(elements).nest(),
        Expression::Obj { props } => deepest(props.values()).nest(),
        Expression::Style { variants, .. } => deepest(variants.values()).nest(),
        Expression::Call { target, args, .. } => {
            deepest(target.iter().map(|t| t.as_ref()).chain(args)).nest()
        }
        Expression::Lambda { body, .. } => expression_extent(body).nest(),
    }
}

/// View nesting of `node` with slots as holes. Components missing from
/// `table` (unknown, or part of a cycle) count as a single node.
pub fn view_extent(node: &ViewNode, table: &ExtentTable) -> Extent {
    let list = |nodes: &[ViewNode]| {
        nodes
            .iter()
            .fold(Extent::EMPTY, |acc, n| acc.max(view_extent(n, table)))
    };

    match node {
        ViewNode::Slot(_) => Extent::hole().nest(),
        ViewNode::Component(component) => match table.get(&component.name) {
            Some(callee) => callee.view.fill(list(&component.children)),
            None => Extent::leaf(),
        },
        ViewNode::Element(element) => list(&element.children).nest(),
        ViewNode::Portal(portal) => list(&portal.children).nest(),
        ViewNode::Text(_) | ViewNode::Markdown(_) | ViewNode::Code(_) => Extent::leaf(),
        ViewNode::If(node) => {
            let mut inner = view_extent(&node.then, table);
            if let Some(otherwise) = &node.otherwise {
                inner = inner.max(view_extent(otherwise, table));
            }
            inner.nest()
        }
        ViewNode::Each(node) => view_extent(&node.body, table).nest(),
        ViewNode::Island(node) => view_extent(&node.content, table).nest(),
        ViewNode::Suspense(node) => view_extent(&node.fallback, table)
            .max(view_extent(&node.content, table))
            .nest(),
        ViewNode::ErrorBoundary(node) => view_extent(&node.fallback, table)
            .max(view_extent(&node.content, table))
            .nest(),
    }
}

/// Deepest expression reachable from a view subtree or step list, with
/// params as holes and nested component instances expanded.
struct Measure<'a> {
    table: &'a ExtentTable,
    extent: Extent,
}

impl Visitor for Measure<'_> {
    fn visit_expression(&mut self, expr: &Expression, _path: &str) {
        self.extent = self.extent.max(expression_extent(expr));
    }

    fn visit_event_handler(&mut self, handler: &EventHandler, _path: &str) {
        if let Some(payload) = &handler.payload {
            self.extent = self.extent.max(expression_extent(payload));
        }
    }

    fn visit_view(&mut self, node: &ViewNode, path: &str) {
        if let ViewNode::Component(component) = node {
            if let Some(callee) = self.table.get(&component.name) {
                let arg = component
                    .props
                    .values()
                    .fold(Extent::leaf(), |acc, e| acc.max(expression_extent(e)));
                self.extent = self.extent.max(callee.expr.fill(arg));
            }
        }
        walk_view(self, node, path);
    }
}

pub fn view_expression_extent(node: &ViewNode, table: &ExtentTable) -> Extent {
    let mut measure = Measure {
        table,
        extent: Extent::EMPTY,
    };
    measure.visit_view(node, "");
    measure.extent
}

pub fn steps_expression_extent(steps: &[ActionStep]) -> Extent {
    let table = ExtentTable::new();
    let mut measure = Measure {
        table: &table,
        extent: Extent::EMPTY,
    };
    walk_steps(&mut measure, steps, "");
    measure.extent
}

/// Node count of everything an inlined subtree emits: view nodes,
/// expressions, and the steps of island and local actions.
struct Count<'a> {
    table: &'a ExtentTable,
    size: Size,
}

impl Count<'_> {
    fn bump(&mut self, size: Size) {
        self.size = self.size.add(size);
    }
}

impl Visitor for Count<'_> {
    fn visit_expression(&mut self, expr: &Expression, path: &str) {
        if let Expression::Param { path: read, .. } = expr {
            self.bump(Size {
                fixed: usize::from(read.is_some()),
                per_param: 1,
                per_slot: 0,
            });
            return;
        }
        self.bump(Size::nodes(1));
        walk_expression(self, expr, path);
    }

    fn visit_step(&mut self, step: &ActionStep, path: &str) {
        self.bump(Size::nodes(1));
        walk_step(self, step, path);
    }

    fn visit_view(&mut self, node: &ViewNode, path: &str) {
        match node {
            ViewNode::Slot(_) => self.bump(Size {
                per_slot: 1,
                ..Size::ZERO
            }),
            ViewNode::Component(component) => {
                let prop = component
                    .props
                    .values()
                    .fold(Size::ZERO, |acc, e| acc.max(expression_size(e)));
                let mut slot = Count {
                    table: self.table,
                    size: Size::ZERO,
                };
                for child in &component.children {
                    slot.visit_view(child, path);
                }
                let inlined = match self.table.get(&component.name) {
                    Some(callee) => callee.size.apply(prop, slot.size),
                    None => Size::nodes(1).add(prop).add(slot.size),
                };
                self.bump(inlined);
            }
            _ => {
                self.bump(Size::nodes(1));
                walk_view(self, node, path);
            }
        }
    }
}

pub fn expression_size(expr: &Expression) -> Size {
    let table = ExtentTable::new();
    let mut count = Count {
        table: &table,
        size: Size::ZERO,
    };
    count.visit_expression(expr, "");
    count.size
}

/// Size of `node` once every component instance in it is inlined.
/// Components missing from `table` count as a single node.
pub fn view_size(node: &ViewNode, table: &ExtentTable) -> Size {
    let mut count = Count {
        table,
        size: Size::ZERO,
    };
    count.visit_view(node, "");
    count.size
}

/// Extent of a component body, given the extents of everything it calls.
pub fn component_extent(def: &ComponentDef, table: &ExtentTable) -> ComponentExtent {
    let mut view = view_extent(&def.view, table);
    let mut expr = view_expression_extent(&def.view, table);
    for action in &def.local_actions {
        expr = expr.max(steps_expression_extent(&action.steps));
    }
    let mut count = Count {
        table,
        size: Size::ZERO,
    };
    count.visit_view(&def.view, "");
    walk_actions(&mut count, &def.local_actions, "");
    if def.is_stateful() {
        view = view.nest();
        count.bump(Size::nodes(1));
    }
    ComponentExtent {
        view,
        expr,
        size: count.size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;
    use serde_json::json;

    fn expr(value: serde_json::Value) -> Expression {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_fill_is_max_plus() {
        let body = Extent {
            fixed: 3,
            via_hole: Some(2),
        };
        let arg = Extent {
            fixed: 4,
            via_hole: Some(1),
        };
        assert_eq!(
            body.fill(arg),
            Extent {
                fixed: 6,
                via_hole: Some(3)
            }
        );
        assert_eq!(Extent::leaf().fill(arg), Extent::leaf());
    }

    #[test]
    fn test_expression_extent_counts_params_as_holes() {
        let e = expr(json!({
            "expr": "bin", "op": "+",
            "left": { "expr": "param", "name": "a" },
            "right": { "expr": "lit", "value": 1 }
        }));
        assert_eq!(
            expression_extent(&e),
            Extent {
                fixed: 2,
                via_hole: Some(1)
            }
        );
    }

    #[test]
    fn test_nested_instances_compose() {
        let program = validate(&json!({
            "version": "1.0",
            "state": {},
            "actions": [],
            "view": { "kind": "component", "name": "Outer", "children": [
                { "kind": "element", "tag": "p" }
            ]},
            "components": {
                "Inner": { "view": { "kind": "element", "tag": "div", "children": [
                    { "kind": "slot" }
                ]}},
                "Outer": { "view": { "kind": "element", "tag": "section", "children": [
                    { "kind": "component", "name": "Inner", "children": [{ "kind": "slot" }] }
                ]}}
            }
        }))
        .unwrap();

        let mut table = ExtentTable::new();
        let inner = component_extent(&program.components["Inner"], &table);
        table.insert("Inner".to_string(), inner);
        let outer = component_extent(&program.components["Outer"], &table);
        table.insert("Outer".to_string(), outer);

        // Lowers to section > div > p; each slot is charged a wrapper level.
        let page = view_extent(&program.view, &table);
        assert_eq!(
            page,
            Extent {
                fixed: 5,
                via_hole: None
            }
        );
    }

    #[test]
    fn test_stateful_component_adds_wrapper_level() {
        let program = validate(&json!({
            "version": "1.0",
            "state": {},
            "actions": [],
            "view": { "kind": "text", "value": { "expr": "lit", "value": "x" } },
            "components": {
                "Counter": {
                    "localState": { "n": { "type": "number", "initial": 0 } },
                    "view": { "kind": "text", "value": { "expr": "lit", "value": 1 } }
                }
            }
        }))
        .unwrap();

        let extent = component_extent(&program.components["Counter"], &ExtentTable::new());
        assert_eq!(extent.view.fixed, 2);
    }
}
