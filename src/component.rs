//! Prop substitution for component inlining.
//!
//! Props are bound by reference: a `param` expression is replaced by the
//! caller's (already substituted) prop expression, never evaluated. Body
//! binders that would capture a variable of the substituted props or slot
//! content are renamed first.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::analyze::ACTION_VARS;
use crate::ast::{
    ActionDef, ActionStep, ComponentDef, ComponentNode, EventHandler, Expression, PropValue,
    ViewNode,
};
use crate::visitor::{
    collect_result_names, for_each_child_expression_mut, for_each_step_expression_mut,
    walk_actions, walk_children, walk_expression, walk_view, Visitor,
};

/// Prop name to the expression bound to it for one component instance.
pub type PropEnv = IndexMap<String, Expression>;

/// What a `param` resolves to. An unsupplied optional param is `null`; a
/// dotted `path` reads into the bound expression.
pub fn resolve_param(name: &str, path: Option<&str>, env: &PropEnv) -> Expression {
    match (env.get(name), path) {
        (Some(bound), None) => bound.clone(),
        (Some(bound), Some(path)) => Expression::Get {
            base: Box::new(bound.clone()),
            path: path.to_string(),
        },
        (None, _) => Expression::lit(Value::Null),
    }
}

pub fn substitute_expression(expr: &mut Expression, env: &PropEnv) {
    if let Expression::Param { name, path } = expr {
        let replacement = resolve_param(name, path.as_deref(), env);
        *expr = replacement;
        return;
    }
    for_each_child_expression_mut(expr, &mut |child| substitute_expression(child, env));
}

pub fn substitute_handler(handler: &mut EventHandler, env: &PropEnv) {
    if let Some(payload) = &mut handler.payload {
        substitute_expression(payload, env);
    }
}

pub fn substitute_prop(prop: &mut PropValue, env: &PropEnv) {
    match prop {
        PropValue::Expr(expr) => substitute_expression(expr, env),
        PropValue::Handler(handler) => substitute_handler(handler, env),
    }
}

pub fn substitute_steps(steps: &mut [ActionStep], env: &PropEnv) {
    for step in steps {
        for_each_step_expression_mut(step, &mut |e| substitute_expression(e, env));
    }
}

/// Props of one instance, expressed in the caller's terms. When the caller
/// is itself a component body, its own params are resolved first.
pub fn bind_props(node: &ComponentNode, caller: Option<&PropEnv>) -> PropEnv {
    node.props
        .iter()
        .map(|(name, expr)| {
            let mut bound = expr.clone();
            if let Some(env) = caller {
                substitute_expression(&mut bound, env);
            }
            (name.clone(), bound)
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// CAPTURE AVOIDANCE
// ═══════════════════════════════════════════════════════════════════════════════

fn var_root(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Every variable name mentioned or bound in what it visits.
struct VarNames<'n>(&'n mut IndexSet<String>);

impl Visitor for VarNames<'_> {
    fn visit_view(&mut self, node: &ViewNode, path: &str) {
        if let ViewNode::Each(each) = node {
            self.0.insert(each.binding.clone());
            self.0.extend(each.index.iter().cloned());
        }
        walk_view(self, node, path);
    }

    fn visit_expression(&mut self, expr: &Expression, path: &str) {
        match expr {
            Expression::Var { name, .. } => {
                self.0.insert(var_root(name).to_string());
            }
            Expression::Lambda { param, index, .. } => {
                self.0.insert(param.clone());
                self.0.extend(index.iter().cloned());
            }
            _ => {}
        }
        walk_expression(self, expr, path);
    }
}

pub fn expression_var_names<'e>(
    exprs: impl IntoIterator<Item = &'e Expression>,
    out: &mut IndexSet<String>,
) {
    let mut names = VarNames(out);
    for expr in exprs {
        names.visit_expression(expr, "");
    }
}

pub fn view_var_names(nodes: &[ViewNode], out: &mut IndexSet<String>) {
    walk_children(&mut VarNames(out), nodes, "");
}

/// Binder renames in effect at one point of a body.
type Renames = IndexMap<String, String>;

struct Renamer<'r> {
    avoid: &'r IndexSet<String>,
    taken: IndexSet<String>,
    renamed: usize,
}

impl Renamer<'_> {
    fn fresh(&mut self, name: &str) -> String {
        let mut n = 1usize;
        loop {
            let candidate = format!("{}${}", name, n);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Name to bind in an inner scope, recording it in `scope`.
    fn bind(&mut self, name: &str, scope: &mut Renames) -> String {
        if self.avoid.contains(name) {
            let fresh = self.fresh(name);
            scope.insert(name.to_string(), fresh.clone());
            self.renamed += 1;
            fresh
        } else {
            scope.shift_remove(name);
            name.to_string()
        }
    }

    fn expression(&mut self, expr: &mut Expression, scope: &Renames) {
        match expr {
            Expression::Var { name, .. } => {
                let root_len = var_root(name).len();
                if let Some(new_root) = scope.get(&name[..root_len]) {
                    let renamed = format!("{}{}", new_root, &name[root_len..]);
                    *name = renamed;
                }
            }
            Expression::Lambda { param, index, body } => {
                let mut inner = scope.clone();
                let bound = self.bind(param, &mut inner);
                *param = bound;
                if let Some(index) = index {
                    let bound = self.bind(index, &mut inner);
                    *index = bound;
                }
                self.expression(body, &inner);
            }
            _ => for_each_child_expression_mut(expr, &mut |child| self.expression(child, scope)),
        }
    }

    fn prop(&mut self, prop: &mut PropValue, scope: &Renames) {
        match prop {
            PropValue::Expr(expr) => self.expression(expr, scope),
            PropValue::Handler(handler) => {
                if let Some(payload) = &mut handler.payload {
                    self.expression(payload, scope);
                }
            }
        }
    }

    /// Action bodies bind their implicit variables and step results over
    /// anything from the view.
    fn actions(&mut self, actions: &mut [ActionDef], scope: &Renames) {
        for action in actions {
            let mut shadowed: Vec<String> = ACTION_VARS.iter().map(|v| v.to_string()).collect();
            collect_result_names(&action.steps, &mut shadowed);
            let mut inner = scope.clone();
            for name in &shadowed {
                inner.shift_remove(name);
            }
            for step in action.steps.iter_mut() {
                for_each_step_expression_mut(step, &mut |e| self.expression(e, &inner));
            }
        }
    }

    fn children(&mut self, nodes: &mut [ViewNode], scope: &Renames) {
        for node in nodes {
            self.view(node, scope);
        }
    }

    fn view(&mut self, node: &mut ViewNode, scope: &Renames) {
        match node {
            ViewNode::Element(element) => {
                for prop in element.props.values_mut() {
                    self.prop(prop, scope);
                }
                self.children(&mut element.children, scope);
            }
            ViewNode::Text(text) => self.expression(&mut text.value, scope),
            ViewNode::If(node) => {
                self.expression(&mut node.condition, scope);
                self.view(&mut node.then, scope);
                if let Some(otherwise) = &mut node.otherwise {
                    self.view(otherwise, scope);
                }
            }
            ViewNode::Each(node) => {
                self.expression(&mut node.items, scope);
                let mut inner = scope.clone();
                let binding = self.bind(&node.binding, &mut inner);
                node.binding = binding;
                if let Some(index) = &mut node.index {
                    let bound = self.bind(index, &mut inner);
                    *index = bound;
                }
                if let Some(key) = &mut node.key {
                    self.expression(key, &inner);
                }
                self.view(&mut node.body, &inner);
            }
            ViewNode::Component(node) => {
                for expr in node.props.values_mut() {
                    self.expression(expr, scope);
                }
                self.children(&mut node.children, scope);
            }
            ViewNode::Slot(_) => {}
            ViewNode::Markdown(node) => self.expression(&mut node.content, scope),
            ViewNode::Code(node) => {
                self.expression(&mut node.language, scope);
                self.expression(&mut node.content, scope);
            }
            ViewNode::Portal(node) => self.children(&mut node.children, scope),
            ViewNode::Island(node) => {
                self.view(&mut node.content, scope);
                self.actions(&mut node.actions, scope);
            }
            ViewNode::Suspense(node) => {
                self.view(&mut node.fallback, scope);
                self.view(&mut node.content, scope);
            }
            ViewNode::ErrorBoundary(node) => {
                self.view(&mut node.fallback, scope);
                self.view(&mut node.content, scope);
            }
        }
    }
}

/// A copy of `def` whose `each` and `lambda` binders named in `outside` are
/// renamed, with their references rewritten. `None` when no binder collides.
pub fn avoid_capture(def: &ComponentDef, outside: &IndexSet<String>) -> Option<ComponentDef> {
    if outside.is_empty() {
        return None;
    }
    let mut taken = outside.clone();
    let mut names = VarNames(&mut taken);
    names.visit_view(&def.view, "");
    walk_actions(&mut names, &def.local_actions, "");

    let mut renamer = Renamer {
        avoid: outside,
        taken,
        renamed: 0,
    };
    let mut def = def.clone();
    let top = Renames::new();
    renamer.view(&mut def.view, &top);
    renamer.actions(&mut def.local_actions, &top);

    (renamer.renamed > 0).then_some(def)
}
