use crate::ast::{ActionDef, ActionStep, EventHandler, Expression, PropValue, ViewNode};
use crate::pointer::{join, join_index};

/// Single traversal mechanism for validated programs.
///
/// Rules:
/// 1. Traversal order is fixed and matches source order.
/// 2. Implementers override `visit_*` methods to add behavior.
/// 3. Implementers call the matching `walk_*` function to continue into
///    children unless pruning is intended.
/// 4. Every callback receives the JSON Pointer of the node it is given.
pub trait Visitor {
    fn visit_view(&mut self, node: &ViewNode, path: &str) {
        walk_view(self, node, path);
    }

    fn visit_expression(&mut self, expr: &Expression, path: &str) {
        walk_expression(self, expr, path);
    }

    fn visit_step(&mut self, step: &ActionStep, path: &str) {
        walk_step(self, step, path);
    }

    fn visit_event_handler(&mut self, handler: &EventHandler, path: &str) {
        walk_event_handler(self, handler, path);
    }

    fn visit_action(&mut self, action: &ActionDef, path: &str) {
        walk_steps(self, &action.steps, &join(path, "steps"));
    }
}

pub fn walk_children<V: Visitor + ?Sized>(visitor: &mut V, children: &[ViewNode], path: &str) {
    for (i, child) in children.iter().enumerate() {
        visitor.visit_view(child, &join_index(path, i));
    }
}

pub fn walk_actions<V: Visitor + ?Sized>(visitor: &mut V, actions: &[ActionDef], path: &str) {
    for (i, action) in actions.iter().enumerate() {
        visitor.visit_action(action, &join_index(path, i));
    }
}

pub fn walk_view<V: Visitor + ?Sized>(visitor: &mut V, node: &ViewNode, path: &str) {
    match node {
        ViewNode::Element(element) => {
            let props_path = join(path, "props");
            for (name, prop) in &element.props {
                let prop_path = join(&props_path, name);
                match prop {
                    PropValue::Handler(handler) => visitor.visit_event_handler(handler, &prop_path),
                    PropValue::Expr(expr) => visitor.visit_expression(expr, &prop_path),
                }
            }
            walk_children(visitor, &element.children, &join(path, "children"));
        }
        ViewNode::Text(text) => visitor.visit_expression(&text.value, &join(path, "value")),
        ViewNode::If(node) => {
            visitor.visit_expression(&node.condition, &join(path, "condition"));
            visitor.visit_view(&node.then, &join(path, "then"));
            if let Some(otherwise) = &node.otherwise {
                visitor.visit_view(otherwise, &join(path, "else"));
            }
        }
        ViewNode::Each(node) => {
            visitor.visit_expression(&node.items, &join(path, "items"));
            if let Some(key) = &node.key {
                visitor.visit_expression(key, &join(path, "key"));
            }
            visitor.visit_view(&node.body, &join(path, "body"));
        }
        ViewNode::Component(node) => {
            let props_path = join(path, "props");
            for (name, expr) in &node.props {
                visitor.visit_expression(expr, &join(&props_path, name));
            }
            walk_children(visitor, &node.children, &join(path, "children"));
        }
        ViewNode::Slot(_) => {}
        ViewNode::Markdown(node) => visitor.visit_expression(&node.content, &join(path, "content")),
        ViewNode::Code(node) => {
            visitor.visit_expression(&node.language, &join(path, "language"));
            visitor.visit_expression(&node.content, &join(path, "content"));
        }
        ViewNode::Portal(node) => walk_children(visitor, &node.children, &join(path, "children")),
        ViewNode::Island(node) => {
            visitor.visit_view(&node.content, &join(path, "content"));
            walk_actions(visitor, &node.actions, &join(path, "actions"));
        }
        ViewNode::Suspense(node) => {
            visitor.visit_view(&node.fallback, &join(path, "fallback"));
            visitor.visit_view(&node.content, &join(path, "content"));
        }
        ViewNode::ErrorBoundary(node) => {
            visitor.visit_view(&node.fallback, &join(path, "fallback"));
            visitor.visit_view(&node.content, &join(path, "content"));
        }
    }
}

pub fn walk_expression<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expression, path: &str) {
    match expr {
        Expression::Lit { .. }
        | Expression::State { .. }
        | Expression::Var { .. }
        | Expression::Param { .. }
        | Expression::Route { .. }
        | Expression::Import { .. }
        | Expression::Data { .. }
        | Expression::Ref { .. }
        | Expression::Validity { .. } => {}
        Expression::Bin { left, right, .. } => {
            visitor.visit_expression(left, &join(path, "left"));
            visitor.visit_expression(right, &join(path, "right"));
        }
        Expression::Not { operand } => visitor.visit_expression(operand, &join(path, "operand")),
        Expression::Cond {
            condition,
            then,
            otherwise,
        } => {
            visitor.visit_expression(condition, &join(path, "if"));
            visitor.visit_expression(then, &join(path, "then"));
            visitor.visit_expression(otherwise, &join(path, "else"));
        }
        Expression::Get { base, .. } => visitor.visit_expression(base, &join(path, "base")),
        Expression::Index { base, key } => {
            visitor.visit_expression(base, &join(path, "base"));
            visitor.visit_expression(key, &join(path, "key"));
        }
        Expression::Concat { items } => walk_expression_list(visitor, items, &join(path, "items")),
        Expression::Array { elements } => {
            walk_expression_list(visitor, elements, &join(path, "elements"))
        }
        Expression::Obj { props } => {
            let props_path = join(path, "props");
            for (key, value) in props {
                visitor.visit_expression(value, &join(&props_path, key));
            }
        }
        Expression::Style { variants, .. } => {
            let variants_path = join(path, "variants");
            for (key, value) in variants {
                visitor.visit_expression(value, &join(&variants_path, key));
            }
        }
        Expression::Call { target, args, .. } => {
            if let Some(target) = target {
                visitor.visit_expression(target, &join(path, "target"));
            }
            walk_expression_list(visitor, args, &join(path, "args"));
        }
        Expression::Lambda { body, .. } => visitor.visit_expression(body, &join(path, "body")),
    }
}

fn walk_expression_list<V: Visitor + ?Sized>(visitor: &mut V, exprs: &[Expression], path: &str) {
    for (i, expr) in exprs.iter().enumerate() {
        visitor.visit_expression(expr, &join_index(path, i));
    }
}

pub fn walk_event_handler<V: Visitor + ?Sized>(visitor: &mut V, handler: &EventHandler, path: &str) {
    if let Some(payload) = &handler.payload {
        visitor.visit_expression(payload, &join(path, "payload"));
    }
}

pub fn walk_steps<V: Visitor + ?Sized>(visitor: &mut V, steps: &[ActionStep], path: &str) {
    for (i, step) in steps.iter().enumerate() {
        visitor.visit_step(step, &join_index(path, i));
    }
}

pub fn walk_step<V: Visitor + ?Sized>(visitor: &mut V, step: &ActionStep, path: &str) {
    let expr = |visitor: &mut V, key: &str, e: &Expression| {
        visitor.visit_expression(e, &join(path, key));
    };

    match step {
        ActionStep::Set { value, .. } => expr(visitor, "value", value),
        ActionStep::Update {
            value,
            index,
            delete_count,
            ..
        } => {
            for (key, e) in [("value", value), ("index", index), ("deleteCount", delete_count)] {
                if let Some(e) = e {
                    expr(visitor, key, e);
                }
            }
        }
        ActionStep::SetPath { path: p, value, .. } => {
            expr(visitor, "path", p);
            expr(visitor, "value", value);
        }
        ActionStep::Fetch {
            url,
            body,
            headers,
            on_success,
            on_error,
            ..
        } => {
            expr(visitor, "url", url);
            if let Some(body) = body {
                expr(visitor, "body", body);
            }
            let headers_path = join(path, "headers");
            for (name, value) in headers {
                visitor.visit_expression(value, &join(&headers_path, name));
            }
            walk_steps(visitor, on_success, &join(path, "onSuccess"));
            walk_steps(visitor, on_error, &join(path, "onError"));
        }
        ActionStep::Storage {
            key,
            value,
            on_success,
            on_error,
            ..
        } => {
            expr(visitor, "key", key);
            if let Some(value) = value {
                expr(visitor, "value", value);
            }
            walk_steps(visitor, on_success, &join(path, "onSuccess"));
            walk_steps(visitor, on_error, &join(path, "onError"));
        }
        ActionStep::Clipboard {
            value,
            on_success,
            on_error,
            ..
        } => {
            if let Some(value) = value {
                expr(visitor, "value", value);
            }
            walk_steps(visitor, on_success, &join(path, "onSuccess"));
            walk_steps(visitor, on_error, &join(path, "onError"));
        }
        ActionStep::Navigate { url, .. } => expr(visitor, "url", url),
        ActionStep::Import {
            on_success,
            on_error,
            ..
        } => {
            walk_steps(visitor, on_success, &join(path, "onSuccess"));
            walk_steps(visitor, on_error, &join(path, "onError"));
        }
        ActionStep::Call {
            target,
            args,
            on_success,
            on_error,
            ..
        } => {
            expr(visitor, "target", target);
            walk_expression_list(visitor, args, &join(path, "args"));
            walk_steps(visitor, on_success, &join(path, "onSuccess"));
            walk_steps(visitor, on_error, &join(path, "onError"));
        }
        ActionStep::Subscribe { target, .. }
        | ActionStep::Dispose { target }
        | ActionStep::ClearTimer { target } => expr(visitor, "target", target),
        ActionStep::Dom {
            selector, value, ..
        } => {
            expr(visitor, "selector", selector);
            if let Some(value) = value {
                expr(visitor, "value", value);
            }
        }
        ActionStep::Send { data, .. } => expr(visitor, "data", data),
        ActionStep::Close { .. } | ActionStep::SseClose { .. } | ActionStep::Unbind { .. } => {}
        ActionStep::Delay { ms, then, .. } => {
            expr(visitor, "ms", ms);
            walk_steps(visitor, then, &join(path, "then"));
        }
        ActionStep::Interval { ms, .. } => expr(visitor, "ms", ms),
        ActionStep::Focus {
            target,
            on_success,
            on_error,
            ..
        } => {
            expr(visitor, "target", target);
            walk_steps(visitor, on_success, &join(path, "onSuccess"));
            walk_steps(visitor, on_error, &join(path, "onError"));
        }
        ActionStep::If {
            condition,
            then,
            otherwise,
        } => {
            expr(visitor, "condition", condition);
            walk_steps(visitor, then, &join(path, "then"));
            walk_steps(visitor, otherwise, &join(path, "else"));
        }
        ActionStep::SseConnect {
            url,
            on_open,
            on_message,
            on_error,
            ..
        } => {
            expr(visitor, "url", url);
            walk_steps(visitor, on_open, &join(path, "onOpen"));
            walk_steps(visitor, on_message, &join(path, "onMessage"));
            walk_steps(visitor, on_error, &join(path, "onError"));
        }
        ActionStep::Optimistic { path: p, value, .. } => {
            if let Some(p) = p {
                expr(visitor, "path", p);
            }
            expr(visitor, "value", value);
        }
        ActionStep::Confirm { id } | ActionStep::Reject { id } => expr(visitor, "id", id),
        ActionStep::Bind {
            path: p, transform, ..
        } => {
            if let Some(p) = p {
                expr(visitor, "path", p);
            }
            if let Some(transform) = transform {
                expr(visitor, "transform", transform);
            }
        }
    }
}

/// Every `result` name declared by a step list, including nested lists.
pub fn collect_result_names(steps: &[ActionStep], out: &mut Vec<String>) {
    struct Results<'a>(&'a mut Vec<String>);

    impl Visitor for Results<'_> {
        fn visit_step(&mut self, step: &ActionStep, path: &str) {
            let declared = match step {
                ActionStep::Fetch { result, .. }
                | ActionStep::Storage { result, .. }
                | ActionStep::Clipboard { result, .. }
                | ActionStep::Call { result, .. }
                | ActionStep::Delay { result, .. }
                | ActionStep::Interval { result, .. }
                | ActionStep::Optimistic { result, .. } => result.as_deref(),
                ActionStep::Import { result, .. } => Some(result.as_str()),
                _ => None,
            };
            if let Some(name) = declared {
                if !self.0.iter().any(|n| n == name) {
                    self.0.push(name.to_string());
                }
            }
            walk_step(self, step, path);
        }

        fn visit_expression(&mut self, _expr: &Expression, _path: &str) {}
    }

    walk_steps(&mut Results(out), steps, "");
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-PLACE REWRITING
// ═══════════════════════════════════════════════════════════════════════════════

/// Calls `f` on each direct child expression of `expr`.
pub fn for_each_child_expression_mut<F>(expr: &mut Expression, f: &mut F)
where
    F: FnMut(&mut Expression),
{
    match expr {
        Expression::Lit { .. }
        | Expression::State { .. }
        | Expression::Var { .. }
        | Expression::Param { .. }
        | Expression::Route { .. }
        | Expression::Import { .. }
        | Expression::Data { .. }
        | Expression::Ref { .. }
        | Expression::Validity { .. } => {}
        Expression::Bin { left, right, .. } => {
            f(left.as_mut());
            f(right.as_mut());
        }
        Expression::Not { operand } => f(operand.as_mut()),
        Expression::Cond {
            condition,
            then,
            otherwise,
        } => {
            f(condition.as_mut());
            f(then.as_mut());
            f(otherwise.as_mut());
        }
        Expression::Get { base, .. } => f(base.as_mut()),
        Expression::Index { base, key } => {
            f(base.as_mut());
            f(key.as_mut());
        }
        Expression::Concat { items: list } | Expression::Array { elements: list } => {
            list.iter_mut().for_each(|e| f(e))
        }
        Expression::Obj { props: map } | Expression::Style { variants: map, .. } => {
            map.values_mut().for_each(|e| f(e))
        }
        Expression::Call { target, args, .. } => {
            if let Some(target) = target {
                f(target.as_mut());
            }
            args.iter_mut().for_each(|e| f(e));
        }
        Expression::Lambda { body, .. } => f(body.as_mut()),
    }
}

/// Calls `f` on every expression held by `step`, descending into nested
/// step lists.
pub fn for_each_step_expression_mut<F>(step: &mut ActionStep, f: &mut F)
where
    F: FnMut(&mut Expression),
{
    let mut nested: Vec<&mut Vec<ActionStep>> = Vec::new();

    match step {
        ActionStep::Set { value, .. } => f(value),
        ActionStep::Update {
            value,
            index,
            delete_count,
            ..
        } => {
            for e in [value, index, delete_count].into_iter().flatten() {
                f(e);
            }
        }
        ActionStep::SetPath { path, value, .. } => {
            f(path);
            f(value);
        }
        ActionStep::Fetch {
            url,
            body,
            headers,
            on_success,
            on_error,
            ..
        } => {
            f(url);
            if let Some(body) = body {
                f(body);
            }
            headers.values_mut().for_each(|e| f(e));
            nested.push(on_success);
            nested.push(on_error);
        }
        ActionStep::Storage {
            key,
            value,
            on_success,
            on_error,
            ..
        } => {
            f(key);
            if let Some(value) = value {
                f(value);
            }
            nested.push(on_success);
            nested.push(on_error);
        }
        ActionStep::Clipboard {
            value,
            on_success,
            on_error,
            ..
        } => {
            if let Some(value) = value {
                f(value);
            }
            nested.push(on_success);
            nested.push(on_error);
        }
        ActionStep::Navigate { url, .. } => f(url),
        ActionStep::Import {
            on_success,
            on_error,
            ..
        } => {
            nested.push(on_success);
            nested.push(on_error);
        }
        ActionStep::Call {
            target,
            args,
            on_success,
            on_error,
            ..
        } => {
            f(target);
            args.iter_mut().for_each(|e| f(e));
            nested.push(on_success);
            nested.push(on_error);
        }
        ActionStep::Subscribe { target, .. }
        | ActionStep::Dispose { target }
        | ActionStep::ClearTimer { target } => f(target),
        ActionStep::Dom {
            selector, value, ..
        } => {
            f(selector);
            if let Some(value) = value {
                f(value);
            }
        }
        ActionStep::Send { data, .. } => f(data),
        ActionStep::Close { .. } | ActionStep::SseClose { .. } | ActionStep::Unbind { .. } => {}
        ActionStep::Delay { ms, then, .. } => {
            f(ms);
            nested.push(then);
        }
        ActionStep::Interval { ms, .. } => f(ms),
        ActionStep::Focus {
            target,
            on_success,
            on_error,
            ..
        } => {
            f(target);
            nested.push(on_success);
            nested.push(on_error);
        }
        ActionStep::If {
            condition,
            then,
            otherwise,
        } => {
            f(condition);
            nested.push(then);
            nested.push(otherwise);
        }
        ActionStep::SseConnect {
            url,
            on_open,
            on_message,
            on_error,
            ..
        } => {
            f(url);
            nested.push(on_open);
            nested.push(on_message);
            nested.push(on_error);
        }
        ActionStep::Optimistic { path, value, .. } => {
            if let Some(path) = path {
                f(path);
            }
            f(value);
        }
        ActionStep::Confirm { id } | ActionStep::Reject { id } => f(id),
        ActionStep::Bind {
            path, transform, ..
        } => {
            for e in [path, transform].into_iter().flatten() {
                f(e);
            }
        }
    }

    for steps in nested {
        for step in steps.iter_mut() {
            for_each_step_expression_mut(step, f);
        }
    }
}
