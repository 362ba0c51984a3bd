//! Semantic Analyzer
//!
//! Resolves every name in a validated [`Program`] against lexical scope and
//! collects all problems in one traversal. Component bodies are analyzed once
//! each and never from inside a caller's walk: instances only record calls,
//! and the call graph is explored depth-first on an explicit stack, which
//! also detects cycles and computes each component's extent in post-order.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::ast::{
    ActionDef, ActionStep, ComponentNode, EventHandler, Expression, ParamDef, Program,
    RouteSource, StateField, StateType, ViewNode,
};
use crate::error::{ConstelaError, ErrorCode};
use crate::nesting::{
    component_extent, view_expression_extent, view_extent, view_size, ComponentExtent,
    ExtentTable,
};
use crate::options::CompileOptions;
use crate::pointer::{join, join_index};
use crate::route::extract_route_params;
use crate::scope::{Params, ScopeStack};
use crate::suggest::did_you_mean;
use crate::visitor::{
    collect_result_names, walk_actions, walk_children, walk_expression, walk_step, walk_steps,
    walk_view, Visitor,
};

/// Names available inside every action body besides declared `result`s.
pub const ACTION_VARS: &[&str] = &["payload", "event", "error", "result"];

// ═══════════════════════════════════════════════════════════════════════════════
// ANALYSIS CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSignature {
    pub params: IndexMap<String, ParamDef>,
    pub local_state: IndexSet<String>,
    pub local_actions: IndexSet<String>,
    pub extent: ComponentExtent,
}

impl ComponentSignature {
    pub fn is_stateful(&self) -> bool {
        !self.local_state.is_empty() || !self.local_actions.is_empty()
    }
}

/// Resolved names of one program, handed to the transformer and to editor
/// tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisContext {
    pub state_names: IndexSet<String>,
    pub action_names: IndexSet<String>,
    pub route_params: IndexSet<String>,
    pub component_registry: IndexMap<String, ComponentSignature>,
    /// Preset name to its variant group names.
    pub style_variants: IndexMap<String, IndexSet<String>>,
    pub import_names: IndexSet<String>,
    pub data_names: IndexSet<String>,
    pub ref_names: IndexSet<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn analyze(program: &Program) -> Result<AnalysisContext, Vec<ConstelaError>> {
    analyze_with_options(program, &CompileOptions::default())
}

pub fn analyze_with_options(
    program: &Program,
    options: &CompileOptions,
) -> Result<AnalysisContext, Vec<ConstelaError>> {
    Analyzer::new(program, options, Mode::Page).run()
}

/// Layout bodies may use `slot` and `param` at top level and must contain at
/// least one slot.
pub fn analyze_layout_with_options(
    program: &Program,
    options: &CompileOptions,
) -> Result<AnalysisContext, Vec<ConstelaError>> {
    Analyzer::new(program, options, Mode::Layout).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Page,
    Layout,
}

/// One component instance: who is called and where.
#[derive(Debug, Clone)]
struct Call {
    name: String,
    site: String,
}

/// A component on the exploration stack with the calls its body makes that
/// have not been followed yet.
type Pending = (String, std::vec::IntoIter<Call>);

// ═══════════════════════════════════════════════════════════════════════════════
// ANALYZER
// ═══════════════════════════════════════════════════════════════════════════════

struct Analyzer<'a> {
    program: &'a Program,
    options: &'a CompileOptions,
    mode: Mode,
    scopes: ScopeStack,
    errors: Vec<ConstelaError>,
    action_names: IndexSet<String>,
    route_params: Option<IndexSet<String>>,
    refs: IndexSet<String>,
    calls: Vec<Call>,
    analyzed: IndexSet<String>,
    extents: ExtentTable,
    saw_root_slot: bool,
    depth_reported: bool,
}

fn state_types(state: &IndexMap<String, StateField>) -> IndexMap<String, StateType> {
    state.iter().map(|(k, f)| (k.clone(), f.kind)).collect()
}

struct RefCollector<'r>(&'r mut IndexSet<String>);

impl Visitor for RefCollector<'_> {
    fn visit_view(&mut self, node: &ViewNode, path: &str) {
        if let ViewNode::Element(element) = node {
            if let Some(name) = &element.ref_name {
                self.0.insert(name.clone());
            }
        }
        walk_view(self, node, path);
    }

    fn visit_expression(&mut self, _expr: &Expression, _path: &str) {}
}

impl<'a> Analyzer<'a> {
    fn new(program: &'a Program, options: &'a CompileOptions, mode: Mode) -> Self {
        Analyzer {
            program,
            options,
            mode,
            scopes: ScopeStack::new(IndexMap::new(), IndexSet::new()),
            errors: Vec::new(),
            action_names: IndexSet::new(),
            route_params: program.route.as_ref().map(|r| extract_route_params(&r.path)),
            refs: IndexSet::new(),
            calls: Vec::new(),
            analyzed: IndexSet::new(),
            extents: ExtentTable::new(),
            saw_root_slot: false,
            depth_reported: false,
        }
    }

    fn run(mut self) -> Result<AnalysisContext, Vec<ConstelaError>> {
        let program = self.program;

        self.action_names = self.declare_actions(&program.actions, "/actions");
        let root_params = match self.mode {
            Mode::Page => Params::Forbidden,
            Mode::Layout => Params::Open,
        };
        self.scopes = ScopeStack::new(state_types(&program.state), self.action_names.clone())
            .with_root_params(root_params);

        let mut collector = RefCollector(&mut self.refs);
        collector.visit_view(&program.view, "/view");
        for (name, def) in &program.components {
            collector.visit_view(&def.view, &join(&join("/components", name), "view"));
        }

        self.check_lifecycle();
        self.check_route();
        walk_actions(&mut self, &program.actions, "/actions");
        self.visit_view(&program.view, "/view");

        let mut roots = std::mem::take(&mut self.calls);
        roots.extend(program.components.keys().map(|name| Call {
            name: name.clone(),
            site: join(&join("/components", name), "view"),
        }));
        for root in roots {
            self.explore(root);
        }

        if self.mode == Mode::Layout && !self.saw_root_slot {
            self.errors.push(
                ConstelaError::new(
                    ErrorCode::LayoutMissingSlot,
                    "Layout view must contain at least one slot",
                )
                .at("/view"),
            );
        }

        self.check_expanded_depth();

        if !self.errors.is_empty() {
            log::debug!("[constela] analyze failed with {} errors", self.errors.len());
            return Err(self.errors);
        }

        let context = self.into_context();
        log::debug!(
            "[constela] analyze ok: {} state, {} actions, {} components",
            context.state_names.len(),
            context.action_names.len(),
            context.component_registry.len()
        );
        Ok(context)
    }

    fn into_context(self) -> AnalysisContext {
        let program = self.program;
        let component_registry = program
            .components
            .iter()
            .map(|(name, def)| {
                let signature = ComponentSignature {
                    params: def.params.clone(),
                    local_state: def.local_state.keys().cloned().collect(),
                    local_actions: def.local_actions.iter().map(|a| a.name.clone()).collect(),
                    extent: self.extents.get(name).copied().unwrap_or_default(),
                };
                (name.clone(), signature)
            })
            .collect();

        AnalysisContext {
            state_names: program.state.keys().cloned().collect(),
            action_names: self.action_names,
            route_params: self.route_params.unwrap_or_default(),
            component_registry,
            style_variants: program
                .styles
                .iter()
                .map(|(name, preset)| (name.clone(), preset.variants.keys().cloned().collect()))
                .collect(),
            import_names: program.imports.keys().cloned().collect(),
            data_names: program.data.keys().cloned().collect(),
            ref_names: self.refs,
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Reporting
    // ───────────────────────────────────────────────────────────────────────────

    fn suggest<'n, I>(&self, name: &str, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = &'n str>,
    {
        did_you_mean(name, candidates, self.options.suggestion_distance)
    }

    fn report(&mut self, code: ErrorCode, message: String, path: &str, suggestion: Option<String>) {
        self.errors.push(
            ConstelaError::new(code, message)
                .at(path)
                .with_suggestion(suggestion),
        );
    }

    fn check_state_target(&mut self, target: &str, path: &str) {
        if self.scopes.state_type(target).is_none() {
            let suggestion = self.suggest(target, self.scopes.visible_state());
            self.report(
                ErrorCode::UndefinedState,
                format!("Undefined state '{}'", target),
                path,
                suggestion,
            );
        }
    }

    fn check_action(&mut self, action: &str, path: &str) {
        if !self.scopes.has_action(action) {
            let suggestion = self.suggest(action, self.scopes.visible_actions());
            self.report(
                ErrorCode::UndefinedAction,
                format!("Undefined action '{}'", action),
                path,
                suggestion,
            );
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Program-level checks
    // ───────────────────────────────────────────────────────────────────────────

    /// Builds the name set, reporting every repeat after the first.
    fn declare_actions(&mut self, actions: &[ActionDef], path: &str) -> IndexSet<String> {
        let mut names = IndexSet::new();
        for (i, action) in actions.iter().enumerate() {
            if let Some(first) = names.get_index_of(&action.name) {
                self.errors.push(
                    ConstelaError::new(
                        ErrorCode::DuplicateAction,
                        format!("Duplicate action '{}'", action.name),
                    )
                    .at(join(&join_index(path, i), "name"))
                    .with_context("firstIndex", first),
                );
            } else {
                names.insert(action.name.clone());
            }
        }
        names
    }

    fn check_lifecycle(&mut self) {
        let program = self.program;
        let Some(lifecycle) = &program.lifecycle else {
            return;
        };
        for (hook, action) in lifecycle.hooks() {
            self.check_action(action, &join("/lifecycle", hook));
        }
    }

    fn check_route(&mut self) {
        let program = self.program;
        let Some(route) = &program.route else {
            return;
        };
        if let Some(title) = &route.title {
            self.visit_expression(title, "/route/title");
        }
        for (key, expr) in &route.meta {
            self.visit_expression(expr, &join("/route/meta", key));
        }
        for (key, expr) in &route.layout_params {
            self.visit_expression(expr, &join("/route/layoutParams", key));
        }
    }

    fn check_expanded_depth(&mut self) {
        let max = self.options.max_depth;
        let program = self.program;
        if !self.depth_reported {
            let view = view_extent(&program.view, &self.extents).fixed;
            let expr = view_expression_extent(&program.view, &self.extents).fixed;
            if view > max || expr > max {
                self.errors.push(
                    ConstelaError::new(
                        ErrorCode::MaxNestingExceeded,
                        format!(
                            "View nesting after component inlining exceeds the maximum depth of {}",
                            max
                        ),
                    )
                    .at("/view")
                    .with_context("viewDepth", view)
                    .with_context("expressionDepth", expr)
                    .with_context("maxDepth", max),
                );
            }
        }

        let limit = self.options.max_expanded_nodes;
        let size = view_size(&program.view, &self.extents).fixed;
        if size > limit {
            self.errors.push(
                ConstelaError::new(
                    ErrorCode::ExpansionLimitExceeded,
                    format!(
                        "View after component inlining exceeds the maximum of {} nodes",
                        limit
                    ),
                )
                .at("/view")
                .with_context("expandedNodes", size)
                .with_context("maxExpandedNodes", limit),
            );
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Components
    // ───────────────────────────────────────────────────────────────────────────

    fn component_instance(&mut self, node: &ComponentNode, path: &str) {
        let program = self.program;
        let props_path = join(path, "props");

        match program.components.get(&node.name) {
            Some(def) => {
                for (param, param_def) in &def.params {
                    if param_def.required && !node.props.contains_key(param) {
                        self.errors.push(
                            ConstelaError::new(
                                ErrorCode::ComponentPropMissing,
                                format!(
                                    "Component '{}' requires prop '{}'",
                                    node.name, param
                                ),
                            )
                            .at(props_path.as_str())
                            .with_context("component", node.name.as_str())
                            .with_context("prop", param.as_str()),
                        );
                    }
                }
            }
            None => {
                let suggestion = self.suggest(&node.name, program.components.keys().map(String::as_str));
                self.report(
                    ErrorCode::ComponentNotFound,
                    format!("Component '{}' is not defined", node.name),
                    path,
                    suggestion,
                );
            }
        }

        // Props and children belong to the caller's scope.
        for (name, expr) in &node.props {
            self.visit_expression(expr, &join(&props_path, name));
        }
        walk_children(self, &node.children, &join(path, "children"));

        if program.components.contains_key(&node.name) {
            self.calls.push(Call {
                name: node.name.clone(),
                site: path.to_string(),
            });
        }
    }

    /// Follows calls depth-first from `root`. A component is analyzed when
    /// first reached and finished once every call its body makes has been
    /// followed; reaching a component that is still on the stack is a cycle.
    fn explore(&mut self, root: Call) {
        let mut stack: Vec<Pending> = Vec::new();
        self.enter(root, &mut stack);
        while let Some((_, pending)) = stack.last_mut() {
            match pending.next() {
                Some(call) => self.enter(call, &mut stack),
                None => {
                    if let Some((name, _)) = stack.pop() {
                        self.finish(&name);
                    }
                }
            }
        }
    }

    fn enter(&mut self, call: Call, stack: &mut Vec<Pending>) {
        if let Some(start) = stack.iter().position(|(n, _)| *n == call.name) {
            let cycle: Vec<String> = stack[start..]
                .iter()
                .map(|(n, _)| n.clone())
                .chain(std::iter::once(call.name.clone()))
                .collect();
            self.errors.push(
                ConstelaError::new(
                    ErrorCode::ComponentCycle,
                    format!("Component cycle detected: {}", cycle.join(" -> ")),
                )
                .at(call.site)
                .with_context("cycle", cycle),
            );
            return;
        }
        if self.analyzed.contains(&call.name) {
            return;
        }
        if stack.len() >= self.options.max_depth {
            self.depth_reported = true;
            self.errors.push(
                ConstelaError::new(
                    ErrorCode::MaxNestingExceeded,
                    format!(
                        "Component nesting exceeds the maximum depth of {}",
                        self.options.max_depth
                    ),
                )
                .at(call.site)
                .with_context("maxDepth", self.options.max_depth),
            );
            return;
        }
        if !self.program.components.contains_key(&call.name) {
            return;
        }

        let calls = self.analyze_body(&call.name);
        stack.push((call.name, calls.into_iter()));
    }

    /// Checks one component body in its own frame and returns the calls it
    /// makes.
    fn analyze_body(&mut self, name: &str) -> Vec<Call> {
        let program = self.program;
        let Some(def) = program.components.get(name) else {
            return Vec::new();
        };
        let def_path = join("/components", name);
        let outer = std::mem::take(&mut self.calls);

        log::trace!("[constela] analyzing component '{}'", name);
        self.scopes.enter_component(def.params.keys().cloned().collect());

        let stateful = def.is_stateful();
        if stateful {
            let local_actions_path = join(&def_path, "localActions");
            let actions = self.declare_actions(&def.local_actions, &local_actions_path);
            self.scopes.push_locals(state_types(&def.local_state), actions);
            walk_actions(self, &def.local_actions, &local_actions_path);
        }
        self.visit_view(&def.view, &join(&def_path, "view"));
        if stateful {
            self.scopes.pop();
        }

        self.scopes.exit_component();
        std::mem::replace(&mut self.calls, outer)
    }

    /// Every callee is finished (or part of a reported cycle), so the extent
    /// table already holds what this body's extent depends on.
    fn finish(&mut self, name: &str) {
        let program = self.program;
        self.analyzed.insert(name.to_string());
        if let Some(def) = program.components.get(name) {
            let extent = component_extent(def, &self.extents);
            self.extents.insert(name.to_string(), extent);
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Expressions
    // ───────────────────────────────────────────────────────────────────────────

    fn check_lookup(&mut self, expr: &Expression, path: &str) {
        let program = self.program;
        match expr {
            Expression::State { name, .. } => self.check_state_target(name, path),
            Expression::Var { name, .. } => {
                let root = name.split('.').next().unwrap_or(name);
                if !self.scopes.has_var(root) {
                    let suggestion = self.suggest(root, self.scopes.visible_vars());
                    self.report(
                        ErrorCode::VarUndefined,
                        format!("Undefined variable '{}'", root),
                        path,
                        suggestion,
                    );
                }
            }
            Expression::Param { name, .. } => {
                if !self.scopes.resolves_param(name) {
                    let message = if self.scopes.in_component() {
                        format!("Undefined param '{}'", name)
                    } else {
                        format!("Param '{}' is referenced outside of a component", name)
                    };
                    let suggestion = self.suggest(name, self.scopes.visible_params());
                    self.report(ErrorCode::ParamUndefined, message, path, suggestion);
                }
            }
            Expression::Route { .. } if self.mode == Mode::Layout => {}
            Expression::Route { name, source } => {
                let Some(params) = &self.route_params else {
                    self.report(
                        ErrorCode::RouteNotDefined,
                        format!("Route expression '{}' requires a route definition", name),
                        path,
                        None,
                    );
                    return;
                };
                if *source == RouteSource::Param && !params.contains(name) {
                    let suggestion = self.suggest(name, params.iter().map(String::as_str));
                    let route_path = program.route.as_ref().map(|r| r.path.clone());
                    self.errors.push(
                        ConstelaError::new(
                            ErrorCode::UndefinedRouteParam,
                            format!("Route param '{}' is not declared by the route path", name),
                        )
                        .at(path)
                        .with_suggestion(suggestion)
                        .with_context("route", route_path),
                    );
                }
            }
            Expression::Import { name, .. } => {
                if !program.imports.contains_key(name) {
                    let suggestion = self.suggest(name, program.imports.keys().map(String::as_str));
                    self.report(
                        ErrorCode::UndefinedImport,
                        format!("Undefined import '{}'", name),
                        path,
                        suggestion,
                    );
                }
            }
            Expression::Data { name, .. } => {
                if !program.data.contains_key(name) {
                    let suggestion = self.suggest(name, program.data.keys().map(String::as_str));
                    self.report(
                        ErrorCode::UndefinedData,
                        format!("Undefined data source '{}'", name),
                        path,
                        suggestion,
                    );
                }
            }
            Expression::Ref { name } => self.check_ref(name, path),
            Expression::Validity { target, .. } => self.check_ref(target, &join(path, "ref")),
            Expression::Style { name, variants } => match program.styles.get(name) {
                None => {
                    let suggestion = self.suggest(name, program.styles.keys().map(String::as_str));
                    self.report(
                        ErrorCode::UndefinedStyle,
                        format!("Undefined style preset '{}'", name),
                        path,
                        suggestion,
                    );
                }
                Some(preset) => {
                    let variants_path = join(path, "variants");
                    for key in variants.keys() {
                        if !preset.variants.contains_key(key) {
                            let suggestion =
                                self.suggest(key, preset.variants.keys().map(String::as_str));
                            self.report(
                                ErrorCode::UndefinedVariant,
                                format!("Style preset '{}' has no variant '{}'", name, key),
                                &join(&variants_path, key),
                                suggestion,
                            );
                        }
                    }
                }
            },
            _ => {}
        }
    }

    fn check_ref(&mut self, name: &str, path: &str) {
        if !self.refs.contains(name) {
            let suggestion = self.suggest(name, self.refs.iter().map(String::as_str));
            self.report(
                ErrorCode::UndefinedRef,
                format!("Undefined element ref '{}'", name),
                path,
                suggestion,
            );
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Steps
    // ───────────────────────────────────────────────────────────────────────────

    fn check_update(&mut self, step: &ActionStep, path: &str) {
        let ActionStep::Update {
            target,
            operation,
            value,
            index,
            delete_count,
        } = step
        else {
            return;
        };

        match self.scopes.state_type(target) {
            None => self.check_state_target(target, &join(path, "target")),
            Some(actual) if actual != operation.target_type() => {
                self.errors.push(
                    ConstelaError::new(
                        ErrorCode::OperationInvalidForType,
                        format!(
                            "Operation '{}' requires '{}' state, but '{}' is '{}'",
                            operation.as_str(),
                            operation.target_type().as_str(),
                            target,
                            actual.as_str()
                        ),
                    )
                    .at(join(path, "operation"))
                    .with_context("operation", operation.as_str())
                    .with_context("stateType", actual.as_str()),
                );
            }
            Some(_) => {}
        }

        for field in operation.required_fields() {
            let present = match *field {
                "value" => value.is_some(),
                "index" => index.is_some(),
                "deleteCount" => delete_count.is_some(),
                _ => true,
            };
            if !present {
                self.errors.push(
                    ConstelaError::new(
                        ErrorCode::OperationMissingField,
                        format!(
                            "Operation '{}' requires field '{}'",
                            operation.as_str(),
                            field
                        ),
                    )
                    .at(join(path, field))
                    .with_context("operation", operation.as_str())
                    .with_context("field", *field),
                );
            }
        }
    }
}

impl Visitor for Analyzer<'_> {
    fn visit_view(&mut self, node: &ViewNode, path: &str) {
        match node {
            ViewNode::Each(each) => {
                self.visit_expression(&each.items, &join(path, "items"));
                let mut bound = vec![each.binding.clone()];
                bound.extend(each.index.clone());
                self.scopes.push_vars(bound);
                if let Some(key) = &each.key {
                    self.visit_expression(key, &join(path, "key"));
                }
                self.visit_view(&each.body, &join(path, "body"));
                self.scopes.pop();
            }
            ViewNode::Component(component) => self.component_instance(component, path),
            ViewNode::Slot(_) => {
                if !self.scopes.in_component() {
                    match self.mode {
                        Mode::Layout => self.saw_root_slot = true,
                        Mode::Page => self.errors.push(
                            ConstelaError::new(
                                ErrorCode::SlotOutsideComponent,
                                "Slot can only appear inside a component definition",
                            )
                            .at(path),
                        ),
                    }
                }
            }
            ViewNode::Island(island) => {
                let actions_path = join(path, "actions");
                let actions = self.declare_actions(&island.actions, &actions_path);
                self.scopes.push_locals(state_types(&island.state), actions);
                self.visit_view(&island.content, &join(path, "content"));
                walk_actions(self, &island.actions, &actions_path);
                self.scopes.pop();
            }
            _ => walk_view(self, node, path),
        }
    }

    fn visit_expression(&mut self, expr: &Expression, path: &str) {
        if let Expression::Lambda { param, index, body } = expr {
            let mut bound = vec![param.clone()];
            bound.extend(index.clone());
            self.scopes.push_vars(bound);
            self.visit_expression(body, &join(path, "body"));
            self.scopes.pop();
            return;
        }
        self.check_lookup(expr, path);
        walk_expression(self, expr, path);
    }

    fn visit_event_handler(&mut self, handler: &EventHandler, path: &str) {
        self.check_action(&handler.action, &join(path, "action"));
        if let Some(payload) = &handler.payload {
            self.visit_expression(payload, &join(path, "payload"));
        }
    }

    fn visit_action(&mut self, action: &ActionDef, path: &str) {
        let mut vars: Vec<String> = ACTION_VARS.iter().map(|v| v.to_string()).collect();
        collect_result_names(&action.steps, &mut vars);
        self.scopes.push_vars(vars);
        walk_steps(self, &action.steps, &join(path, "steps"));
        self.scopes.pop();
    }

    fn visit_step(&mut self, step: &ActionStep, path: &str) {
        match step {
            ActionStep::Update { .. } => self.check_update(step, path),
            ActionStep::Set { target, .. }
            | ActionStep::SetPath { target, .. }
            | ActionStep::Optimistic { target, .. }
            | ActionStep::Bind { target, .. }
            | ActionStep::Unbind { target, .. } => {
                self.check_state_target(target, &join(path, "target"))
            }
            ActionStep::Interval { action, .. } | ActionStep::Subscribe { action, .. } => {
                self.check_action(action, &join(path, "action"))
            }
            _ => {}
        }
        walk_step(self, step, path);
    }
}
