//! Lowering: validated, analyzed [`Program`] to [`CompiledProgram`].
//!
//! Pure rewriting. Every component instance is inlined with its props bound
//! by reference and its slots replaced by the caller's lowered children.
//! Anything that goes wrong here means analysis let an invalid program
//! through, so failures are [`InternalError`]s.

use indexmap::{IndexMap, IndexSet};
use serde_json::Number;

use crate::analyze::AnalysisContext;
use crate::ast::{
    ActionDef, CodeNode, ComponentNode, Expression, MarkdownNode, Program, TextNode,
    TransitionConfig, ViewNode, DEFAULT_TRANSITION_DURATION_MS,
};
use crate::component::{
    avoid_capture, bind_props, expression_var_names, substitute_expression, substitute_prop,
    substitute_steps, view_var_names, PropEnv,
};
use crate::error::InternalError;
use crate::ir::{
    CompiledAction, CompiledEach, CompiledElement, CompiledErrorBoundary, CompiledIf,
    CompiledIsland, CompiledNode, CompiledPortal, CompiledProgram, CompiledRoute,
    CompiledSuspense, LocalStateNode,
};

type Lowered<T> = Result<T, InternalError>;

pub fn transform(program: &Program, ctx: &AnalysisContext) -> Result<CompiledProgram, InternalError> {
    let mut lowerer = Lowerer::new(program, ctx);
    let root = Expansion::root();

    let view = lowerer.lower_single(&program.view, root)?;
    let actions = lowerer.lower_actions(&program.actions, root);

    let route = program.route.as_ref().map(|route| CompiledRoute {
        path: route.path.clone(),
        params: ctx.route_params.iter().cloned().collect(),
        title: route.title.clone(),
        layout: route.layout.clone(),
        layout_params: route.layout_params.clone(),
        meta: route.meta.clone(),
    });

    log::debug!(
        "[constela] transform ok: {} component instance(s) inlined",
        lowerer.instances
    );

    Ok(CompiledProgram {
        version: program.version.clone(),
        route,
        imports: program.imports.clone(),
        data: program.data.clone(),
        lifecycle: program.lifecycle.clone(),
        state: program.state.clone(),
        actions,
        view,
        styles: program.styles.clone(),
        widgets: program.widgets.clone(),
    })
}

/// What a view subtree is being lowered against: the bound props of the
/// enclosing component instance (if any) and the nodes its slots expand to.
#[derive(Clone, Copy)]
pub(crate) struct Expansion<'e> {
    pub params: Option<&'e PropEnv>,
    pub slot: &'e [CompiledNode],
}

impl<'e> Expansion<'e> {
    pub fn root() -> Self {
        Expansion {
            params: None,
            slot: &[],
        }
    }
}

pub(crate) struct Lowerer<'a> {
    program: &'a Program,
    ctx: &'a AnalysisContext,
    expanding: Vec<String>,
    pub instances: usize,
}

impl<'a> Lowerer<'a> {
    pub fn new(program: &'a Program, ctx: &'a AnalysisContext) -> Self {
        Lowerer {
            program,
            ctx,
            expanding: Vec::new(),
            instances: 0,
        }
    }

    pub fn lower_actions(&self, actions: &[ActionDef], env: Expansion) -> IndexMap<String, CompiledAction> {
        actions
            .iter()
            .map(|action| {
                let mut steps = action.steps.clone();
                if let Some(params) = env.params {
                    substitute_steps(&mut steps, params);
                }
                (
                    action.name.clone(),
                    CompiledAction {
                        name: action.name.clone(),
                        steps,
                    },
                )
            })
            .collect()
    }

    /// Lowers a node that stands alone (a branch, a body, the root). Anything
    /// other than exactly one resulting node is wrapped in a fragment.
    pub fn lower_single(&mut self, node: &ViewNode, env: Expansion) -> Lowered<CompiledNode> {
        let mut nodes = self.lower_nodes(std::slice::from_ref(node), env)?;
        if nodes.len() == 1 {
            if let Some(only) = nodes.pop() {
                return Ok(only);
            }
        }
        Ok(CompiledNode::fragment(nodes))
    }

    /// Lowers a child list; slots and components splice their expansion in
    /// place.
    pub fn lower_nodes(&mut self, nodes: &[ViewNode], env: Expansion) -> Lowered<Vec<CompiledNode>> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                ViewNode::Slot(_) => out.extend(env.slot.iter().cloned()),
                ViewNode::Component(component) => out.extend(self.expand_component(component, env)?),
                _ => out.push(self.lower_node(node, env)?),
            }
        }
        Ok(out)
    }

    fn expand_component(&mut self, node: &ComponentNode, env: Expansion) -> Lowered<Vec<CompiledNode>> {
        let program = self.program;
        let def = match (
            self.ctx.component_registry.contains_key(&node.name),
            program.components.get(&node.name),
        ) {
            (true, Some(def)) => def,
            _ => {
                return Err(InternalError::UnregisteredComponent {
                    name: node.name.clone(),
                })
            }
        };
        if self.expanding.iter().any(|n| n == &node.name) {
            return Err(InternalError::Invariant(format!(
                "component '{}' reached lowering while already being expanded",
                node.name
            )));
        }

        let props = bind_props(node, env.params);
        let children = self.lower_nodes(&node.children, env)?;

        let mut outside = IndexSet::new();
        expression_var_names(props.values(), &mut outside);
        if !node.children.is_empty() {
            view_var_names(&node.children, &mut outside);
            if let Some(params) = env.params {
                expression_var_names(params.values(), &mut outside);
            }
        }
        let renamed = avoid_capture(def, &outside);
        let def = renamed.as_ref().unwrap_or(def);

        let inner = Expansion {
            params: Some(&props),
            slot: &children,
        };

        self.instances += 1;
        log::trace!(
            "[constela] inlining component '{}' (instance {})",
            node.name,
            self.instances
        );

        self.expanding.push(node.name.clone());
        let expanded = if def.is_stateful() {
            let child = self.lower_single(&def.view, inner)?;
            vec![CompiledNode::LocalState(LocalStateNode {
                state: def.local_state.clone(),
                actions: self.lower_actions(&def.local_actions, inner),
                child: Box::new(child),
            })]
        } else {
            self.lower_nodes(std::slice::from_ref(&def.view), inner)?
        };
        self.expanding.pop();

        Ok(expanded)
    }

    fn expr(&self, expr: &Expression, env: Expansion) -> Expression {
        let mut lowered = expr.clone();
        if let Some(params) = env.params {
            substitute_expression(&mut lowered, params);
        }
        lowered
    }

    fn lower_node(&mut self, node: &ViewNode, env: Expansion) -> Lowered<CompiledNode> {
        Ok(match node {
            ViewNode::Element(element) => CompiledNode::Element(CompiledElement {
                tag: element.tag.clone(),
                props: element
                    .props
                    .iter()
                    .map(|(name, prop)| {
                        let mut prop = prop.clone();
                        if let Some(params) = env.params {
                            substitute_prop(&mut prop, params);
                        }
                        (name.clone(), prop)
                    })
                    .collect(),
                children: self.lower_nodes(&element.children, env)?,
                ref_name: element.ref_name.clone(),
            }),
            ViewNode::Text(text) => CompiledNode::Text(TextNode {
                value: self.expr(&text.value, env),
            }),
            ViewNode::If(node) => CompiledNode::If(CompiledIf {
                condition: self.expr(&node.condition, env),
                then: Box::new(self.lower_single(&node.then, env)?),
                otherwise: match &node.otherwise {
                    Some(otherwise) => Some(Box::new(self.lower_single(otherwise, env)?)),
                    None => None,
                },
                transition: lower_transition(node.transition.as_ref()),
            }),
            ViewNode::Each(node) => CompiledNode::Each(CompiledEach {
                items: self.expr(&node.items, env),
                binding: node.binding.clone(),
                index: node.index.clone(),
                key: node.key.as_ref().map(|key| self.expr(key, env)),
                body: Box::new(self.lower_single(&node.body, env)?),
                transition: lower_transition(node.transition.as_ref()),
            }),
            ViewNode::Markdown(node) => CompiledNode::Markdown(MarkdownNode {
                content: self.expr(&node.content, env),
            }),
            ViewNode::Code(node) => CompiledNode::Code(CodeNode {
                language: self.expr(&node.language, env),
                content: self.expr(&node.content, env),
            }),
            ViewNode::Portal(node) => CompiledNode::Portal(CompiledPortal {
                target: node.target.clone(),
                children: self.lower_nodes(&node.children, env)?,
            }),
            ViewNode::Island(node) => CompiledNode::Island(CompiledIsland {
                id: node.id.clone(),
                strategy: node.strategy,
                strategy_options: node.strategy_options.clone(),
                content: Box::new(self.lower_single(&node.content, env)?),
                state: node.state.clone(),
                actions: self.lower_actions(&node.actions, env),
            }),
            ViewNode::Suspense(node) => CompiledNode::Suspense(CompiledSuspense {
                id: node.id.clone(),
                fallback: Box::new(self.lower_single(&node.fallback, env)?),
                content: Box::new(self.lower_single(&node.content, env)?),
            }),
            ViewNode::ErrorBoundary(node) => CompiledNode::ErrorBoundary(CompiledErrorBoundary {
                fallback: Box::new(self.lower_single(&node.fallback, env)?),
                content: Box::new(self.lower_single(&node.content, env)?),
            }),
            ViewNode::Component(_) | ViewNode::Slot(_) => self.lower_single(node, env)?,
        })
    }
}

/// Copies the directive, filling in the default duration. No directive stays
/// no directive.
fn lower_transition(transition: Option<&TransitionConfig>) -> Option<TransitionConfig> {
    transition.map(|t| TransitionConfig {
        duration: Some(
            t.duration
                .clone()
                .unwrap_or_else(|| Number::from(DEFAULT_TRANSITION_DURATION_MS)),
        ),
        ..t.clone()
    })
}
