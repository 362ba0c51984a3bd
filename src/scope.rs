use indexmap::{IndexMap, IndexSet};

use crate::ast::StateType;

/// Which `param` names resolve in the current frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// Page body: no params exist.
    Forbidden,
    /// Layout body: params are bound later from the page's `layoutParams`.
    Open,
    Declared(IndexSet<String>),
}

impl Params {
    pub fn resolves(&self, name: &str) -> bool {
        match self {
            Params::Forbidden => false,
            Params::Open => true,
            Params::Declared(names) => names.contains(name),
        }
    }
}

#[derive(Debug, Default)]
struct Layer {
    vars: IndexSet<String>,
    state: IndexMap<String, StateType>,
    actions: IndexSet<String>,
}

#[derive(Debug)]
struct Frame {
    params: Params,
    layers: Vec<Layer>,
}

/// Lexical scopes for name resolution.
///
/// Program state and actions are visible everywhere. A component body opens
/// a fresh frame, so `var`s bound by the caller and the caller's local state
/// do not leak into it. `each`, `lambda`, action bodies and stateful scopes
/// push layers onto the current frame.
#[derive(Debug)]
pub struct ScopeStack {
    globals: Layer,
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new(state: IndexMap<String, StateType>, actions: IndexSet<String>) -> Self {
        ScopeStack {
            globals: Layer {
                vars: IndexSet::new(),
                state,
                actions,
            },
            frames: vec![Frame {
                params: Params::Forbidden,
                layers: Vec::new(),
            }],
        }
    }

    pub fn with_root_params(mut self, params: Params) -> Self {
        if let Some(root) = self.frames.first_mut() {
            root.params = params;
        }
        self
    }

    fn frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn enter_component(&mut self, params: IndexSet<String>) {
        self.frames.push(Frame {
            params: Params::Declared(params),
            layers: Vec::new(),
        });
    }

    pub fn exit_component(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn in_component(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn push_vars<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_layer(Layer {
            vars: names.into_iter().map(Into::into).collect(),
            ..Layer::default()
        });
    }

    pub fn push_locals(&mut self, state: IndexMap<String, StateType>, actions: IndexSet<String>) {
        self.push_layer(Layer {
            vars: IndexSet::new(),
            state,
            actions,
        });
    }

    fn push_layer(&mut self, layer: Layer) {
        if let Some(frame) = self.frames.last_mut() {
            frame.layers.push(layer);
        }
    }

    pub fn pop(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.layers.pop();
        }
    }

    fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.frame()
            .into_iter()
            .flat_map(|f| f.layers.iter().rev())
            .chain(std::iter::once(&self.globals))
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.layers().any(|l| l.vars.contains(name))
    }

    pub fn state_type(&self, name: &str) -> Option<StateType> {
        self.layers().find_map(|l| l.state.get(name).copied())
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.layers().any(|l| l.actions.contains(name))
    }

    pub fn resolves_param(&self, name: &str) -> bool {
        self.frame().map_or(false, |f| f.params.resolves(name))
    }

    pub fn visible_vars(&self) -> Vec<&str> {
        self.layers()
            .flat_map(|l| l.vars.iter().map(String::as_str))
            .collect()
    }

    pub fn visible_state(&self) -> Vec<&str> {
        self.layers()
            .flat_map(|l| l.state.keys().map(String::as_str))
            .collect()
    }

    pub fn visible_actions(&self) -> Vec<&str> {
        self.layers()
            .flat_map(|l| l.actions.iter().map(String::as_str))
            .collect()
    }

    pub fn visible_params(&self) -> Vec<&str> {
        match self.frame().map(|f| &f.params) {
            Some(Params::Declared(names)) => names.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> ScopeStack {
        let mut state = IndexMap::new();
        state.insert("count".to_string(), StateType::Number);
        let actions: IndexSet<String> = ["increment".to_string()].into_iter().collect();
        ScopeStack::new(state, actions)
    }

    #[test]
    fn test_globals_visible_inside_components() {
        let mut scopes = stack();
        scopes.enter_component(IndexSet::new());
        assert_eq!(scopes.state_type("count"), Some(StateType::Number));
        assert!(scopes.has_action("increment"));
        scopes.exit_component();
        assert!(!scopes.in_component());
    }

    #[test]
    fn test_vars_do_not_cross_component_frames() {
        let mut scopes = stack();
        scopes.push_vars(["item"]);
        assert!(scopes.has_var("item"));

        scopes.enter_component(IndexSet::new());
        assert!(!scopes.has_var("item"));
        scopes.exit_component();

        assert!(scopes.has_var("item"));
        scopes.pop();
        assert!(!scopes.has_var("item"));
    }

    #[test]
    fn test_local_state_shadows_and_unwinds() {
        let mut scopes = stack();
        let mut local = IndexMap::new();
        local.insert("count".to_string(), StateType::List);
        scopes.push_locals(local, IndexSet::new());
        assert_eq!(scopes.state_type("count"), Some(StateType::List));
        scopes.pop();
        assert_eq!(scopes.state_type("count"), Some(StateType::Number));
    }

    #[test]
    fn test_param_resolution_by_frame() {
        let mut scopes = stack();
        assert!(!scopes.resolves_param("title"));

        let params: IndexSet<String> = ["title".to_string()].into_iter().collect();
        scopes.enter_component(params);
        assert!(scopes.resolves_param("title"));
        assert!(!scopes.resolves_param("subtitle"));
        assert_eq!(scopes.visible_params(), vec!["title"]);
        scopes.exit_component();

        let layout = stack().with_root_params(Params::Open);
        assert!(layout.resolves_param("anything"));
    }
}
