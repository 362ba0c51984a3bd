use serde::{Deserialize, Serialize};

/// Deepest logical nesting (expressions, view nodes, action steps) accepted.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Largest edit distance still offered as a "Did you mean" suggestion.
pub const DEFAULT_SUGGESTION_DISTANCE: usize = 2;

/// Most nodes (view nodes, expressions, steps) a page may expand to once its
/// component instances are inlined.
pub const DEFAULT_MAX_EXPANDED_NODES: usize = 200_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    pub max_depth: usize,
    pub suggestion_distance: usize,
    pub max_expanded_nodes: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            suggestion_distance: DEFAULT_SUGGESTION_DISTANCE,
            max_expanded_nodes: DEFAULT_MAX_EXPANDED_NODES,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_expanded_nodes(mut self, max_expanded_nodes: usize) -> Self {
        self.max_expanded_nodes = max_expanded_nodes;
        self
    }
}
