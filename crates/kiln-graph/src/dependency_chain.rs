use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::module::ModuleId;

/// A path through the import graph. For a cycle the last element repeats the first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyChain {
    pub path: Vec<ModuleId>,
}

impl DependencyChain {
    pub fn new(path: Vec<ModuleId>) -> Self {
        Self { path }
    }

    /// Number of edges in the chain.
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn has_cycle(&self) -> bool {
        self.path.len() > 1 && self.path.first() == self.path.last()
    }

    /// Render as `a.js -> b.js -> a.js` with paths relative to `root`.
    pub fn format_chain(&self, root: &Path) -> String {
        self.path
            .iter()
            .map(|id| id.relative_to(root))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
