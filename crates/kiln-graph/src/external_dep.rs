use serde::{Deserialize, Serialize};

use crate::module::ModuleId;

/// An import left to the host page, plus the modules that request it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExternalDependency {
    pub specifier: String,
    pub importers: Vec<ModuleId>,
}

impl ExternalDependency {
    pub fn new(specifier: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            importers: Vec::new(),
        }
    }

    /// Record an importer once, keeping first-seen order.
    pub fn push_importer(&mut self, module_id: ModuleId) {
        if !self.importers.contains(&module_id) {
            self.importers.push(module_id);
        }
    }
}
