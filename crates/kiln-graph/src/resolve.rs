use std::path::{Path, PathBuf};

use oxc_resolver::{ResolveOptions, Resolver};

use crate::error::{GraphError, Result};

/// Extensions tried for extensionless specifiers, in order.
pub(crate) const EXTENSIONS: &[&str] = &[
    ".js", ".jsx", ".mjs", ".ts", ".tsx", ".json", ".scss", ".sass", ".css",
];

/// Export conditions honoured in `package.json` `exports`.
pub(crate) const CONDITIONS: &[&str] = &["import", "module", "browser", "default"];

/// `package.json` fields consulted for a package's entry, in order.
pub(crate) const MAIN_FIELDS: &[&str] = &["browser", "module", "main"];

/// Node-style resolver for browser builds.
pub struct ModuleResolver {
    resolver: Resolver,
}

impl ModuleResolver {
    pub fn new() -> Self {
        let resolver = Resolver::new(ResolveOptions {
            condition_names: CONDITIONS.iter().map(|c| c.to_string()).collect(),
            extensions: EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            main_fields: MAIN_FIELDS.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        });
        Self { resolver }
    }

    /// Resolve `specifier` as imported from the file `importer`.
    pub fn resolve(&self, importer: &Path, specifier: &str) -> Result<PathBuf> {
        let dir = importer.parent().unwrap_or(Path::new("/"));
        self.resolver
            .resolve(dir, specifier)
            .map(|resolution| resolution.path().to_path_buf())
            .map_err(|e| GraphError::Unresolved {
                specifier: specifier.to_string(),
                importer: importer.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension list in the `Option<Vec<String>>` shape bundler options expect.
pub fn resolve_extensions() -> Vec<String> {
    EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

pub fn resolve_conditions() -> Vec<String> {
    CONDITIONS.iter().map(|c| c.to_string()).collect()
}

pub fn resolve_main_fields() -> Vec<String> {
    MAIN_FIELDS.iter().map(|f| f.to_string()).collect()
}
