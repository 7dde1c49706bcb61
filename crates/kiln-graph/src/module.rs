use std::fmt;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};

use crate::collect::ImportRecord;

/// Absolute, cleaned path identifying a module in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(PathBuf);

impl ModuleId {
    /// Build an id from a path, canonicalizing when the file exists so that ids
    /// produced by different resolvers agree.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let path = path.canonicalize().unwrap_or_else(|_| path.clean());
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// `/`-separated path relative to `root`, or the full path when outside it.
    pub fn relative_to(&self, root: &Path) -> String {
        match self.0.strip_prefix(root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => self.0.to_string_lossy().replace('\\', "/"),
        }
    }

    pub fn extension(&self) -> Option<&str> {
        self.0.extension().and_then(|e| e.to_str())
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for ModuleId {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// Coarse file type, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    /// Parsed for imports
    Script,
    /// Leaf, compiled by the style chain
    Style,
    /// Leaf, anything else (images, fonts, json)
    Asset,
}

impl ModuleKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("js" | "mjs" | "cjs" | "jsx" | "ts" | "mts" | "cts" | "tsx") => {
                ModuleKind::Script
            }
            Some("css" | "scss" | "sass") => ModuleKind::Style,
            _ => ModuleKind::Asset,
        }
    }
}

/// A module reached from at least one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub kind: ModuleKind,
    /// Import records in source order; empty for leaf kinds
    pub imports: Vec<ImportRecord>,
    pub is_entry: bool,
}

impl Module {
    pub fn new(id: ModuleId, kind: ModuleKind) -> Self {
        Self {
            id,
            kind,
            imports: Vec::new(),
            is_entry: false,
        }
    }

    pub fn mark_entry(&mut self) {
        self.is_entry = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_extension() {
        assert_eq!(ModuleKind::from_path(Path::new("a/b.js")), ModuleKind::Script);
        assert_eq!(ModuleKind::from_path(Path::new("a/b.tsx")), ModuleKind::Script);
        assert_eq!(ModuleKind::from_path(Path::new("a/b.scss")), ModuleKind::Style);
        assert_eq!(ModuleKind::from_path(Path::new("a/logo.svg")), ModuleKind::Asset);
    }

    #[test]
    fn relative_to_uses_forward_slashes() {
        let id = ModuleId::new("/project/src/js/main.js");
        assert_eq!(id.relative_to(Path::new("/project")), "src/js/main.js");
        assert_eq!(id.relative_to(Path::new("/elsewhere")), "/project/src/js/main.js");
    }
}
