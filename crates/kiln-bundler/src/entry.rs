//! Entry resolution: logical names to absolute source files.

use std::path::{Path, PathBuf};

use kiln_config::{ConfigError, KilnConfig};
use tracing::debug;

use crate::{Error, Result};

/// One named entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub name: String,
    /// Absolute, canonical path of the entry file
    pub path: PathBuf,
}

/// The normalized entry table, ordered by logical name.
#[derive(Debug, Clone, Default)]
pub struct ResolvedEntries {
    entries: Vec<ResolvedEntry>,
}

impl ResolvedEntries {
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(name, path)` pairs for the graph crawler.
    pub fn as_pairs(&self) -> Vec<(String, PathBuf)> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.path.clone()))
            .collect()
    }
}

/// Maps the configured entry table onto the filesystem.
pub struct EntryResolver<'a> {
    root: &'a Path,
}

impl<'a> EntryResolver<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Check that every entry names a readable file and return absolute paths.
    ///
    /// # Errors
    ///
    /// `Error::Configuration` for the first entry that is missing or is not a
    /// regular file.
    pub fn resolve(&self, config: &KilnConfig) -> Result<ResolvedEntries> {
        if config.entry.is_empty() {
            return Err(ConfigError::NoEntries.into());
        }

        let mut entries = Vec::with_capacity(config.entry.len());
        for (name, relative) in &config.entry {
            let path = self.root.join(relative);
            if !path.exists() {
                return Err(ConfigError::EntryNotFound {
                    name: name.clone(),
                    path,
                }
                .into());
            }
            if !path.is_file() {
                return Err(ConfigError::EntryNotAFile {
                    name: name.clone(),
                    path,
                }
                .into());
            }
            let path = path.canonicalize().map_err(|e| Error::io(&path, e))?;
            debug!(entry = %name, path = %path.display(), "resolved entry");
            entries.push(ResolvedEntry {
                name: name.clone(),
                path,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ResolvedEntries { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn resolves_entries_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/admin.js"), "").unwrap();
        fs::write(dir.path().join("src/main.js"), "").unwrap();

        let mut config = KilnConfig::default();
        config.entry.insert("main".into(), "src/main.js".into());
        config.entry.insert("admin".into(), "src/admin.js".into());

        let entries = EntryResolver::new(dir.path()).resolve(&config).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["admin", "main"]);
        assert!(entries.get("main").unwrap().path.is_absolute());
    }

    #[test]
    fn missing_entry_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let mut config = KilnConfig::default();
        config.entry.insert("main".into(), "src/main.js".into());

        let err = EntryResolver::new(dir.path()).resolve(&config).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("main"));
    }
}
