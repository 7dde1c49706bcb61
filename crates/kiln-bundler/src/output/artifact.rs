//! The set of files one build emits.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use kiln_config::Category;

use crate::{Error, Result};

/// One file in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub category: Category,
    /// Path relative to the output directory, `/`-separated
    pub path: String,
    pub bytes: Vec<u8>,
    /// Entry that produced this artifact; `None` for shared assets
    pub entry: Option<String>,
}

impl Artifact {
    pub fn new(category: Category, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            category,
            path: path.into(),
            bytes,
            entry: None,
        }
    }

    pub fn for_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Artifacts keyed by output path.
///
/// Two artifacts may only share a path when their bytes are identical (the
/// same image imported from two entries); anything else is a collision.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    artifacts: BTreeMap<String, Artifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact.
    ///
    /// # Errors
    ///
    /// `Error::Configuration` when a different artifact already claims the path.
    pub fn insert(&mut self, artifact: Artifact) -> Result<()> {
        match self.artifacts.entry(artifact.path.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(artifact);
                Ok(())
            }
            Entry::Occupied(existing) if existing.get().bytes == artifact.bytes => Ok(()),
            Entry::Occupied(existing) => {
                let owner = |a: &Artifact| match &a.entry {
                    Some(entry) => format!("{} of entry '{entry}'", a.category),
                    None => a.category.to_string(),
                };
                Err(Error::Configuration {
                    message: format!(
                        "output path '{}' is produced by both the {} and the {}",
                        artifact.path,
                        owner(existing.get()),
                        owner(&artifact)
                    ),
                    hint: Some(
                        "Include [name] or [contenthash] in the output templates".to_string(),
                    ),
                })
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&Artifact> {
        self.artifacts.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.artifacts.contains_key(path)
    }

    /// The script artifact of `entry`.
    pub fn script_for(&self, entry: &str) -> Option<&Artifact> {
        self.artifacts
            .values()
            .find(|a| a.category == Category::Script && a.entry.as_deref() == Some(entry))
    }

    /// Artifacts in path order.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
