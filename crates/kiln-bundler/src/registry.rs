//! Thread-safe registries shared between rolldown plugins and the pipeline.
//!
//! Plugins run inside rolldown's own tasks, so everything they produce besides
//! the JavaScript chunk (compiled stylesheets, emitted files, failures) is
//! recorded here and picked up after `generate()` returns.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_graph::ModuleId;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::{Error, Result};

/// Compiled CSS per stylesheet module.
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    inner: Arc<RwLock<FxHashMap<ModuleId, String>>>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, module: ModuleId, css: String) {
        self.inner.write().insert(module, css);
    }

    pub fn get(&self, module: &ModuleId) -> Option<String> {
        self.inner.read().get(module).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// A file emitted by an asset rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    pub source: PathBuf,
    pub bytes: Arc<Vec<u8>>,
}

/// Files emitted by asset rules, keyed by output-relative path.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    inner: Arc<RwLock<BTreeMap<String, EmittedAsset>>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an emitted file under its output path.
    ///
    /// Re-registering identical bytes is a no-op, whichever source they came
    /// from.
    ///
    /// # Errors
    ///
    /// `Error::Configuration` naming both sources when a different file
    /// already claims `path`.
    pub fn register(&self, path: String, source: &Path, bytes: Vec<u8>) -> Result<()> {
        match self.inner.write().entry(path) {
            Entry::Vacant(slot) => {
                slot.insert(EmittedAsset {
                    source: source.to_path_buf(),
                    bytes: Arc::new(bytes),
                });
                Ok(())
            }
            Entry::Occupied(existing) if *existing.get().bytes == bytes => Ok(()),
            Entry::Occupied(existing) => Err(Error::Configuration {
                message: format!(
                    "output path '{}' is produced by both '{}' and '{}'",
                    existing.key(),
                    existing.get().source.display(),
                    source.display()
                ),
                hint: Some("Rename one of the files or add [contenthash] to the asset template".to_string()),
            }),
        }
    }

    /// Snapshot of every emitted asset, sorted by output path.
    pub fn snapshot(&self) -> Vec<(String, EmittedAsset)> {
        self.inner
            .read()
            .iter()
            .map(|(path, asset)| (path.clone(), asset.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// First typed failure raised inside a plugin hook.
///
/// Rolldown flattens hook errors into its own diagnostics; recording the typed
/// error here lets the pipeline report a transform failure with its file.
#[derive(Debug, Clone, Default)]
pub struct FailureLog {
    inner: Arc<Mutex<Option<Error>>>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `error` unless an earlier failure is already recorded.
    pub fn record(&self, error: Error) {
        let mut slot = self.inner.lock();
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    pub fn take(&self) -> Option<Error> {
        self.inner.lock().take()
    }
}
