//! File-based config discovery for CLI use
//!
//! Finds the project configuration and layers it with figment:
//! serialized defaults, then the file, then `KILN_MODE` from the environment.

use std::fs;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml};
use serde_json::Value;
use tracing::debug;

use crate::config::{KilnConfig, Mode};
use crate::error::{ConfigError, Result};

pub const CONFIG_FILE: &str = "kiln.toml";
const PACKAGE_JSON: &str = "package.json";
const PACKAGE_FIELD: &str = "kiln";

/// Where a configuration was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Toml(PathBuf),
    Json(PathBuf),
    /// The `kiln` field of a package.json
    PackageJson(PathBuf),
    /// Built-in defaults only
    Defaults,
}

impl ConfigSource {
    fn for_path(path: &Path) -> Self {
        if path.file_name() == Some(std::ffi::OsStr::new(PACKAGE_JSON)) {
            return ConfigSource::PackageJson(path.to_path_buf());
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ConfigSource::Json(path.to_path_buf()),
            _ => ConfigSource::Toml(path.to_path_buf()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Toml(p) | ConfigSource::Json(p) | ConfigSource::PackageJson(p) => {
                Some(p)
            }
            ConfigSource::Defaults => None,
        }
    }
}

/// File-based configuration discovery
///
/// # Example
///
/// ```no_run
/// use kiln_config::{ConfigDiscovery, Mode};
///
/// let discovery = ConfigDiscovery::new(".");
/// let config = discovery.load(Some(Mode::Development)).unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. kiln.toml
    /// 2. package.json (kiln field)
    pub fn find(&self) -> Option<ConfigSource> {
        let toml_path = self.root.join(CONFIG_FILE);
        if toml_path.is_file() {
            return Some(ConfigSource::Toml(toml_path));
        }

        let pkg_path = self.root.join(PACKAGE_JSON);
        let has_field = fs::read_to_string(&pkg_path)
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok())
            .is_some_and(|parsed| parsed.get(PACKAGE_FIELD).is_some_and(|v| !v.is_null()));
        if has_field {
            return Some(ConfigSource::PackageJson(pkg_path));
        }

        None
    }

    /// Load the discovered config for `mode` (or the configured mode).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no config file is found.
    pub fn load(&self, mode: Option<Mode>) -> Result<KilnConfig> {
        let source = self.find().ok_or_else(|| ConfigError::NotFound {
            root: self.root.clone(),
        })?;
        self.load_source(&source, mode)
    }

    /// Load a config from an explicit path.
    pub fn load_file(&self, path: impl AsRef<Path>, mode: Option<Mode>) -> Result<KilnConfig> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                root: path.to_path_buf(),
            });
        }
        self.load_source(&ConfigSource::for_path(path), mode)
    }

    pub fn load_source(&self, source: &ConfigSource, mode: Option<Mode>) -> Result<KilnConfig> {
        debug!(?source, "loading configuration");

        let figment = Figment::from(Serialized::defaults(KilnConfig::default()));
        let figment = match source {
            ConfigSource::Toml(path) => figment.merge(Toml::file(path)),
            ConfigSource::Json(path) => figment.merge(Json::file(path)),
            ConfigSource::PackageJson(path) => {
                figment.merge(Serialized::defaults(read_package_field(path)?))
            }
            ConfigSource::Defaults => figment,
        };
        let figment = figment.merge(Env::prefixed("KILN_").only(&["mode"]));

        let config: KilnConfig = figment.extract().map_err(|e| ConfigError::InvalidValue {
            field: source
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "config".to_string()),
            hint: Some(e.to_string()),
        })?;

        let mode = mode.unwrap_or(config.mode);
        config.materialize_mode(mode)
    }
}

fn read_package_field(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;

    let parsed: Value = serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
        field: PACKAGE_JSON.to_string(),
        hint: Some(format!("Invalid JSON: {e}")),
    })?;

    match parsed.get(PACKAGE_FIELD) {
        Some(value) if value.is_object() => Ok(value.clone()),
        _ => Err(ConfigError::InvalidValue {
            field: PACKAGE_FIELD.to_string(),
            hint: Some("Add a 'kiln' object to your package.json".to_string()),
        }),
    }
}

/// Discover and load config from the current directory (convenience function)
pub fn discover(mode: Option<Mode>) -> Result<KilnConfig> {
    let root = std::env::current_dir()?;
    ConfigDiscovery::new(&root).load(mode)
}
