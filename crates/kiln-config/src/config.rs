//! Top-level project configuration.
//!
//! This module provides the main `KilnConfig` struct, the build [`Mode`] and the
//! mode-override merging logic. For file discovery, see the `discovery` module.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Result as ConfigResult};
use crate::helpers::{
    default_browserslist, default_externals, default_rules, default_script_target, default_true,
};
use crate::output::OutputOptions;
use crate::plugins::PluginsOptions;
use crate::rules::Rule;

/// Build mode selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    #[default]
    Production,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Mode::Production)
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Script transpilation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptOptions {
    /// Syntax level scripts are lowered to (`es2015`, `es2020`, `chrome80`, ...)
    #[serde(default = "default_script_target")]
    pub target: String,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            target: default_script_target(),
        }
    }
}

/// Stylesheet post-processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleOptions {
    /// Browserslist queries that drive prefixing and syntax lowering
    #[serde(default = "default_browserslist")]
    pub browsers: Vec<String>,

    /// Extra directories searched by Sass `@use` / `@import`
    #[serde(default)]
    pub load_paths: Vec<PathBuf>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            browsers: default_browserslist(),
            load_paths: Vec::new(),
        }
    }
}

/// Production minification switches. Development builds never minify.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinifyOptions {
    #[serde(default)]
    pub scripts: bool,

    #[serde(default = "default_true")]
    pub styles: bool,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            scripts: false,
            styles: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KilnConfig {
    #[serde(default)]
    pub mode: Mode,

    /// Logical entry name to source path, relative to the project root
    #[serde(default)]
    pub entry: IndexMap<String, PathBuf>,

    #[serde(default)]
    pub output: OutputOptions,

    /// Ordered rule list; the first rule matching a file wins for its category
    #[serde(default = "default_rules")]
    pub rules: Vec<Rule>,

    /// Import request to host global expression
    #[serde(default = "default_externals")]
    pub externals: IndexMap<String, String>,

    #[serde(default)]
    pub script: ScriptOptions,

    #[serde(default)]
    pub style: StyleOptions,

    #[serde(default)]
    pub minify: MinifyOptions,

    #[serde(default)]
    pub plugins: PluginsOptions,

    /// Per-mode overrides, deep-merged over the base config
    #[serde(default)]
    pub modes: BTreeMap<String, Value>,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            entry: IndexMap::new(),
            output: OutputOptions::default(),
            rules: default_rules(),
            externals: default_externals(),
            script: ScriptOptions::default(),
            style: StyleOptions::default(),
            minify: MinifyOptions::default(),
            plugins: PluginsOptions::default(),
            modes: BTreeMap::new(),
        }
    }
}

impl KilnConfig {
    /// Create from serde_json::Value (for programmatic config)
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_config::KilnConfig;
    /// use serde_json::json;
    /// use std::path::PathBuf;
    ///
    /// let value = json!({
    ///     "entry": { "main": "src/js/main.js" }
    /// });
    ///
    /// let config = KilnConfig::from_value(value).unwrap();
    /// assert_eq!(config.entry["main"], PathBuf::from("src/js/main.js"));
    /// ```
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> ConfigResult<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Apply the `[modes.<mode>]` overrides and pin `mode`.
    pub fn materialize_mode(self, mode: Mode) -> ConfigResult<Self> {
        let overrides = self.modes.get(mode.as_str()).cloned();
        let mut config = match overrides {
            Some(overrides) if !overrides.is_null() => {
                if overrides.get("modes").is_some() {
                    return Err(ConfigError::InvalidModeOverride {
                        message: format!("[modes.{mode}] cannot contain nested modes"),
                    });
                }

                let modes = self.modes.clone();
                let mut base = serde_json::to_value(&self).map_err(|err| {
                    ConfigError::InvalidModeOverride {
                        message: err.to_string(),
                    }
                })?;
                merge_values(&mut base, &overrides);
                let mut merged: KilnConfig = serde_json::from_value(base).map_err(|err| {
                    ConfigError::InvalidModeOverride {
                        message: err.to_string(),
                    }
                })?;
                merged.modes = modes;
                merged
            }
            _ => self,
        };

        config.mode = mode;
        Ok(config)
    }

    /// Whether stale outputs are removed in this build.
    pub fn cleans_stale_outputs(&self) -> bool {
        self.plugins
            .clean
            .stale_assets
            .unwrap_or(self.mode.is_production())
    }

    pub fn minify_scripts(&self) -> bool {
        self.mode.is_production() && self.minify.scripts
    }

    pub fn minify_styles(&self) -> bool {
        self.mode.is_production() && self.minify.styles
    }
}

fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}
