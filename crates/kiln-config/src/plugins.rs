//! Options for the built-in pipeline hooks.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::helpers::{default_circular_exclude, default_manifest_filename, default_true};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginsOptions {
    #[serde(default)]
    pub circular: CircularOptions,

    #[serde(default)]
    pub clean: CleanOptions,

    #[serde(default)]
    pub manifest: ManifestOptions,
}

/// Circular dependency detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CircularOptions {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Only modules matching this regex can start a reported cycle
    #[serde(default)]
    pub include: Option<String>,

    /// Modules matching this regex never start a reported cycle
    #[serde(default = "default_circular_exclude")]
    pub exclude: Option<String>,

    /// Fail the build instead of warning
    #[serde(default = "default_true")]
    pub fail_on_error: bool,

    /// Ignore cycles that pass through a dynamic `import()`
    #[serde(default)]
    pub allow_async_cycles: bool,

    /// Directory module paths are made relative to; defaults to the project root
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl Default for CircularOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            include: None,
            exclude: default_circular_exclude(),
            fail_on_error: true,
            allow_async_cycles: false,
            cwd: None,
        }
    }
}

/// Stale output cleanup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanOptions {
    /// Remove outputs the current build no longer produces.
    /// Unset means "only in production".
    #[serde(default)]
    pub stale_assets: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestFormat {
    #[default]
    Php,
    Json,
}

impl ManifestFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ManifestFormat::Php => "php",
            ManifestFormat::Json => "json",
        }
    }
}

impl fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Dependency manifest for the host's script registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestOptions {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub format: ManifestFormat,

    /// Combined manifest filename; the format extension is appended when missing
    #[serde(default = "default_manifest_filename")]
    pub output_filename: String,

    /// Add `wp-polyfill` to every entry's dependencies
    #[serde(default = "default_true")]
    pub inject_polyfill: bool,

    /// One manifest for all entries instead of one per script
    #[serde(default = "default_true")]
    pub combine_assets: bool,

    /// Externalize the host's conventional packages even if not listed
    #[serde(default = "default_true")]
    pub use_defaults: bool,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            format: ManifestFormat::Php,
            output_filename: default_manifest_filename(),
            inject_polyfill: true,
            combine_assets: true,
            use_defaults: true,
        }
    }
}

impl ManifestOptions {
    /// Relative path of the combined manifest.
    pub fn combined_filename(&self) -> String {
        let ext = self.format.extension();
        if self.output_filename.ends_with(&format!(".{ext}")) {
            self.output_filename.clone()
        } else {
            format!("{}.{ext}", self.output_filename)
        }
    }
}
