//! Error types for configuration validation and loading.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    // Filesystem validation errors
    #[error("entry '{name}' not found: {}", path.display())]
    EntryNotFound { name: String, path: PathBuf },

    #[error("entry '{name}' is not a file: {}", path.display())]
    EntryNotAFile { name: String, path: PathBuf },

    // Config parsing/loading errors
    #[error("no kiln.toml (or package.json \"kiln\" field) found in {}", root.display())]
    NotFound { root: PathBuf },

    #[error("invalid config value for '{field}'{}", hint.as_ref().map(|h| format!(": {h}")).unwrap_or_default())]
    InvalidValue { field: String, hint: Option<String> },

    #[error("unknown build mode '{0}' (expected 'development' or 'production')")]
    UnknownMode(String),

    #[error("invalid mode override: {message}")]
    InvalidModeOverride { message: String },

    // Schema validation errors (no filesystem checks)
    #[error("no entries specified")]
    NoEntries,

    #[error("invalid pattern in '{field}' ({pattern}): {message}")]
    InvalidPattern {
        field: String,
        pattern: String,
        message: String,
    },

    #[error("invalid filename template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("output paths collide: {message}")]
    TemplateCollision { message: String },

    #[error("invalid rule #{index}: {message}")]
    InvalidRule { index: usize, message: String },

    #[error("schema validation failed: {message}")]
    SchemaValidation {
        message: String,
        hint: Option<String>,
    },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Actionable guidance for the error, when there is any.
    pub fn hint(&self) -> Option<String> {
        match self {
            ConfigError::EntryNotFound { .. } | ConfigError::EntryNotAFile { .. } => Some(
                "Entry paths in [entry] are resolved relative to the project root".to_string(),
            ),
            ConfigError::NotFound { .. } => {
                Some("Create a kiln.toml next to your sources or pass --config".to_string())
            }
            ConfigError::NoEntries => {
                Some("Add at least one entry, e.g. [entry] main = \"src/js/main.js\"".to_string())
            }
            ConfigError::TemplateCollision { .. } => Some(
                "Include [name] or [contenthash] in every filename template".to_string(),
            ),
            ConfigError::InvalidValue { hint, .. } => hint.clone(),
            ConfigError::SchemaValidation { hint, .. } => hint.clone(),
            _ => None,
        }
    }
}
