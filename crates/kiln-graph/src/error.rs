use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Cannot resolve '{specifier}' imported from '{importer}': {reason}")]
    Unresolved {
        specifier: String,
        importer: PathBuf,
        reason: String,
    },

    #[error("Entry '{name}' does not point at a readable file: {path}")]
    Entry { name: String, path: PathBuf },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GraphError {
    /// File the error is about, when there is one.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            GraphError::Parse { path, .. }
            | GraphError::Entry { path, .. }
            | GraphError::Io { path, .. } => Some(path),
            GraphError::Unresolved { importer, .. } => Some(importer),
            GraphError::InvalidPattern { .. } => None,
        }
    }
}
