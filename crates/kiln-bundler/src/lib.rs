//! # kiln-bundler
//!
//! Drives a complete kiln build: resolves entries, crawls the import graph,
//! bundles every entry with rolldown (scripts lowered by oxc, stylesheets
//! compiled by grass and lightningcss and extracted to their own files),
//! runs the hook pipeline and writes the artifacts.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kiln_bundler::Pipeline;
//! use kiln_config::{ConfigDiscovery, Mode};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigDiscovery::new(".").load(Some(Mode::Production))?;
//! let report = Pipeline::new(".", config).run().await?;
//! for artifact in &report.artifacts {
//!     println!("{} ({} bytes)", artifact.path, artifact.size);
//! }
//! # Ok(()) }
//! ```

pub mod bundle;
pub mod entry;
pub mod hooks;
pub mod output;
pub mod pipeline;
pub mod plugins;
pub mod registry;

use std::path::PathBuf;

use kiln_config::ConfigError;
use kiln_graph::GraphError;

pub use bundle::{BundleContext, EntryBundle, bundle_entries};
pub use entry::{EntryResolver, ResolvedEntries, ResolvedEntry};
pub use hooks::{Hook, HookContext, HookEvent, HookPipeline};
pub use output::{Artifact, ArtifactSet};
pub use pipeline::{ArtifactSummary, BuildReport, BuildState, CheckReport, Pipeline};

/// Error types for kiln builds.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or unsatisfiable configuration, including missing entries and
    /// colliding output paths.
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        hint: Option<String>,
    },

    /// A transform step failed for one source file.
    #[error("Transform failed for {}: {message}", file.display())]
    Transform { file: PathBuf, message: String },

    /// Import cycles were found and the cycle check is fatal.
    #[error("Circular dependencies detected:\n{}", cycles.join("\n"))]
    Cycle { cycles: Vec<String> },

    /// Reading sources or writing artifacts failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error reported by rolldown itself.
    #[error("Bundler error: {}", .0.join("; "))]
    Bundler(Vec<String>),
}

/// Result type alias for kiln-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            hint: None,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a bundler error from a rolldown diagnostic batch.
    pub fn from_rolldown_batch(error: &dyn std::fmt::Debug) -> Self {
        let rendered = format!("{error:?}");
        Error::Bundler(vec![rendered])
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Io(source) => Error::Io {
                path: PathBuf::from("."),
                source,
            },
            other => Error::Configuration {
                hint: other.hint(),
                message: other.to_string(),
            },
        }
    }
}

impl From<GraphError> for Error {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::Parse { path, message } => Error::Transform {
                file: path,
                message,
            },
            GraphError::Unresolved {
                specifier,
                importer,
                reason,
            } => Error::Transform {
                file: importer,
                message: format!("cannot resolve '{specifier}': {reason}"),
            },
            GraphError::Io { path, source } => Error::Io { path, source },
            other @ (GraphError::Entry { .. } | GraphError::InvalidPattern { .. }) => {
                Error::configuration(other.to_string())
            }
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Configuration { .. } => "kiln::config",
            Error::Transform { .. } => "kiln::transform",
            Error::Cycle { .. } => "kiln::cycle",
            Error::Io { .. } => "kiln::io",
            Error::Bundler(_) => "kiln::bundler",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Configuration { hint: Some(hint), .. } => Some(Box::new(hint.clone())),
            Error::Configuration { hint: None, .. } => Some(Box::new(
                "Check kiln.toml (or the \"kiln\" field of package.json)",
            )),
            Error::Transform { file, .. } => Some(Box::new(format!(
                "Fix the source file {} and rebuild",
                file.display()
            ))),
            Error::Cycle { .. } => Some(Box::new(
                "Break the cycle, narrow plugins.circular.include/exclude, \
                 or set plugins.circular.fail_on_error = false",
            )),
            Error::Io { .. } => Some(Box::new("Check file permissions and free disk space")),
            Error::Bundler(_) => None,
        }
    }
}
