pub mod config;
pub mod discovery;
pub mod error;
pub mod externals;
mod helpers;
pub mod output;
pub mod plugins;
pub mod rules;
pub mod validation;

// Re-export main types
pub use config::*;
pub use error::*;
pub use externals::{External, ExternalTable};
pub use output::{Category, DEFAULT_HASH_LENGTH, OutputOptions, OutputTemplate, content_hash};
pub use plugins::{CircularOptions, CleanOptions, ManifestFormat, ManifestOptions, PluginsOptions};
pub use rules::{CompiledRule, Rule, RuleKind, RuleSet, TransformStep};

// Re-export discovery and validation
pub use discovery::{ConfigDiscovery, ConfigSource, discover};
pub use validation::{ConfigValidator, FsValidator, SchemaValidator, validate_fs, validate_schema};
