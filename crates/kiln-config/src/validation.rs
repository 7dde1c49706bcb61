//! Pluggable config validation strategies
//!
//! Separates filesystem validation (entry existence) from schema validation
//! (patterns, templates, rule chains).

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};
use crate::output::Category;
use crate::rules::{RuleSet, compile_pattern};

/// Trait for pluggable config validation strategies
pub trait ConfigValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()>;
}

/// Schema-only validation (no filesystem checks)
///
/// # Example
///
/// ```
/// use kiln_config::{KilnConfig, SchemaValidator, ConfigValidator};
///
/// let mut config = KilnConfig::default();
/// config.entry.insert("main".into(), "src/js/main.js".into());
///
/// SchemaValidator.validate(&config).unwrap();
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()> {
        if config.entry.is_empty() {
            return Err(ConfigError::NoEntries);
        }

        for name in config.entry.keys() {
            if name.trim().is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(ConfigError::SchemaValidation {
                    message: format!("invalid entry name '{name}'"),
                    hint: Some("Entry names become file names; use plain identifiers".to_string()),
                });
            }
        }

        validate_templates(config)?;
        RuleSet::compile(&config.rules)?;
        validate_externals(config)?;

        let circular = &config.plugins.circular;
        if let Some(include) = &circular.include {
            compile_pattern("plugins.circular.include", include)?;
        }
        if let Some(exclude) = &circular.exclude {
            compile_pattern("plugins.circular.exclude", exclude)?;
        }

        let manifest = &config.plugins.manifest;
        if manifest.enabled
            && (manifest.output_filename.trim().is_empty()
                || manifest.output_filename.contains(['/', '\\']))
        {
            return Err(ConfigError::SchemaValidation {
                message: format!(
                    "invalid manifest filename '{}'",
                    manifest.output_filename
                ),
                hint: Some("Use a bare file name such as \"assets\"".to_string()),
            });
        }

        Ok(())
    }
}

fn validate_templates(config: &KilnConfig) -> Result<()> {
    let script = config.output.template(Category::Script)?;
    let style = config.output.template(Category::Style)?;
    let asset = config.output.template(Category::Asset)?;

    if config.entry.len() > 1 {
        for template in [&script, &style] {
            if !template.distinguishes_names() {
                return Err(ConfigError::TemplateCollision {
                    message: format!(
                        "'{template}' renders the same path for every entry ({} entries)",
                        config.entry.len()
                    ),
                });
            }
        }
    }

    if !asset.distinguishes_names() && !asset.has_content_hash() {
        return Err(ConfigError::TemplateCollision {
            message: format!("asset template '{asset}' renders the same path for every asset"),
        });
    }

    if script.as_str() == style.as_str() {
        return Err(ConfigError::TemplateCollision {
            message: format!("script and style templates are both '{script}'"),
        });
    }

    Ok(())
}

fn validate_externals(config: &KilnConfig) -> Result<()> {
    // Dotted JavaScript identifier path, e.g. `wp.blockEditor`
    let global = Regex::new(r"^[A-Za-z_$][\w$]*(\.[A-Za-z_$][\w$]*)*$")
        .map_err(|e| ConfigError::SchemaValidation {
            message: e.to_string(),
            hint: None,
        })?;

    for (request, expr) in &config.externals {
        if request.trim().is_empty() {
            return Err(ConfigError::SchemaValidation {
                message: "external request names cannot be empty".to_string(),
                hint: Some("Remove empty keys from [externals]".to_string()),
            });
        }
        if !global.is_match(expr) {
            return Err(ConfigError::SchemaValidation {
                message: format!("external '{request}' maps to '{expr}', which is not a global"),
                hint: Some("Use a dotted identifier such as wp.i18n".to_string()),
            });
        }
    }

    Ok(())
}

/// Filesystem validator (for CLI use)
///
/// Runs schema validation, then checks every entry points at an existing file.
pub struct FsValidator {
    root: PathBuf,
}

impl FsValidator {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ConfigValidator for FsValidator {
    fn validate(&self, config: &KilnConfig) -> Result<()> {
        SchemaValidator.validate(config)?;

        for (name, entry) in &config.entry {
            let path = self.root.join(entry);
            if !path.exists() {
                return Err(ConfigError::EntryNotFound {
                    name: name.clone(),
                    path,
                });
            }
            if !path.is_file() {
                return Err(ConfigError::EntryNotAFile {
                    name: name.clone(),
                    path,
                });
            }
        }

        Ok(())
    }
}

/// Convenience function for schema-only validation
pub fn validate_schema(config: &KilnConfig) -> Result<()> {
    SchemaValidator.validate(config)
}

/// Convenience function for filesystem validation
pub fn validate_fs(config: &KilnConfig, root: impl AsRef<Path>) -> Result<()> {
    FsValidator::new(root).validate(config)
}
