//! Dependency manifest: which host scripts each entry needs, and a version
//! derived from the script's bytes.

use std::collections::{BTreeMap, BTreeSet};

use kiln_config::{Category, DEFAULT_HASH_LENGTH, ExternalTable, ManifestFormat, content_hash};
use serde::Serialize;
use tracing::debug;

use super::{Hook, HookContext, HookEvent};
use crate::output::Artifact;
use crate::{Error, Result};

const POLYFILL_HANDLE: &str = "wp-polyfill";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRecord {
    pub dependencies: Vec<String>,
    pub version: String,
}

/// Emits `assets.php` (or one `*.asset.php` per script) during `emit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestHook;

impl Hook for ManifestHook {
    fn name(&self) -> &str {
        "dependency-manifest"
    }

    fn events(&self) -> &'static [HookEvent] {
        &[HookEvent::Emit]
    }

    fn run(&self, _event: HookEvent, ctx: &mut HookContext<'_>) -> Result<()> {
        let Some(graph) = ctx.graph else {
            return Ok(());
        };
        let options = &ctx.config.plugins.manifest;
        let table = ExternalTable::from_config(ctx.config);

        let mut records: BTreeMap<String, ManifestRecord> = BTreeMap::new();
        for entry in ctx.entries.iter() {
            let script = ctx.artifacts.script_for(&entry.name).ok_or_else(|| {
                Error::configuration(format!("entry '{}' produced no script", entry.name))
            })?;

            let mut handles: BTreeSet<String> = graph
                .externals_for(&entry.name)
                .iter()
                .filter_map(|request| table.lookup(request))
                .map(|external| external.handle)
                .collect();
            if options.inject_polyfill {
                handles.insert(POLYFILL_HANDLE.to_string());
            }

            records.insert(
                script.path.clone(),
                ManifestRecord {
                    dependencies: handles.into_iter().collect(),
                    version: content_hash(&script.bytes, DEFAULT_HASH_LENGTH),
                },
            );
        }

        if options.combine_assets {
            let bytes = render(options.format, &records)?;
            debug!(entries = records.len(), "combined manifest");
            ctx.artifacts
                .insert(Artifact::new(Category::Auxiliary, options.combined_filename(), bytes))?;
        } else {
            for (script_path, record) in &records {
                let stem = script_path.strip_suffix(".js").unwrap_or(script_path);
                let path = format!("{stem}.asset.{}", options.format.extension());
                let bytes = render_record(options.format, record)?;
                ctx.artifacts
                    .insert(Artifact::new(Category::Auxiliary, path, bytes))?;
            }
        }

        Ok(())
    }
}

fn render(format: ManifestFormat, records: &BTreeMap<String, ManifestRecord>) -> Result<Vec<u8>> {
    match format {
        ManifestFormat::Php => {
            let body = records
                .iter()
                .map(|(path, record)| format!("{} => {}", php_string(path), php_record(record)))
                .collect::<Vec<_>>()
                .join(", ");
            Ok(format!("<?php return array({body});").into_bytes())
        }
        ManifestFormat::Json => json(records),
    }
}

fn render_record(format: ManifestFormat, record: &ManifestRecord) -> Result<Vec<u8>> {
    match format {
        ManifestFormat::Php => Ok(render_php(record).into_bytes()),
        ManifestFormat::Json => json(record),
    }
}

/// The host's PHP manifest for a single script.
pub fn render_php(record: &ManifestRecord) -> String {
    format!("<?php return {};", php_record(record))
}

fn php_record(record: &ManifestRecord) -> String {
    let deps = record
        .dependencies
        .iter()
        .map(|d| php_string(d))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "array('dependencies' => array({deps}), 'version' => {})",
        php_string(&record.version)
    )
}

fn php_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::Bundler(vec![format!("manifest: {e}")]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(deps: &[&str]) -> ManifestRecord {
        ManifestRecord {
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            version: "0123456789abcdef0123".to_string(),
        }
    }

    #[test]
    fn php_single_record() {
        assert_eq!(
            render_php(&record(&["wp-i18n", "wp-polyfill"])),
            "<?php return array('dependencies' => array('wp-i18n', 'wp-polyfill'), 'version' => '0123456789abcdef0123');"
        );
    }

    #[test]
    fn php_combined_is_keyed_by_script() {
        let mut records = BTreeMap::new();
        records.insert("js/main.js".to_string(), record(&[]));
        let php = String::from_utf8(render(ManifestFormat::Php, &records).unwrap()).unwrap();
        assert_eq!(
            php,
            "<?php return array('js/main.js' => array('dependencies' => array(), 'version' => '0123456789abcdef0123'));"
        );
    }

    #[test]
    fn php_strings_are_escaped() {
        assert_eq!(php_string(r"it's\"), r"'it\'s\\'");
    }

    #[test]
    fn json_combined() {
        let mut records = BTreeMap::new();
        records.insert("js/main.js".to_string(), record(&["wp-hooks"]));
        let value: serde_json::Value =
            serde_json::from_slice(&render(ManifestFormat::Json, &records).unwrap()).unwrap();
        assert_eq!(value["js/main.js"]["dependencies"][0], "wp-hooks");
        assert_eq!(value["js/main.js"]["version"], "0123456789abcdef0123");
    }
}
