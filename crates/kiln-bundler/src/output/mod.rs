//! Output assembly: turns bundles, extracted styles and emitted files into
//! one [`ArtifactSet`], then writes it.

mod artifact;
pub mod sourcemap;
pub mod writer;

pub use artifact::{Artifact, ArtifactSet};
pub use writer::write_artifacts;

use kiln_config::{Category, KilnConfig};
use kiln_graph::ModuleGraph;
use tracing::{debug, warn};

use crate::bundle::{BundleContext, EntryBundle};
use crate::plugins::StyleProcessor;
use crate::{Error, Result};

/// Collect every artifact of a build.
///
/// Per entry: the script (plus its map), then the stylesheet extracted from
/// the styles the entry imports, in import order. Files emitted by the asset
/// plugin are added last.
pub fn assemble(
    ctx: &BundleContext,
    config: &KilnConfig,
    graph: &ModuleGraph,
    bundles: &[EntryBundle],
    processor: &StyleProcessor,
) -> Result<ArtifactSet> {
    let script_template = config.output.template(Category::Script)?;
    let style_template = config.output.template(Category::Style)?;
    let mut artifacts = ArtifactSet::new();

    for bundle in bundles {
        let mut code = bundle.code.clone();
        if !code.ends_with('\n') {
            code.push('\n');
        }
        let script_path = script_template.render(&bundle.name, ".js", code.as_bytes());

        if let Some(map) = &bundle.map {
            let relocated = sourcemap::relocate(map, &script_path).map_err(|message| {
                Error::Bundler(vec![format!(
                    "invalid source map for entry '{}': {message}",
                    bundle.name
                )])
            })?;
            code.push_str(&sourcemap::mapping_comment(&script_path));
            artifacts.insert(
                Artifact::new(
                    Category::Auxiliary,
                    format!("{script_path}.map"),
                    relocated.into_bytes(),
                )
                .for_entry(&bundle.name),
            )?;
        }

        artifacts.insert(
            Artifact::new(Category::Script, script_path, code.into_bytes()).for_entry(&bundle.name),
        )?;

        if let Some(css) = extract_styles(ctx, graph, &bundle.name) {
            let css = if config.minify_styles() {
                let filename = style_template.render(&bundle.name, ".css", css.as_bytes());
                processor
                    .minify(&filename, &css)
                    .map_err(|message| Error::Transform {
                        file: filename.into(),
                        message,
                    })?
            } else {
                css
            };
            let style_path = style_template.render(&bundle.name, ".css", css.as_bytes());
            artifacts.insert(
                Artifact::new(Category::Style, style_path, css.into_bytes())
                    .for_entry(&bundle.name),
            )?;
        }
    }

    for (path, asset) in ctx.assets.snapshot() {
        debug!(%path, source = %asset.source.display(), "asset");
        artifacts.insert(Artifact::new(Category::Asset, path, asset.bytes.to_vec()))?;
    }

    Ok(artifacts)
}

/// Concatenated CSS of every stylesheet `entry` reaches; `None` when empty.
fn extract_styles(ctx: &BundleContext, graph: &ModuleGraph, entry: &str) -> Option<String> {
    let mut css = String::new();
    for module in graph.styles_for(entry) {
        match ctx.styles.get(module) {
            Some(compiled) => {
                let compiled = compiled.trim_end();
                if compiled.is_empty() {
                    continue;
                }
                css.push_str(compiled);
                css.push('\n');
            }
            None => warn!(%entry, module = %module, "stylesheet was never loaded by the bundler"),
        }
    }
    (!css.is_empty()).then_some(css)
}
