//! Per-entry rolldown builds.
//!
//! Every entry is bundled in isolation as an IIFE, so each script carries its
//! own copy of shared modules and only the host globals are shared. Builds run
//! concurrently, bounded by a semaphore, and are merged in entry order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_config::{Category, ExternalTable, KilnConfig, OutputTemplate, RuleSet};
use kiln_graph::{ModuleGraph, resolve_conditions, resolve_extensions, resolve_main_fields};
use rolldown::{
    BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, GlobalsOutputOption, InputItem,
    OutputFormat, Platform, RawMinifyOptions, ResolveOptions, SourceMapType,
};
use rolldown_common::Output;
use rustc_hash::FxHashMap;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info_span};

use crate::entry::{ResolvedEntries, ResolvedEntry};
use crate::plugins::{
    AssetPlugin, ExternalsPlugin, PluginRegistry, ScriptPlugin, StylePlugin, StyleProcessor,
};
use crate::registry::{AssetRegistry, FailureLog, StyleRegistry};
use crate::{Error, Result};

/// Everything the rolldown plugins of one build invocation share.
#[derive(Debug)]
pub struct BundleContext {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub rules: RuleSet,
    pub externals: ExternalTable,
    /// Request to global expression, for externals the graph actually uses
    pub globals: FxHashMap<String, String>,
    pub script_target: String,
    pub asset_template: OutputTemplate,
    pub public_path: String,
    pub minify_scripts: bool,
    pub sourcemap: bool,
    pub concurrency: usize,
    pub styles: StyleRegistry,
    pub assets: AssetRegistry,
    pub failures: FailureLog,
}

impl BundleContext {
    pub fn new(root: &Path, config: &KilnConfig) -> Result<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            output_dir: root.join(&config.output.dir),
            rules: RuleSet::compile(&config.rules)?,
            externals: ExternalTable::from_config(config),
            globals: FxHashMap::default(),
            script_target: config.script.target.clone(),
            asset_template: config.output.template(Category::Asset)?,
            public_path: config.output.public_path.clone(),
            minify_scripts: config.minify_scripts(),
            sourcemap: config.output.sourcemap,
            concurrency: num_cpus::get().min(8),
            styles: StyleRegistry::new(),
            assets: AssetRegistry::new(),
            failures: FailureLog::new(),
        })
    }

    /// Record globals for every external request present in `graph`.
    pub fn with_graph_globals(mut self, graph: &ModuleGraph) -> Self {
        for dependency in graph.externals() {
            if let Some(external) = self.externals.lookup(&dependency.specifier) {
                self.globals.insert(external.request, external.global);
            }
        }
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// The generated script of one entry.
#[derive(Debug, Clone)]
pub struct EntryBundle {
    pub name: String,
    /// Chunk code without any source map comment
    pub code: String,
    /// Source map JSON, relative to the output directory root
    pub map: Option<String>,
}

/// Bundle every entry and return the results in entry order.
///
/// # Errors
///
/// The error of the first failing entry (in entry order). A typed failure
/// recorded by a plugin takes precedence over rolldown's own diagnostics.
pub async fn bundle_entries(
    ctx: Arc<BundleContext>,
    processor: Arc<StyleProcessor>,
    entries: &ResolvedEntries,
) -> Result<Vec<EntryBundle>> {
    let script = Arc::new(ScriptPlugin::new(Arc::clone(&ctx))?);

    let mut join_set = JoinSet::new();
    let semaphore = Arc::new(Semaphore::new(ctx.concurrency.max(1)));

    for (index, entry) in entries.iter().enumerate() {
        let ctx = Arc::clone(&ctx);
        let processor = Arc::clone(&processor);
        let script = Arc::clone(&script);
        let semaphore = Arc::clone(&semaphore);
        let entry = entry.clone();
        let span = info_span!("bundle", entry = %entry.name);

        join_set.spawn(
            async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => build_entry(ctx, processor, script, entry).await,
                    Err(e) => Err(Error::Bundler(vec![format!("build scheduler closed: {e}")])),
                };
                (index, result)
            }
            .instrument(span),
        );
    }

    let mut bundles: Vec<Option<EntryBundle>> = vec![None; entries.len()];
    let mut failures: Vec<(usize, Error)> = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, Ok(bundle))) => bundles[index] = Some(bundle),
            Ok((index, Err(error))) => failures.push((index, error)),
            Err(join_error) => failures.push((
                usize::MAX,
                Error::Bundler(vec![format!("build task panicked: {join_error}")]),
            )),
        }
    }

    if !failures.is_empty() {
        if let Some(error) = ctx.failures.take() {
            return Err(error);
        }
        failures.sort_by_key(|(index, _)| *index);
        if let Some((_, error)) = failures.into_iter().next() {
            return Err(error);
        }
    }

    bundles
        .into_iter()
        .zip(entries.iter())
        .map(|(bundle, entry)| {
            bundle.ok_or_else(|| {
                Error::Bundler(vec![format!("entry '{}' produced no bundle", entry.name)])
            })
        })
        .collect()
}

async fn build_entry(
    ctx: Arc<BundleContext>,
    processor: Arc<StyleProcessor>,
    script: Arc<ScriptPlugin>,
    entry: ResolvedEntry,
) -> Result<EntryBundle> {
    let options = bundler_options(&ctx, &entry);

    let mut registry = PluginRegistry::new();
    registry.add(ExternalsPlugin::new(Arc::clone(&ctx)));
    registry.add(StylePlugin::new(Arc::clone(&ctx), processor));
    registry.add(AssetPlugin::new(Arc::clone(&ctx)));
    registry.add(ScriptPlugin::clone(&script));

    let mut bundler = RolldownBundlerBuilder::default()
        .with_options(options)
        .with_plugins(registry.into_rolldown_plugins())
        .build()
        .map_err(|e| Error::from_rolldown_batch(&e))?;

    let output = bundler
        .generate()
        .await
        .map_err(|e| Error::from_rolldown_batch(&e))?;

    let chunk = output
        .assets
        .iter()
        .find_map(|item| match item {
            Output::Chunk(chunk) if chunk.is_entry => Some(chunk),
            _ => None,
        })
        .ok_or_else(|| {
            Error::Bundler(vec![format!("rolldown produced no chunk for '{}'", entry.name)])
        })?;

    debug!(
        bytes = chunk.code.len(),
        warnings = output.warnings.len(),
        "bundled entry"
    );

    Ok(EntryBundle {
        name: entry.name.clone(),
        code: chunk.code.clone(),
        map: chunk.map.as_ref().map(|map| map.to_json_string()),
    })
}

fn bundler_options(ctx: &BundleContext, entry: &ResolvedEntry) -> BundlerOptions {
    let mut options = BundlerOptions {
        format: Some(OutputFormat::Iife),
        sourcemap: ctx.sourcemap.then_some(SourceMapType::Hidden),
        ..Default::default()
    };

    options.input = Some(vec![InputItem {
        name: Some(entry.name.clone()),
        import: entry.path.to_string_lossy().to_string(),
    }]);
    options.cwd = Some(ctx.root.clone());
    options.dir = Some(ctx.output_dir.to_string_lossy().to_string());
    options.platform = Some(Platform::Browser);
    options.inline_dynamic_imports = Some(true);
    options.resolve = Some(ResolveOptions {
        condition_names: Some(resolve_conditions()),
        extensions: Some(resolve_extensions()),
        main_fields: Some(resolve_main_fields()),
        symlinks: Some(true),
        ..Default::default()
    });

    if !ctx.globals.is_empty() {
        options.globals = Some(GlobalsOutputOption::from(ctx.globals.clone()));
    }
    if ctx.minify_scripts {
        options.minify = Some(RawMinifyOptions::from(true));
    }

    options
}
