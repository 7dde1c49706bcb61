//! The build pipeline and its state machine.
//!
//! ```text
//! Configuring ──> Building ──> Done
//!      │              │
//!      └──────────────┴──────> Failed
//! ```
//!
//! Any error moves the pipeline straight to `Failed`. There are no retries.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kiln_config::{Category, ConfigValidator, ExternalTable, FsValidator, KilnConfig, Mode};
use kiln_graph::{GraphBuilder, ModuleGraph};
use path_clean::PathClean;
use tracing::{debug, info};

use crate::bundle::{BundleContext, bundle_entries};
use crate::entry::{EntryResolver, ResolvedEntries};
use crate::hooks::{Hook, HookContext, HookEvent, HookPipeline};
use crate::output::{self, ArtifactSet, write_artifacts};
use crate::plugins::StyleProcessor;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Configuring,
    Building,
    Done,
    Failed,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildState::Configuring => "configuring",
            BuildState::Building => "building",
            BuildState::Done => "done",
            BuildState::Failed => "failed",
        })
    }
}

/// One written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSummary {
    /// Relative to the output directory
    pub path: String,
    pub category: Category,
    pub size: usize,
    pub entry: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub mode: Mode,
    pub output_dir: PathBuf,
    /// In path order
    pub artifacts: Vec<ArtifactSummary>,
    /// Stale outputs deleted by the cleaner
    pub removed: Vec<String>,
    pub warnings: Vec<String>,
    pub duration: Duration,
}

/// Result of a dry run: entries, graph and cycle check, nothing written.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub mode: Mode,
    pub entries: Vec<String>,
    pub modules: usize,
    /// External requests the graph uses, sorted
    pub externals: Vec<String>,
    pub warnings: Vec<String>,
}

/// Mutable state shared by every hook dispatch of one run.
#[derive(Default)]
struct HookState {
    artifacts: ArtifactSet,
    warnings: Vec<String>,
    removed: Vec<String>,
}

/// Paths fixed at the start of a run.
struct Layout {
    root: PathBuf,
    output_dir: PathBuf,
    entries: ResolvedEntries,
}

pub struct Pipeline {
    root: PathBuf,
    config: KilnConfig,
    hooks: HookPipeline,
    state: BuildState,
    concurrency: Option<usize>,
}

impl Pipeline {
    /// A pipeline with the built-in hooks `config` enables.
    pub fn new(root: impl AsRef<Path>, config: KilnConfig) -> Self {
        let hooks = HookPipeline::with_builtins(&config);
        Self {
            root: root.as_ref().to_path_buf(),
            config,
            hooks,
            state: BuildState::Configuring,
            concurrency: None,
        }
    }

    /// Append a hook; it runs after the built-in hooks.
    pub fn register_hook(&mut self, hook: impl Hook + 'static) -> &mut Self {
        self.hooks.register(hook);
        self
    }

    /// Limit how many entries are bundled at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency.max(1));
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn config(&self) -> &KilnConfig {
        &self.config
    }

    /// Run a full build and write its artifacts.
    ///
    /// # Errors
    ///
    /// The first error of any stage. Nothing is written unless every entry
    /// bundled and every `emit` hook succeeded.
    pub async fn run(&mut self) -> Result<BuildReport> {
        self.state = BuildState::Configuring;
        let result = self.execute().await;
        self.finish(&result);
        result
    }

    /// Resolve entries, crawl the graph and run the `configure` and
    /// `resolve` hooks without bundling or writing.
    pub fn check(&mut self) -> Result<CheckReport> {
        self.state = BuildState::Configuring;
        let result = self.execute_check();
        self.finish(&result);
        result
    }

    fn finish<T>(&mut self, result: &Result<T>) {
        self.state = match result {
            Ok(_) => BuildState::Done,
            Err(_) => BuildState::Failed,
        };
        debug!(state = %self.state, "pipeline finished");
    }

    fn configure(&self, hooks: &mut HookState) -> Result<Layout> {
        let root = self
            .root
            .canonicalize()
            .map_err(|e| Error::io(&self.root, e))?;
        FsValidator::new(&root).validate(&self.config)?;
        let entries = EntryResolver::new(&root).resolve(&self.config)?;
        let output_dir = root.join(&self.config.output.dir).clean();

        let layout = Layout {
            root,
            output_dir,
            entries,
        };
        self.dispatch(HookEvent::Configure, &layout, None, hooks)?;
        Ok(layout)
    }

    fn resolve(&self, layout: &Layout, hooks: &mut HookState) -> Result<ModuleGraph> {
        let table = ExternalTable::from_config(&self.config);
        let graph = GraphBuilder::new()
            .with_external_filter(|request| table.is_external(request))
            .build(&layout.entries.as_pairs())?;
        debug!(
            modules = graph.len(),
            externals = graph.externals().count(),
            "module graph built"
        );

        self.dispatch(HookEvent::Resolve, layout, Some(&graph), hooks)?;
        Ok(graph)
    }

    async fn execute(&mut self) -> Result<BuildReport> {
        let started = Instant::now();
        let mut hooks = HookState::default();

        let layout = self.configure(&mut hooks)?;
        self.state = BuildState::Building;
        info!(
            mode = %self.config.mode,
            entries = layout.entries.len(),
            "building"
        );

        let graph = self.resolve(&layout, &mut hooks)?;

        let mut ctx = BundleContext::new(&layout.root, &self.config)?.with_graph_globals(&graph);
        if let Some(concurrency) = self.concurrency {
            ctx = ctx.with_concurrency(concurrency);
        }
        let ctx = Arc::new(ctx);
        let load_paths = self
            .config
            .style
            .load_paths
            .iter()
            .map(|p| layout.root.join(p))
            .collect();
        let processor = Arc::new(StyleProcessor::new(&self.config.style.browsers, load_paths)?);

        let bundles = bundle_entries(Arc::clone(&ctx), Arc::clone(&processor), &layout.entries).await?;
        hooks.artifacts = output::assemble(&ctx, &self.config, &graph, &bundles, &processor)?;

        self.dispatch(HookEvent::Emit, &layout, Some(&graph), &mut hooks)?;

        write_artifacts(&hooks.artifacts, &layout.output_dir)?;
        for artifact in hooks.artifacts.iter() {
            info!(path = %artifact.path, size = artifact.size(), "wrote");
        }

        self.dispatch(HookEvent::Complete, &layout, Some(&graph), &mut hooks)?;

        Ok(BuildReport {
            mode: self.config.mode,
            output_dir: layout.output_dir,
            artifacts: hooks
                .artifacts
                .iter()
                .map(|a| ArtifactSummary {
                    path: a.path.clone(),
                    category: a.category,
                    size: a.size(),
                    entry: a.entry.clone(),
                })
                .collect(),
            removed: hooks.removed,
            warnings: hooks.warnings,
            duration: started.elapsed(),
        })
    }

    fn execute_check(&mut self) -> Result<CheckReport> {
        let mut hooks = HookState::default();
        let layout = self.configure(&mut hooks)?;
        self.state = BuildState::Building;
        let graph = self.resolve(&layout, &mut hooks)?;

        Ok(CheckReport {
            mode: self.config.mode,
            entries: layout.entries.iter().map(|e| e.name.clone()).collect(),
            modules: graph.len(),
            externals: graph.externals().map(|e| e.specifier.clone()).collect(),
            warnings: hooks.warnings,
        })
    }

    fn dispatch(
        &self,
        event: HookEvent,
        layout: &Layout,
        graph: Option<&ModuleGraph>,
        hooks: &mut HookState,
    ) -> Result<()> {
        let mut ctx = HookContext {
            root: &layout.root,
            config: &self.config,
            output_dir: &layout.output_dir,
            entries: &layout.entries,
            graph,
            artifacts: &mut hooks.artifacts,
            warnings: &mut hooks.warnings,
            removed: &mut hooks.removed,
        };
        self.hooks.dispatch(event, &mut ctx)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("root", &self.root)
            .field("mode", &self.config.mode)
            .field("hooks", &self.hooks)
            .field("state", &self.state)
            .finish()
    }
}
