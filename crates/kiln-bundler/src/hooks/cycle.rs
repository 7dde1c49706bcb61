use std::fs;
use std::path::PathBuf;

use kiln_graph::{CycleDetector, CycleScope};
use path_clean::PathClean;
use tracing::warn;

use super::{Hook, HookContext, HookEvent};
use crate::{Error, Result};

/// Fails (or warns about) import cycles once the graph is known.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleHook;

impl Hook for CycleHook {
    fn name(&self) -> &str {
        "circular-dependency"
    }

    fn events(&self) -> &'static [HookEvent] {
        &[HookEvent::Resolve]
    }

    fn run(&self, _event: HookEvent, ctx: &mut HookContext<'_>) -> Result<()> {
        let Some(graph) = ctx.graph else {
            return Ok(());
        };
        let options = &ctx.config.plugins.circular;

        let cwd = match &options.cwd {
            Some(cwd) => scope_dir(ctx.root.join(cwd)),
            None => ctx.root.to_path_buf(),
        };
        let scope = CycleScope::new(&cwd, options.include.as_deref(), options.exclude.as_deref())?;
        let cycles = CycleDetector::new(scope)
            .allow_async_cycles(options.allow_async_cycles)
            .detect(graph);

        if cycles.is_empty() {
            return Ok(());
        }

        let rendered: Vec<String> = cycles.iter().map(|c| c.format_chain(&cwd)).collect();
        if options.fail_on_error {
            return Err(Error::Cycle { cycles: rendered });
        }

        for cycle in rendered {
            warn!("circular dependency: {cycle}");
            ctx.warnings.push(format!("Circular dependency: {cycle}"));
        }
        Ok(())
    }
}

/// Module ids live under the canonical root, so the scope directory must too.
fn scope_dir(dir: PathBuf) -> PathBuf {
    fs::canonicalize(&dir).unwrap_or_else(|_| dir.clean())
}
