use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use super::{Hook, HookContext, HookEvent};
use crate::{Error, Result};

/// Removes outputs of earlier builds that this build no longer produces.
///
/// Runs only when the config cleans stale outputs (production by default).
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanHook;

impl Hook for CleanHook {
    fn name(&self) -> &str {
        "clean-stale-outputs"
    }

    fn events(&self) -> &'static [HookEvent] {
        &[HookEvent::Emit]
    }

    fn run(&self, _event: HookEvent, ctx: &mut HookContext<'_>) -> Result<()> {
        if !ctx.config.cleans_stale_outputs() {
            debug!(mode = %ctx.config.mode, "keeping previous outputs");
            return Ok(());
        }

        let output_dir = ctx.output_dir;
        if output_dir == ctx.root || !output_dir.starts_with(ctx.root) {
            return Err(Error::Configuration {
                message: format!(
                    "refusing to clean '{}': it is not a directory inside the project",
                    output_dir.display()
                ),
                hint: Some("Point output.dir at a dedicated build directory".to_string()),
            });
        }
        if !output_dir.is_dir() {
            return Ok(());
        }

        let mut stale = Vec::new();
        for entry in WalkDir::new(output_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| walk_error(output_dir, e))?;
            if !entry.file_type().is_file() && !entry.file_type().is_symlink() {
                continue;
            }
            let Some(relative) = relative_path(output_dir, entry.path()) else {
                continue;
            };
            if !ctx.artifacts.contains(&relative) {
                stale.push((relative, entry.into_path()));
            }
        }

        for (relative, path) in stale {
            fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
            info!(path = %relative, "removed stale output");
            ctx.removed.push(relative);
        }

        prune_empty_dirs(output_dir)
    }
}

fn relative_path(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(parts.join("/"))
}

fn prune_empty_dirs(output_dir: &Path) -> Result<()> {
    for entry in WalkDir::new(output_dir).min_depth(1).contents_first(true) {
        let entry = entry.map_err(|e| walk_error(output_dir, e))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let is_empty = fs::read_dir(entry.path())
            .map_err(|e| Error::io(entry.path(), e))?
            .next()
            .is_none();
        if is_empty {
            fs::remove_dir(entry.path()).map_err(|e| Error::io(entry.path(), e))?;
        }
    }
    Ok(())
}

fn walk_error(output_dir: &Path, error: walkdir::Error) -> Error {
    let path = error
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_dir.to_path_buf());
    let source = error
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
    Error::io(path, source)
}
