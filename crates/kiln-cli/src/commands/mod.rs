//! Command implementations.

pub mod build;
pub mod check;

use std::path::PathBuf;

use kiln_config::{ConfigDiscovery, KilnConfig};
use tracing::debug;

use crate::cli::ProjectArgs;
use crate::error::{CliError, Result};

/// Project root and its configuration, with the mode applied.
pub(crate) fn load_project(args: &ProjectArgs) -> Result<(PathBuf, KilnConfig)> {
    let root = match &args.cwd {
        Some(cwd) if cwd.is_dir() => cwd.clone(),
        Some(cwd) => {
            return Err(CliError::InvalidArgument(format!(
                "--cwd '{}' is not a directory",
                cwd.display()
            )));
        }
        None => std::env::current_dir()?,
    };

    let discovery = ConfigDiscovery::new(&root);
    let mode = args.mode.map(Into::into);
    let config = match &args.config {
        Some(path) => discovery.load_file(root.join(path), mode)?,
        None => discovery.load(mode)?,
    };

    debug!(root = %root.display(), mode = %config.mode, "project loaded");
    Ok((root, config))
}
