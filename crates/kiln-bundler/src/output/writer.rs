//! Atomic artifact writing.
//!
//! Every artifact is first written to a `<file>.tmp` sibling; only when all
//! temporaries exist are they renamed into place. If any step fails, the
//! temporaries are removed and the previous build output stays untouched.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::{debug, warn};

use super::ArtifactSet;
use crate::{Error, Result};

/// Write `artifacts` below `dir`, creating directories as needed.
///
/// Returns the absolute paths written, in artifact path order.
///
/// # Errors
///
/// - `Error::Configuration` if an artifact path escapes `dir`
/// - `Error::Io` if a directory, temporary file or rename fails
pub fn write_artifacts(artifacts: &ArtifactSet, dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = dir.clean();
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

    let mut operations = Vec::with_capacity(artifacts.len());
    for artifact in artifacts.iter() {
        let target = validate_output_path(&dir, &artifact.path)?;
        operations.push((target, artifact.bytes.as_slice()));
    }

    write_files_atomic(&operations)?;
    debug!(count = operations.len(), dir = %dir.display(), "artifacts written");

    Ok(operations.into_iter().map(|(path, _)| path).collect())
}

/// Resolve `filename` under `base_dir`, rejecting anything that escapes it.
pub(crate) fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(Error::configuration(format!(
            "output path '{}' contains a null byte",
            filename.replace('\0', "\\0")
        )));
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();

    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(Error::Configuration {
            message: format!(
                "output path '{filename}' escapes the output directory '{}'",
                base_dir.display()
            ),
            hint: Some("Output templates must stay inside output.dir".to_string()),
        });
    }

    Ok(full_path)
}

fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut temp_files: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(operations.len());

    // Phase 1: temporaries
    for (target, content) in operations {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                cleanup_temp_files(&temp_files);
                Error::io(parent, e)
            })?;
        }

        let temp = temp_path_for(target);
        fs::write(&temp, content).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::io(&temp, e)
        })?;

        temp_files.push((temp, target.clone()));
    }

    // Phase 2: rename into place
    for (temp, target) in &temp_files {
        fs::rename(temp, target).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::io(target, e)
        })?;
    }

    Ok(())
}

fn cleanup_temp_files(temp_files: &[(PathBuf, PathBuf)]) {
    for (temp, _) in temp_files {
        if temp.exists() {
            if let Err(e) = fs::remove_file(temp) {
                warn!(path = %temp.display(), "failed to remove temporary file: {e}");
            }
        }
    }
}
