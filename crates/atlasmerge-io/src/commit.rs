//! Outputs that only appear once they are complete.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::warn;

/// A file staged next to its destination.
///
/// Write to [`PendingOutput::path`], then [`commit`](PendingOutput::commit)
/// to rename it into place. Dropping an uncommitted output removes the
/// staged file.
#[derive(Debug)]
pub struct PendingOutput {
    staged: TempPath,
    destination: PathBuf,
}

impl PendingOutput {
    pub fn new<P: AsRef<Path>>(destination: P) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        let dir = parent_dir(&destination);

        // The writer picks gzip from the file name, so keep the suffix.
        let staged = tempfile::Builder::new()
            .prefix(".atlasmerge-")
            .suffix(&output_suffix(&destination))
            .tempfile_in(&dir)
            .with_context(|| format!("Failed to stage output in {}", dir.display()))?
            .into_temp_path();

        Ok(Self { staged, destination })
    }

    /// Where to write the content.
    pub fn path(&self) -> &Path {
        &self.staged
    }

    /// Move the staged file over the destination.
    pub fn commit(self) -> Result<PathBuf> {
        Ok(self.place()?.destination)
    }

    /// Rename into place, keeping any file it replaces until the caller
    /// drops the result.
    fn place(self) -> Result<Placed> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.staged, std::fs::Permissions::from_mode(0o644))
                .with_context(|| format!("Failed to set permissions on {}", self.staged.display()))?;
        }

        let destination = self.destination;
        let previous = if destination.is_file() {
            Some(set_aside(&destination)?)
        } else {
            None
        };

        if let Err(e) = self.staged.persist(&destination) {
            if let Some(previous) = previous {
                if let Err(restore) = previous.persist(&destination) {
                    warn!(path = %destination.display(), error = %restore.error, "could not restore previous file");
                }
            }
            return Err(e.error).with_context(|| format!("Failed to move output into {}", destination.display()));
        }
        Ok(Placed { destination, previous })
    }
}

/// Commit every output or none of them.
///
/// If a rename fails, outputs already moved into place are removed again
/// and the files they replaced are put back.
pub fn commit_all(outputs: Vec<PendingOutput>) -> Result<Vec<PathBuf>> {
    let mut placed: Vec<Placed> = Vec::with_capacity(outputs.len());
    for output in outputs {
        match output.place() {
            Ok(done) => placed.push(done),
            Err(err) => {
                for done in placed.into_iter().rev() {
                    let destination = done.destination.clone();
                    if let Err(undo) = done.undo() {
                        warn!(path = %destination.display(), error = %undo, "could not roll back output");
                    }
                }
                return Err(err);
            }
        }
    }
    // dropping `previous` deletes the replaced files
    Ok(placed.into_iter().map(|done| done.destination).collect())
}

/// An output renamed into place, with the file it replaced.
struct Placed {
    destination: PathBuf,
    previous: Option<TempPath>,
}

impl Placed {
    fn undo(self) -> Result<()> {
        match self.previous {
            Some(previous) => previous.persist(&self.destination).map_err(|e| e.error)?,
            None => std::fs::remove_file(&self.destination)?,
        }
        Ok(())
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Move an existing file to a hidden name in the same directory.
fn set_aside(path: &Path) -> Result<TempPath> {
    let dir = parent_dir(path);
    let previous = tempfile::Builder::new()
        .prefix(".atlasmerge-previous-")
        .tempfile_in(&dir)
        .with_context(|| format!("Failed to stage backup in {}", dir.display()))?
        .into_temp_path();
    std::fs::rename(path, &previous).with_context(|| format!("Failed to move aside {}", path.display()))?;
    Ok(previous)
}

fn output_suffix(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default();
    if name.ends_with(".nii.gz") {
        ".nii.gz".to_string()
    } else {
        path.extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }
}
