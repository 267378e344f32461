//! Removal of cache folders from a project before archiving.

use crate::config::is_bare_name;

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What happened to one target folder
#[derive(Debug)]
pub enum FolderOutcome {
    /// Nothing by that name under the project
    Absent,
    Removed,
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct FolderResult {
    pub name: String,
    pub path: PathBuf,
    pub outcome: FolderOutcome,
}

/// Per-folder outcomes of one cleanup, in target order
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub folders: Vec<FolderResult>,
}

impl CleanupReport {
    /// True when no target folder was present
    pub fn nothing_to_clean(&self) -> bool {
        self.folders
            .iter()
            .all(|f| matches!(f.outcome, FolderOutcome::Absent))
    }

    pub fn removed(&self) -> impl Iterator<Item = &FolderResult> {
        self.folders
            .iter()
            .filter(|f| matches!(f.outcome, FolderOutcome::Removed))
    }

    pub fn failures(&self) -> impl Iterator<Item = &FolderResult> {
        self.folders
            .iter()
            .filter(|f| matches!(f.outcome, FolderOutcome::Failed(_)))
    }

    /// True if every present folder was removed (or none were present)
    pub fn success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Remove each target folder found directly under `project_dir`.
///
/// A failure on one folder is recorded and the rest are still attempted.
pub fn prune_project(project_dir: &Path, targets: &[String]) -> CleanupReport {
    let mut report = CleanupReport::default();

    for name in targets {
        if !is_bare_name(name) {
            report.folders.push(FolderResult {
                name: name.clone(),
                path: project_dir.to_path_buf(),
                outcome: FolderOutcome::Failed(anyhow!(
                    "Refusing to remove '{}': not a bare folder name",
                    name
                )),
            });
            continue;
        }

        let path = project_dir.join(name);
        let outcome = match fs::symlink_metadata(&path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => FolderOutcome::Absent,
            Err(err) => FolderOutcome::Failed(
                anyhow::Error::new(err).context(format!("Could not inspect {}", path.display())),
            ),
            Ok(metadata) => match remove_target(&path, &metadata) {
                Ok(()) => FolderOutcome::Removed,
                Err(err) => FolderOutcome::Failed(err),
            },
        };

        report.folders.push(FolderResult {
            name: name.clone(),
            path,
            outcome,
        });
    }

    report
}

fn remove_target(path: &Path, metadata: &fs::Metadata) -> Result<()> {
    // Unlink symlinks instead of following them out of the project
    if metadata.is_symlink() {
        return fs::remove_file(path)
            .with_context(|| format!("Failed to remove symlink {}", path.display()));
    }

    if !metadata.is_dir() {
        anyhow::bail!("{} is not a directory", path.display());
    }

    fs::remove_dir_all(path).with_context(|| format!("Failed to remove {}", path.display()))
}
