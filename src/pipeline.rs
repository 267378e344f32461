//! Per-project pipeline: optional cleanup, archive, then optional deletion.
//!
//! Projects are processed one at a time. Deleting an original tree only ever
//! happens after its archive has been written without any file failure and
//! verified on disk. If the process is interrupted mid-project, that project
//! may be left pruned or with a partial archive next to it; nothing attempts
//! to roll that back.

use crate::archive::{archive_project, ArchiveReport};
use crate::config::{ArchiveConfig, ExclusionSet};
use crate::prune::{prune_project, CleanupReport};
use crate::report::Reporter;
use crate::scanner::ProjectDirectory;

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Runtime settings for processing projects
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub clean: bool,
    pub delete_after: bool,
    pub prune_targets: Vec<String>,
    pub exclusions: ExclusionSet,
    /// Directory that receives `<name>.zip`
    pub output_dir: PathBuf,
}

impl PipelineOptions {
    /// Options that archive only, with folder lists taken from `config`
    pub fn new(config: &ArchiveConfig, output_dir: &Path) -> Self {
        PipelineOptions {
            clean: false,
            delete_after: false,
            prune_targets: config.prune_targets.clone(),
            exclusions: config.exclusions.clone(),
            output_dir: output_dir.to_path_buf(),
        }
    }
}

/// What happened to the original project tree
#[derive(Debug)]
pub enum DeletionOutcome {
    NotRequested,
    /// Deletion was requested but the archive did not succeed
    Skipped,
    Deleted,
    Failed(anyhow::Error),
}

/// Everything that happened to one project
#[derive(Debug)]
pub struct ProjectOutcome {
    pub project: ProjectDirectory,
    pub cleanup: Option<CleanupReport>,
    pub archive: ArchiveReport,
    pub deletion: DeletionOutcome,
}

impl ProjectOutcome {
    pub fn archived(&self) -> bool {
        self.archive.success()
    }

    pub fn deleted(&self) -> bool {
        matches!(self.deletion, DeletionOutcome::Deleted)
    }

    /// The archive failed, or the original could not be deleted after it succeeded
    pub fn has_issue(&self) -> bool {
        !self.archived() || matches!(self.deletion, DeletionOutcome::Failed(_))
    }
}

/// Run cleanup, archive and deletion for a single project
pub fn run_project(
    project: &ProjectDirectory,
    options: &PipelineOptions,
    reporter: &mut dyn Reporter,
) -> ProjectOutcome {
    let cleanup = if options.clean {
        reporter.cleanup_started(project, &options.prune_targets);
        let report = prune_project(project.path(), &options.prune_targets);
        reporter.cleanup_finished(project, &report);
        Some(report)
    } else {
        None
    };

    // Archive whatever is left, even if cleanup had failures
    let output = project.archive_path(&options.output_dir);
    let archive = archive_project(project.path(), &output, &options.exclusions, reporter);

    let deletion = if !options.delete_after {
        DeletionOutcome::NotRequested
    } else if !archive.success() {
        DeletionOutcome::Skipped
    } else {
        match delete_original(project, &archive.output) {
            Ok(()) => {
                reporter.project_deleted(project);
                DeletionOutcome::Deleted
            }
            Err(err) => {
                reporter.deletion_failed(project, &err);
                DeletionOutcome::Failed(err)
            }
        }
    };

    ProjectOutcome {
        project: project.clone(),
        cleanup,
        archive,
        deletion,
    }
}

fn delete_original(project: &ProjectDirectory, archive: &Path) -> anyhow::Result<()> {
    if archive.starts_with(project.path()) {
        anyhow::bail!(
            "archive {} lives inside the project, refusing to delete",
            archive.display()
        );
    }
    fs::remove_dir_all(project.path())?;
    Ok(())
}

/// Totals for a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<ProjectOutcome>,
    /// Projects whose processing panicked, with the panic message
    pub crashed: Vec<(ProjectDirectory, String)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len() + self.crashed.len()
    }

    pub fn archived_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.archived()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.archived()).count() + self.crashed.len()
    }

    pub fn deleted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.deleted()).count()
    }

    /// Names of projects that failed or could not be deleted
    pub fn projects_with_issues(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.has_issue())
            .map(|o| o.project.name())
            .chain(self.crashed.iter().map(|(p, _)| p.name()))
            .collect()
    }

    pub fn has_issues(&self) -> bool {
        !self.projects_with_issues().is_empty()
    }
}

/// Process every project in order. One project's failure, including a panic,
/// never stops the ones after it.
pub fn run_batch(
    projects: &[ProjectDirectory],
    options: &PipelineOptions,
    reporter: &mut dyn Reporter,
) -> RunSummary {
    let total = projects.len();
    let mut summary = RunSummary::default();

    for (index, project) in projects.iter().enumerate() {
        reporter.project_started(index + 1, total, project);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            run_project(project, options, &mut *reporter)
        }));

        match result {
            Ok(outcome) => {
                reporter.project_finished(&outcome);
                summary.outcomes.push(outcome);
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                reporter.project_crashed(project, &message);
                summary.crashed.push((project.clone(), message));
            }
        }
    }

    summary
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
