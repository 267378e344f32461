//! Progress reporting for the archive pipeline.
//!
//! The pipeline calls into a [`Reporter`] at each step but never reads
//! anything back from it, so a run behaves the same with or without console
//! output. [`ConsoleReporter`] is what the binary uses; [`NoopReporter`] keeps
//! library callers and tests quiet.

use crate::archive::ArchiveReport;
use crate::pipeline::{ProjectOutcome, RunSummary};
use crate::prune::{CleanupReport, FolderOutcome};
use crate::scanner::ProjectDirectory;

use colored::Colorize;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Observer for pipeline progress. Every method has a no-op default.
pub trait Reporter {
    fn project_started(&mut self, _index: usize, _total: usize, _project: &ProjectDirectory) {}

    fn cleanup_started(&mut self, _project: &ProjectDirectory, _targets: &[String]) {}

    fn cleanup_finished(&mut self, _project: &ProjectDirectory, _report: &CleanupReport) {}

    fn archive_started(&mut self, _project_dir: &Path, _output: &Path) {}

    /// Called before a file is opened and added under `entry_name`
    fn file_started(&mut self, _entry_name: &str, _path: &Path) {}

    fn file_failed(&mut self, _path: &Path, _error: &anyhow::Error) {}

    /// Called once the container is closed, before it is verified
    fn archive_closed(&mut self, _output: &Path) {}

    fn archive_finished(&mut self, _report: &ArchiveReport) {}

    fn project_deleted(&mut self, _project: &ProjectDirectory) {}

    fn deletion_failed(&mut self, _project: &ProjectDirectory, _error: &anyhow::Error) {}

    fn project_finished(&mut self, _outcome: &ProjectOutcome) {}

    /// Processing of a project panicked; the batch moves on
    fn project_crashed(&mut self, _project: &ProjectDirectory, _message: &str) {}
}

/// Reporter that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {}

/// Console narration with a spinner while archiving
pub struct ConsoleReporter {
    verbose: bool,
    spinner: Option<ProgressBar>,
    files_seen: u64,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        ConsoleReporter {
            verbose,
            spinner: None,
            files_seen: 0,
        }
    }

    /// Print a line without tearing an active spinner
    fn out(&self, line: String) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| println!("{}", line)),
            None => println!("{}", line),
        }
    }

    fn warn(&self, line: String) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn project_started(&mut self, index: usize, total: usize, project: &ProjectDirectory) {
        println!();
        println!(
            "{}",
            format!("[{}/{}] Processing project: {}", index, total, project.name()).bold()
        );
    }

    fn cleanup_started(&mut self, _project: &ProjectDirectory, _targets: &[String]) {
        println!("Starting cache cleanup...");
    }

    fn cleanup_finished(&mut self, _project: &ProjectDirectory, report: &CleanupReport) {
        if report.nothing_to_clean() {
            println!("No cache folders to clean.");
            return;
        }

        for folder in &report.folders {
            match &folder.outcome {
                FolderOutcome::Absent => {}
                FolderOutcome::Removed => println!("Deleted: {}", folder.name),
                FolderOutcome::Failed(err) => {
                    eprintln!("Warning: Could not delete {}: {:#}", folder.name, err)
                }
            }
        }

        if !report.success() {
            eprintln!(
                "{}",
                "Cache cleanup had issues, but proceeding with archive...".yellow()
            );
        }
        println!("Cache cleanup finished.");
    }

    fn archive_started(&mut self, project_dir: &Path, _output: &Path) {
        let name = project_dir
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(format!("Archiving {}...", name));

        self.files_seen = 0;
        self.spinner = Some(spinner);
    }

    fn file_started(&mut self, entry_name: &str, _path: &Path) {
        self.files_seen += 1;
        if self.verbose {
            self.out(format!("  adding {}", entry_name));
        }
        if let Some(spinner) = &self.spinner {
            if self.files_seen % 100 == 0 {
                spinner.set_message(format!("Archiving: {} files added", self.files_seen));
            }
        }
    }

    fn file_failed(&mut self, path: &Path, error: &anyhow::Error) {
        self.warn(format!(
            "Warning: Could not add {}: {:#}",
            path.display(),
            error
        ));
    }

    fn archive_finished(&mut self, report: &ArchiveReport) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }

        if let Some(err) = &report.container_error {
            eprintln!("Error: {:#}", err);
        }

        if report.success() {
            let size = report.archive_size.unwrap_or(0);
            println!(
                "{}",
                format!(
                    "Done: {} created successfully ({} files, {}).",
                    report.output.display(),
                    report.entries.len(),
                    format_size(size, BINARY)
                )
                .green()
            );
        } else {
            let reason = if report.container_error.is_some() {
                "archive could not be written".to_string()
            } else if !report.verified() {
                "archive is missing or empty".to_string()
            } else {
                format!("{} file(s) could not be added", report.failure_count())
            };
            eprintln!(
                "{}",
                format!(
                    "Failed to archive completely: {} ({})",
                    report.output.display(),
                    reason
                )
                .red()
            );
        }
    }

    fn project_deleted(&mut self, project: &ProjectDirectory) {
        println!("Deleted original directory: {}", project.path().display());
    }

    fn deletion_failed(&mut self, project: &ProjectDirectory, error: &anyhow::Error) {
        eprintln!(
            "Warning: Could not delete {}: {:#}",
            project.path().display(),
            error
        );
    }

    fn project_crashed(&mut self, project: &ProjectDirectory, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        eprintln!(
            "{}",
            format!("Unexpected failure while processing {}: {}", project.name(), message).red()
        );
    }
}

/// Print the end-of-run totals
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("========================================");
    println!(
        "Projects: {}  Archived: {}  Failed: {}",
        summary.total(),
        summary.archived_count(),
        summary.failed_count()
    );
    if summary.deleted_count() > 0 {
        println!("Originals deleted: {}", summary.deleted_count());
    }

    let issues = summary.projects_with_issues();
    if issues.is_empty() {
        println!("{}", "Processing complete!".bold().green());
    } else {
        println!("{}", "Processing complete with issues:".bold().red());
        for name in issues {
            println!("  - {}", name);
        }
    }
}
