//! Packrat - Batch Project Archiver
//!
//! Packrat finds project directories directly under a root (a project is any
//! folder containing a marker subdirectory such as `Assets`) and writes each one
//! to `<root>/<name>.zip`.
//!
//! ## Pipeline
//!
//! For every project, in order:
//! - optionally remove cache folders (`Library`, `Temp`, ...) with [`prune_project`]
//! - archive the rest with [`archive_project`], never descending into excluded folders
//! - optionally delete the original tree, but only after the archive was written
//!   without any file failure and verified on disk
//!
//! Failures in one project are reported and the batch moves on.

pub mod archive;
pub mod config;
pub mod pipeline;
pub mod prompt;
pub mod prune;
pub mod report;
pub mod scanner;

// Re-export commonly used items
pub use archive::{archive_project, verify_archive, ArchiveReport, FileFailure};
pub use config::{ArchiveConfig, ExclusionSet};
pub use pipeline::{
    run_batch, run_project, DeletionOutcome, PipelineOptions, ProjectOutcome, RunSummary,
};
pub use prompt::{confirm_deletion, CONFIRM_TOKEN};
pub use prune::{prune_project, CleanupReport, FolderOutcome, FolderResult};
pub use report::{ConsoleReporter, NoopReporter, Reporter};
pub use scanner::{discover_projects, is_project, resolve_root, ProjectDirectory};
