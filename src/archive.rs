//! Writing a project tree into a zip archive.
//!
//! Excluded folders are dropped from the walk before it descends into them,
//! so nothing under them is opened or reported. A file that cannot be added
//! is recorded and the walk moves on; the archive only counts as successful
//! when every file made it in and the finished archive is non-empty on disk.

use crate::config::ExclusionSet;
use crate::report::Reporter;

use anyhow::{anyhow, Context, Result};
use ignore::WalkBuilder;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A file (or directory) that could not be added
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

/// Result of archiving one project
#[derive(Debug)]
pub struct ArchiveReport {
    pub output: PathBuf,
    /// Entry names written, in walk order
    pub entries: Vec<String>,
    pub failures: Vec<FileFailure>,
    /// Creating or finishing the container failed
    pub container_error: Option<anyhow::Error>,
    /// Size of the archive on disk, set only when it exists and is non-empty
    pub archive_size: Option<u64>,
}

impl ArchiveReport {
    fn new(output: &Path) -> Self {
        ArchiveReport {
            output: output.to_path_buf(),
            entries: Vec::new(),
            failures: Vec::new(),
            container_error: None,
            archive_size: None,
        }
    }

    pub fn verified(&self) -> bool {
        self.archive_size.is_some()
    }

    /// Some files were skipped because they could not be written
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Every file was written, the container closed cleanly and the output
    /// passed verification.
    pub fn success(&self) -> bool {
        !self.is_partial() && self.container_error.is_none() && self.verified()
    }
}

/// Archive `project_dir` into `output`, skipping folders named in `exclusions`
pub fn archive_project(
    project_dir: &Path,
    output: &Path,
    exclusions: &ExclusionSet,
    reporter: &mut dyn Reporter,
) -> ArchiveReport {
    let mut report = ArchiveReport::new(output);
    reporter.archive_started(project_dir, output);

    if let Err(err) = write_archive(project_dir, output, exclusions, reporter, &mut report) {
        report.container_error = Some(err);
    }
    reporter.archive_closed(output);

    report.archive_size = verify_archive(output);
    reporter.archive_finished(&report);
    report
}

/// Return the archive size if the file exists and is non-empty
pub fn verify_archive(output: &Path) -> Option<u64> {
    fs::metadata(output)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .filter(|&len| len > 0)
}

fn write_archive(
    project_dir: &Path,
    output: &Path,
    exclusions: &ExclusionSet,
    reporter: &mut dyn Reporter,
    report: &mut ArchiveReport,
) -> Result<()> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create archive {}", output.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

    let excluded = exclusions.clone();
    let walker = WalkBuilder::new(project_dir)
        .hidden(false)
        // Archive everything; ignore files in the project must not hide content
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            // Drop excluded folders before the walker reads them
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                if let Some(name) = entry.file_name().to_str() {
                    return !excluded.contains(name);
                }
            }
            true
        })
        .build();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                let path = walk_error_path(&err)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| project_dir.to_path_buf());
                let error = anyhow!(err).context("Failed to read directory entry");
                reporter.file_failed(&path, &error);
                report.failures.push(FileFailure { path, error });
                continue;
            }
        };

        if entry.depth() == 0 {
            continue;
        }
        let Some(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            continue;
        }
        // Links to directories are not descended into
        if file_type.is_symlink() && path.is_dir() {
            continue;
        }
        // Never feed the archive into itself
        if path == output {
            continue;
        }

        let name = match entry_name(project_dir, path) {
            Ok(name) => name,
            Err(error) => {
                reporter.file_failed(path, &error);
                report.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    error,
                });
                continue;
            }
        };

        reporter.file_started(&name, path);
        match add_file(&mut zip, path, &name, options) {
            Ok(()) => report.entries.push(name),
            Err(error) => {
                reporter.file_failed(path, &error);
                report.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    error,
                });
            }
        }
    }

    zip.finish()
        .with_context(|| format!("Failed to finalize archive {}", output.display()))?;
    Ok(())
}

/// Copy one file into the archive. A half-written entry is discarded.
fn add_file(
    zip: &mut ZipWriter<File>,
    path: &Path,
    name: &str,
    options: FileOptions<()>,
) -> Result<()> {
    // Opening a FIFO or device node can block forever, so only regular files
    // (or links to them) are opened
    let metadata =
        fs::metadata(path).with_context(|| format!("Failed to read metadata for {}", path.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    let mut source =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let options = options.large_file(metadata.len() >= u64::from(u32::MAX));
    #[cfg(unix)]
    let options = {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(metadata.permissions().mode())
    };

    zip.start_file(name, options)
        .with_context(|| format!("Failed to start archive entry {}", name))?;

    if let Err(err) = io::copy(&mut source, zip) {
        zip.abort_file()
            .with_context(|| format!("Failed to discard partial entry {}", name))?;
        return Err(err).with_context(|| format!("Failed to read {}", path.display()));
    }

    Ok(())
}

/// Archive entry name: path relative to the project root, `/`-separated
pub fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().with_context(|| {
                    format!("File name is not valid UTF-8: {}", path.display())
                })?;
                parts.push(part);
            }
            other => anyhow::bail!(
                "Unexpected path component {:?} in {}",
                other,
                path.display()
            ),
        }
    }

    if parts.is_empty() {
        anyhow::bail!("{} has no name relative to {}", path.display(), root.display());
    }
    Ok(parts.join("/"))
}

fn walk_error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        _ => None,
    }
}
