//! Project detection and discovery under a root directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A directory recognized as a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDirectory {
    path: PathBuf,
    name: String,
}

impl ProjectDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();
        ProjectDirectory { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path segment
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the archive for this project goes: `<output_dir>/<name>.zip`
    pub fn archive_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.zip", self.name))
    }
}

/// Check if a directory is a project: the marker must be a direct subdirectory
pub fn is_project(dir: &Path, marker: &str) -> bool {
    dir.join(marker).is_dir()
}

/// Make sure the root exists and return its canonical form
pub fn resolve_root(root: &Path) -> Result<PathBuf> {
    if !root.exists() {
        anyhow::bail!("Root path '{}' does not exist", root.display());
    }
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve root path '{}'", root.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Root path '{}' is not a directory", root.display());
    }
    Ok(root)
}

/// List the immediate subdirectories of `root` that contain `marker`.
///
/// Symlinked directories are skipped, so nothing outside the root is ever
/// archived or deleted. Results are sorted by name.
pub fn discover_projects(root: &Path, marker: &str) -> Result<Vec<ProjectDirectory>> {
    let root = resolve_root(root)?;

    let entries = fs::read_dir(&root)
        .with_context(|| format!("Failed to read directory {}", root.display()))?;

    let mut projects = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read entry in {}", root.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to inspect {}", entry.path().display()))?;
        if !file_type.is_dir() {
            continue;
        }

        let path = entry.path();
        if is_project(&path, marker) {
            projects.push(ProjectDirectory::new(path));
        }
    }

    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_project_with_marker() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Assets/Scripts")).unwrap();
        assert!(is_project(dir.path(), "Assets"));
    }

    #[test]
    fn test_empty_marker_still_counts() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("Assets")).unwrap();
        assert!(is_project(dir.path(), "Assets"));
    }

    #[test]
    fn test_is_project_without_marker() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("Library")).unwrap();
        assert!(!is_project(dir.path(), "Assets"));
    }

    #[test]
    fn test_marker_file_is_not_a_project() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Assets"), "not a folder").unwrap();
        assert!(!is_project(dir.path(), "Assets"));
    }

    #[test]
    fn test_nested_marker_does_not_count() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub/Assets")).unwrap();
        assert!(!is_project(dir.path(), "Assets"));
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("zeta/Assets")).unwrap();
        fs::create_dir_all(root.path().join("alpha/Assets")).unwrap();
        fs::create_dir_all(root.path().join("docs")).unwrap();
        fs::write(root.path().join("alpha.zip"), "old archive").unwrap();

        let projects = discover_projects(root.path(), "Assets").unwrap();
        let names: Vec<_> = projects.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);

        let canonical = root.path().canonicalize().unwrap();
        assert_eq!(projects[0].path(), canonical.join("alpha"));
    }

    #[test]
    fn test_discover_missing_root_fails() {
        let root = tempdir().unwrap();
        let missing = root.path().join("nope");
        let err = discover_projects(&missing, "Assets").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_root_rejects_file() {
        let root = tempdir().unwrap();
        let file = root.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(resolve_root(&file).is_err());
    }

    #[test]
    fn test_archive_path() {
        let project = ProjectDirectory::new("/games/Platformer");
        assert_eq!(project.name(), "Platformer");
        assert_eq!(
            project.archive_path(Path::new("/games")),
            PathBuf::from("/games/Platformer.zip")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_symlinked_directories() {
        let outside = tempdir().unwrap();
        fs::create_dir_all(outside.path().join("real/Assets")).unwrap();

        let root = tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path().join("real"), root.path().join("link"))
            .unwrap();

        let projects = discover_projects(root.path(), "Assets").unwrap();
        assert!(projects.is_empty());
    }
}
