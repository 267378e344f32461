//! Project marker and cache folder configuration loaded from defaults.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Structure to deserialize the folder configuration from TOML
#[derive(Debug, Deserialize)]
struct ConfigFile {
    project: ProjectSection,
    #[serde(default)]
    folders: FolderSection,
}

#[derive(Debug, Deserialize)]
struct ProjectSection {
    marker: String,
}

#[derive(Debug, Default, Deserialize)]
struct FolderSection {
    /// Removed by `--clean` and excluded from archives
    #[serde(default)]
    cache: Vec<String>,
    /// Excluded from archives only
    #[serde(default)]
    exclude_only: Vec<String>,
}

// Embed the TOML file directly in the binary at compile time
const DEFAULTS_TOML: &str = include_str!("../defaults.toml");

/// Bare directory names skipped during a tree walk.
///
/// Matching is exact and applies to a single path segment, never to a whole
/// path or a glob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: Vec<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = ExclusionSet::default();
        for name in names {
            set.push(name);
        }
        set
    }

    /// Append a name, keeping the first occurrence when it is already present
    pub fn push(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.names.contains(&name) {
            self.names.push(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Marker and folder lists passed explicitly into the pruner and archiver
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Subdirectory whose presence identifies a project
    pub marker: String,
    /// Folders removed before archiving when cleaning is enabled
    pub prune_targets: Vec<String>,
    /// Folders never descended into while archiving
    pub exclusions: ExclusionSet,
}

impl ArchiveConfig {
    /// Parse the configuration embedded in the binary
    pub fn load_default() -> Result<Self> {
        Self::from_toml(DEFAULTS_TOML).context("Failed to parse embedded defaults.toml")
    }

    /// Load a configuration file with the same schema as defaults.toml
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;

        // Everything we prune is also excluded, so a cache folder that survives
        // cleanup is still kept out of the archive.
        let mut exclusions = ExclusionSet::new(file.folders.cache.iter().cloned());
        for name in file.folders.exclude_only {
            exclusions.push(name);
        }

        let config = ArchiveConfig {
            marker: file.project.marker,
            prune_targets: file.folders.cache,
            exclusions,
        };
        config.validate()?;
        Ok(config)
    }

    /// Add archive-only exclusions (from the command line)
    pub fn with_extra_exclusions<I, S>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.exclusions.push(name);
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject names that are not a single path segment
    pub fn validate(&self) -> Result<()> {
        if !is_bare_name(&self.marker) {
            anyhow::bail!("Invalid project marker '{}': expected a bare directory name", self.marker);
        }
        for name in self.prune_targets.iter().chain(self.exclusions.names()) {
            if !is_bare_name(name) {
                anyhow::bail!("Invalid folder name '{}': expected a bare directory name", name);
            }
        }
        Ok(())
    }
}

/// Check that a name refers to a direct child and cannot escape its parent
pub fn is_bare_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !Path::new(name).is_absolute()
}
