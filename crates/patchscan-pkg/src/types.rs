//! Normalized records produced by the fetchers

use std::fmt;

use serde::{Deserialize, Serialize};

/// A package with an available update
///
/// Optional fields are only set when the package manager reported them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Package name
    pub name: String,
    /// Version the package would be updated to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Package architecture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    /// Repository the update comes from
    #[serde(default, alias = "repository", skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Update category (security, recommended, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Update severity (critical, important, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

impl UpdateRecord {
    /// Create a record carrying only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            arch: None,
            repo: None,
            category: None,
            severity: None,
        }
    }

    /// Set version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set architecture
    #[must_use]
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }

    /// Set repository
    #[must_use]
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }
}

/// Result of a successful available-updates query
///
/// An empty `available` list means the host is up to date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateList {
    /// Updates the package manager would install
    #[serde(default)]
    pub available: Vec<UpdateRecord>,
}

impl UpdateList {
    /// Wrap a list of records
    pub fn new(available: Vec<UpdateRecord>) -> Self {
        Self { available }
    }

    /// Whether no update is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }
}

/// An installed package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package name
    pub name: String,
    /// Installed version
    pub version: String,
    /// Package architecture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

/// Result of an installed-packages query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledList {
    /// Installed packages
    #[serde(default)]
    pub installed: Vec<PackageRecord>,
}

/// A pending advisory, as reported by families with patch granularity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRecord {
    /// Advisory identifier
    pub name: String,
    /// Advisory edition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

/// Whether a host has pending updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpToDate {
    /// The available-updates query returned nothing
    UpToDate,
    /// At least one update is available
    Behind,
    /// The query failed or the OS is not supported
    Unknown,
}

impl UpToDate {
    /// `Some(true)` when up to date, `Some(false)` when behind, `None` when unknown
    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            UpToDate::UpToDate => Some(true),
            UpToDate::Behind => Some(false),
            UpToDate::Unknown => None,
        }
    }
}

impl fmt::Display for UpToDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpToDate::UpToDate => write!(f, "up to date"),
            UpToDate::Behind => write!(f, "updates available"),
            UpToDate::Unknown => write!(f, "unknown"),
        }
    }
}
