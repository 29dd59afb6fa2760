//! OS family detection

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use patchscan_exec::{RemoteExecutor, ShellCommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::FetchError;

const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// Distribution family of the inspected host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// RHEL, CentOS, Fedora and rebuilds
    RedHat,
    /// Amazon Linux
    Amazon,
    /// Debian, Ubuntu and derivatives
    Debian,
    /// SLES and openSUSE
    Suse,
    /// Anything else
    Other,
}

impl OsFamily {
    /// Classify the contents of an `os-release` file
    ///
    /// `ID` decides first; `ID_LIKE` is only consulted when `ID` is not
    /// recognized.
    #[must_use]
    pub fn from_os_release(content: &str) -> Self {
        let mut id = None;
        let mut id_like = None;

        for line in content.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            match key.trim() {
                "ID" => id = Some(value.to_lowercase()),
                "ID_LIKE" => id_like = Some(value.to_lowercase()),
                _ => {}
            }
        }

        if let Some(family) = id.as_deref().and_then(Self::from_id) {
            return family;
        }

        id_like
            .as_deref()
            .into_iter()
            .flat_map(str::split_whitespace)
            .find_map(Self::from_id)
            .unwrap_or(OsFamily::Other)
    }

    fn from_id(id: &str) -> Option<Self> {
        match id {
            "rhel" | "redhat" | "centos" | "fedora" | "rocky" | "almalinux" | "ol" => {
                Some(OsFamily::RedHat)
            }
            "amzn" => Some(OsFamily::Amazon),
            "debian" | "ubuntu" | "linuxmint" | "raspbian" => Some(OsFamily::Debian),
            "sles" | "sled" | "suse" => Some(OsFamily::Suse),
            id if id.starts_with("opensuse") => Some(OsFamily::Suse),
            _ => None,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::RedHat => write!(f, "redhat"),
            OsFamily::Amazon => write!(f, "amazon"),
            OsFamily::Debian => write!(f, "debian"),
            OsFamily::Suse => write!(f, "suse"),
            OsFamily::Other => write!(f, "other"),
        }
    }
}

/// Classifies a host into an [`OsFamily`]
#[async_trait]
pub trait FamilyDetector: Send + Sync {
    /// Detect the family of the host
    ///
    /// # Errors
    /// Returns an error if the host could not be inspected.
    async fn detect(&self) -> Result<OsFamily, FetchError>;
}

/// Detects the family from the host's `os-release` file
pub struct OsReleaseDetector {
    executor: Arc<dyn RemoteExecutor>,
}

impl OsReleaseDetector {
    /// Create a detector reading through `executor`
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl FamilyDetector for OsReleaseDetector {
    #[instrument(skip(self))]
    async fn detect(&self) -> Result<OsFamily, FetchError> {
        let mut last_failure = None;

        for path in OS_RELEASE_PATHS {
            let cmd = ShellCommand::new("cat").arg(path).render();
            let result = self
                .executor
                .run(&cmd)
                .await
                .map_err(|e| FetchError::ExecutionError(e.to_string()))?;

            if result.success() {
                let family = OsFamily::from_os_release(&result.stdout);
                debug!(%family, path, "detected OS family");
                return Ok(family);
            }
            last_failure = Some(result);
        }

        match last_failure {
            Some(result) => Err(FetchError::CommandFailed {
                status: result.status,
                stderr: format!("no readable os-release file: {}", result.stderr.trim()),
            }),
            None => Err(FetchError::ExecutionError(
                "no os-release path to read".to_string(),
            )),
        }
    }
}
