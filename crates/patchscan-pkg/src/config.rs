//! Fetcher configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the RHEL family fetcher resolves available updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhelBackend {
    /// Ask yum through its Python scripting interface
    #[default]
    Yum,
    /// Parse `dnf check-update`, for hosts without yum-cli
    Dnf,
}

/// Settings shared by every fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Prefix package manager commands with sudo
    #[serde(default)]
    pub use_sudo: bool,
    /// Per-command timeout; commands run to completion when unset
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
    /// Delay between two dpkg lock probes
    #[serde(default = "default_lock_poll_interval_ms")]
    pub lock_poll_interval_ms: u64,
    /// Give up waiting for the dpkg lock after this long; wait forever when unset
    #[serde(default)]
    pub lock_timeout_secs: Option<u64>,
    /// Update resolution strategy on RHEL-like hosts
    #[serde(default)]
    pub rhel_backend: RhelBackend,
}

fn default_lock_poll_interval_ms() -> u64 {
    1000
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            use_sudo: false,
            command_timeout_secs: None,
            lock_poll_interval_ms: default_lock_poll_interval_ms(),
            lock_timeout_secs: None,
            rhel_backend: RhelBackend::default(),
        }
    }
}

impl FetcherConfig {
    /// Per-command timeout
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// Delay between two dpkg lock probes
    #[must_use]
    pub fn lock_poll_interval(&self) -> Duration {
        Duration::from_millis(self.lock_poll_interval_ms)
    }

    /// Upper bound on the dpkg lock wait
    #[must_use]
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_secs.map(Duration::from_secs)
    }
}
