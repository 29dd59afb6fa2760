//! Update inspection facade
//!
//! [`LinuxUpdate`] binds one fetcher to a host when it is built and never
//! rebinds it. On a host whose family has no fetcher every query returns its
//! neutral value instead of failing, so callers that never checked
//! [`LinuxUpdate::is_supported`] keep working.

use std::sync::Arc;

use patchscan_exec::RemoteExecutor;
use tracing::{debug, info, instrument, warn};

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::family::{FamilyDetector, OsFamily, OsReleaseDetector};
use crate::fetcher::Fetcher;
use crate::traits::UpdateFetcher;
use crate::types::{InstalledList, PackageRecord, PatchRecord, UpToDate, UpdateList, UpdateRecord};

enum Binding {
    Bound(Fetcher),
    Unsupported,
}

/// Pending update inspector for one Linux host
pub struct LinuxUpdate {
    family: OsFamily,
    binding: Binding,
}

impl LinuxUpdate {
    /// Bind the fetcher for a known `family`
    pub fn new(
        family: OsFamily,
        executor: Arc<dyn RemoteExecutor>,
        config: &FetcherConfig,
    ) -> Self {
        let binding = match Fetcher::for_family(family, executor, config) {
            Some(fetcher) => {
                info!(%family, fetcher = fetcher.name(), "bound update fetcher");
                Binding::Bound(fetcher)
            }
            None => {
                warn!(%family, "updates are not supported on this OS");
                Binding::Unsupported
            }
        };

        Self { family, binding }
    }

    /// Detect the host's family from `os-release` and bind its fetcher
    pub async fn detect(executor: Arc<dyn RemoteExecutor>, config: &FetcherConfig) -> Self {
        let detector = OsReleaseDetector::new(executor.clone());
        Self::with_detector(&detector, executor, config).await
    }

    /// Detect the host's family with `detector` and bind its fetcher
    ///
    /// A detection failure leaves the host unsupported.
    pub async fn with_detector(
        detector: &dyn FamilyDetector,
        executor: Arc<dyn RemoteExecutor>,
        config: &FetcherConfig,
    ) -> Self {
        let family = detector.detect().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not detect OS family");
            OsFamily::Other
        });
        Self::new(family, executor, config)
    }

    /// Family detected for the host
    #[must_use]
    pub fn family(&self) -> OsFamily {
        self.family
    }

    /// Whether a fetcher is bound
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self.binding, Binding::Bound(_))
    }

    fn fetcher(&self) -> Result<&Fetcher, FetchError> {
        match &self.binding {
            Binding::Bound(fetcher) => Ok(fetcher),
            Binding::Unsupported => Err(FetchError::Unsupported(self.family)),
        }
    }

    /// Query available updates, keeping the failure if there is one
    ///
    /// # Errors
    /// Returns `FetchError::Unsupported` when no fetcher is bound, or the
    /// fetcher's error when the update status could not be determined.
    pub async fn fetch_updates(&self) -> Result<UpdateList, FetchError> {
        self.fetcher()?.updates().await
    }

    /// Query installed packages, keeping the failure if there is one
    ///
    /// # Errors
    /// Returns `FetchError::Unsupported` when no fetcher is bound, or the
    /// fetcher's error.
    pub async fn fetch_packages(&self) -> Result<InstalledList, FetchError> {
        self.fetcher()?.packages().await
    }

    /// Query pending patches, keeping the failure if there is one
    ///
    /// # Errors
    /// Returns `FetchError::Unsupported` when no fetcher is bound, or the
    /// fetcher's error.
    pub async fn fetch_patches(&self) -> Result<Vec<PatchRecord>, FetchError> {
        self.fetcher()?.patches().await
    }

    /// Available updates; empty when unsupported or when the query failed
    #[instrument(skip(self), fields(family = %self.family))]
    pub async fn updates(&self) -> Vec<UpdateRecord> {
        neutral(self.fetch_updates().await, "updates")
            .map(|l| l.available)
            .unwrap_or_default()
    }

    /// Whether the host is up to date
    ///
    /// A failed query is `Unknown`, never `UpToDate`.
    #[instrument(skip(self), fields(family = %self.family))]
    pub async fn up_to_date(&self) -> UpToDate {
        match neutral(self.fetch_updates().await, "updates") {
            Some(list) if list.is_empty() => UpToDate::UpToDate,
            Some(_) => UpToDate::Behind,
            None => UpToDate::Unknown,
        }
    }

    /// `Some(true)` when up to date, `Some(false)` when behind, `None` when unknown
    pub async fn is_up_to_date(&self) -> Option<bool> {
        self.up_to_date().await.as_bool()
    }

    /// Installed packages; empty when unsupported or when the query failed
    #[instrument(skip(self), fields(family = %self.family))]
    pub async fn packages(&self) -> Vec<PackageRecord> {
        neutral(self.fetch_packages().await, "packages")
            .map(|l| l.installed)
            .unwrap_or_default()
    }

    /// Pending patches; empty when unsupported, when the query failed, or
    /// when the family has no patch granularity
    #[instrument(skip(self), fields(family = %self.family))]
    pub async fn patches(&self) -> Vec<PatchRecord> {
        neutral(self.fetch_patches().await, "patches").unwrap_or_default()
    }
}

/// Turn a query result into a value or nothing, reporting real failures
fn neutral<T>(result: Result<T, FetchError>, query: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_unsupported() => {
            debug!(query, "no fetcher bound, returning neutral result");
            None
        }
        Err(e) => {
            warn!(query, error = %e, "could not determine patch status");
            None
        }
    }
}
