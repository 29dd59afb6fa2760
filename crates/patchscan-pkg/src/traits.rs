//! Fetcher trait

use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::{InstalledList, PatchRecord, UpdateList};

/// Queries one package manager family
///
/// Every call runs the underlying commands again; nothing is cached.
#[async_trait]
pub trait UpdateFetcher: Send + Sync {
    /// List updates the package manager would install
    ///
    /// # Errors
    /// Returns an error when the update status could not be determined.
    async fn updates(&self) -> Result<UpdateList, FetchError>;

    /// List installed packages
    ///
    /// # Errors
    /// Returns an error when the package database could not be queried.
    async fn packages(&self) -> Result<InstalledList, FetchError>;

    /// List pending advisories
    ///
    /// Families without patch granularity always return an empty list.
    ///
    /// # Errors
    /// Returns an error when the advisory listing could not be obtained.
    async fn patches(&self) -> Result<Vec<PatchRecord>, FetchError> {
        Ok(Vec::new())
    }
}
