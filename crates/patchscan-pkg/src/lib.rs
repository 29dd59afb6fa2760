//! patchscan-pkg: Pending OS update inspection
//!
//! Detects the package manager family of a Linux host, queries it for
//! available updates, installed packages and pending patches, and normalizes
//! the output of apt, yum/dnf and zypper into one set of records.

pub mod apt;
pub mod config;
pub mod error;
pub mod family;
pub mod fetcher;
mod json;
pub mod resource;
mod rpm;
pub mod runner;
pub mod traits;
pub mod types;
pub mod yum;
pub mod zypper;

pub use apt::AptFetcher;
pub use config::{FetcherConfig, RhelBackend};
pub use error::FetchError;
pub use family::{FamilyDetector, OsFamily, OsReleaseDetector};
pub use fetcher::Fetcher;
pub use resource::LinuxUpdate;
pub use runner::HostRunner;
pub use traits::UpdateFetcher;
pub use types::{
    InstalledList, PackageRecord, PatchRecord, UpToDate, UpdateList, UpdateRecord,
};
pub use yum::YumFetcher;
pub use zypper::ZypperFetcher;
