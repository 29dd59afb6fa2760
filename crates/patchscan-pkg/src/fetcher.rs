//! Family dispatch

use std::sync::Arc;

use async_trait::async_trait;
use patchscan_exec::RemoteExecutor;

use crate::apt::AptFetcher;
use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::family::OsFamily;
use crate::runner::HostRunner;
use crate::traits::UpdateFetcher;
use crate::types::{InstalledList, PatchRecord, UpdateList};
use crate::yum::YumFetcher;
use crate::zypper::ZypperFetcher;

/// The fetcher bound to one host, chosen from its OS family
pub enum Fetcher {
    /// Debian-like host
    Apt(AptFetcher),
    /// RHEL-like host, Amazon Linux included
    Yum(YumFetcher),
    /// SUSE-like host
    Zypper(ZypperFetcher),
}

impl Fetcher {
    /// Build the fetcher for `family`, or `None` when it is not supported
    pub fn for_family(
        family: OsFamily,
        executor: Arc<dyn RemoteExecutor>,
        config: &FetcherConfig,
    ) -> Option<Self> {
        let runner = HostRunner::new(executor, config);

        match family {
            OsFamily::RedHat | OsFamily::Amazon => {
                Some(Fetcher::Yum(YumFetcher::new(runner, config.rhel_backend)))
            }
            OsFamily::Debian => Some(Fetcher::Apt(AptFetcher::new(runner, config))),
            OsFamily::Suse => Some(Fetcher::Zypper(ZypperFetcher::new(runner))),
            OsFamily::Other => None,
        }
    }

    /// Short name of the package manager behind this fetcher
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Fetcher::Apt(_) => "apt",
            Fetcher::Yum(_) => "yum",
            Fetcher::Zypper(_) => "zypper",
        }
    }
}

#[async_trait]
impl UpdateFetcher for Fetcher {
    async fn updates(&self) -> Result<UpdateList, FetchError> {
        match self {
            Fetcher::Apt(f) => f.updates().await,
            Fetcher::Yum(f) => f.updates().await,
            Fetcher::Zypper(f) => f.updates().await,
        }
    }

    async fn packages(&self) -> Result<InstalledList, FetchError> {
        match self {
            Fetcher::Apt(f) => f.packages().await,
            Fetcher::Yum(f) => f.packages().await,
            Fetcher::Zypper(f) => f.packages().await,
        }
    }

    async fn patches(&self) -> Result<Vec<PatchRecord>, FetchError> {
        match self {
            Fetcher::Apt(f) => f.patches().await,
            Fetcher::Yum(f) => f.patches().await,
            Fetcher::Zypper(f) => f.patches().await,
        }
    }
}
