//! APT fetcher (Debian/Ubuntu)

use std::time::{Duration, Instant};

use async_trait::async_trait;
use patchscan_exec::ShellCommand;
use tracing::{debug, info, instrument, warn};

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::runner::HostRunner;
use crate::traits::UpdateFetcher;
use crate::types::{InstalledList, PackageRecord, UpdateList, UpdateRecord};

/// Prints the dpkg lock path when some process holds it open
const DPKG_LOCK_PROBE: &str = "cat /proc/locks | awk '{print $5}' | grep -v '^0' \
    | xargs -I PID find /proc/PID/fd -maxdepth 1 -exec readlink {} \\; 2>/dev/null \
    | grep '^/var/lib/dpkg/lock$'";

const DPKG_STATUS_FORMAT: &str = "${Status}\\t${Package}\\t${Version}\\t${Architecture}\\n";

const INSTALLED_STATUS: &str = "install ok installed";

/// APT fetcher
pub struct AptFetcher {
    runner: HostRunner,
    poll_interval: Duration,
    lock_timeout: Option<Duration>,
}

impl AptFetcher {
    /// Create a new APT fetcher
    pub fn new(runner: HostRunner, config: &FetcherConfig) -> Self {
        Self {
            runner,
            poll_interval: config.lock_poll_interval(),
            lock_timeout: config.lock_timeout(),
        }
    }

    fn apt_get(&self, args: &[&str]) -> ShellCommand {
        ShellCommand::new("apt-get")
            .args(args.iter().copied())
            .env("DEBIAN_FRONTEND", "noninteractive")
    }

    /// Refresh the package index
    ///
    /// Failures are logged and ignored: a stale index still answers the
    /// simulation that follows.
    async fn refresh(&self) -> Result<(), FetchError> {
        let cmd = self.apt_get(&["update", "-qq"]).with_sudo(self.runner.use_sudo());
        let result = self.runner.run(&cmd).await?;
        if !result.success() {
            warn!(
                status = result.status,
                stderr = %result.stderr.trim(),
                "apt-get update failed, using the existing package index"
            );
        }
        Ok(())
    }

    /// Block until no process holds the dpkg lock
    async fn wait_for_dpkg_lock(&self) -> Result<(), FetchError> {
        let probe = ShellCommand::script(DPKG_LOCK_PROBE).with_sudo(self.runner.use_sudo());
        let start = Instant::now();

        loop {
            let result = self.runner.run(&probe).await?;
            if result.stdout.trim().is_empty() {
                return Ok(());
            }

            if let Some(limit) = self.lock_timeout
                && start.elapsed() >= limit
            {
                return Err(FetchError::LockTimeout(limit));
            }

            debug!(waited = ?start.elapsed(), "dpkg lock held, waiting");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Parse `apt-get upgrade --dry-run` output
    ///
    /// Only `Inst` lines announce an install:
    /// `Inst vim [2:8.0-1] (2:8.1-1 Ubuntu:18.04/bionic [amd64])`
    fn parse_simulation(output: &str) -> Vec<UpdateRecord> {
        output.lines().filter_map(Self::parse_inst_line).collect()
    }

    fn parse_inst_line(line: &str) -> Option<UpdateRecord> {
        let rest = line.strip_prefix("Inst ")?;
        let name = rest.split_whitespace().next()?;

        // The candidate is the parenthesised group; the bracket before it is
        // the installed version, absent for new installs
        let open = rest.find('(')?;
        let close = rest.rfind(')')?;
        if close <= open {
            debug!(line, "skipping unparsable Inst line");
            return None;
        }

        let mut tokens: Vec<&str> = rest[open + 1..close].split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }
        let version = tokens.remove(0);

        let arch = match tokens.last() {
            Some(last) if last.starts_with('[') && last.ends_with(']') => {
                let arch = last.trim_matches(|c| c == '[' || c == ']');
                tokens.pop();
                Some(arch)
            }
            _ => None,
        };

        let mut record = UpdateRecord::new(name).with_version(version);
        if !tokens.is_empty() {
            record = record.with_repo(tokens.join(" "));
        }
        if let Some(a) = arch.filter(|a| !a.is_empty()) {
            record = record.with_arch(a);
        }
        Some(record)
    }

    /// Parse `dpkg-query` status lines, keeping fully installed packages
    fn parse_installed(output: &str) -> Vec<PackageRecord> {
        let mut packages = Vec::new();

        for line in output.lines() {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 || fields[0].trim() != INSTALLED_STATUS {
                continue;
            }

            packages.push(PackageRecord {
                name: fields[1].to_string(),
                version: fields[2].to_string(),
                arch: fields
                    .get(3)
                    .map(|a| a.trim())
                    .filter(|a| !a.is_empty())
                    .map(str::to_string),
            });
        }

        packages
    }
}

#[async_trait]
impl UpdateFetcher for AptFetcher {
    #[instrument(skip(self))]
    async fn updates(&self) -> Result<UpdateList, FetchError> {
        debug!("listing available updates");

        self.refresh().await?;
        self.wait_for_dpkg_lock().await?;

        let cmd = self.apt_get(&["upgrade", "--dry-run"]);
        let result = self.runner.run_checked(&cmd).await?;

        let available = Self::parse_simulation(&result.stdout);
        info!(count = available.len(), "found available updates");

        Ok(UpdateList::new(available))
    }

    #[instrument(skip(self))]
    async fn packages(&self) -> Result<InstalledList, FetchError> {
        debug!("listing installed packages");

        self.wait_for_dpkg_lock().await?;

        let cmd = ShellCommand::new("dpkg-query")
            .arg("-W")
            .arg(format!("-f={DPKG_STATUS_FORMAT}"));
        let result = self.runner.run_checked(&cmd).await?;

        let installed = Self::parse_installed(&result.stdout);
        info!(count = installed.len(), "found installed packages");

        Ok(InstalledList { installed })
    }
}
