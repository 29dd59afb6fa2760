//! YUM/DNF fetcher (RHEL/CentOS/Fedora/Amazon Linux)

use async_trait::async_trait;
use patchscan_exec::ShellCommand;
use tracing::{debug, info, instrument, warn};

use crate::config::RhelBackend;
use crate::error::FetchError;
use crate::json::parse_embedded_document;
use crate::rpm;
use crate::runner::{HostRunner, command_failed};
use crate::traits::UpdateFetcher;
use crate::types::{InstalledList, UpdateList, UpdateRecord};

/// Resolves updates through yum's own Python API and prints them as JSON
const YUM_UPDATES_SCRIPT: &str = r#"import sys, json
sys.path.insert(0, "/usr/share/yum-cli")
import cli
lists = cli.YumBaseCli().returnPkgLists(["updates"])
res = [{"name": p.name, "version": p.version + "-" + p.release, "arch": p.arch, "repository": p.repo.id} for p in lists.updates]
sys.stdout.write(json.dumps({"available": res}) + "\n")
"#;

/// `dnf check-update` exit status when updates are available
const DNF_UPDATES_AVAILABLE: i32 = 100;

/// YUM/DNF fetcher
pub struct YumFetcher {
    runner: HostRunner,
    backend: RhelBackend,
}

impl YumFetcher {
    /// Create a new fetcher using `backend` to resolve updates
    pub fn new(runner: HostRunner, backend: RhelBackend) -> Self {
        Self { runner, backend }
    }

    async fn yum_updates(&self) -> Result<UpdateList, FetchError> {
        let cmd = ShellCommand::new("python")
            .arg("-c")
            .arg(YUM_UPDATES_SCRIPT)
            .with_sudo(self.runner.use_sudo());
        let result = self.runner.run(&cmd).await?;

        if !result.success() {
            warn!(status = result.status, "could not determine patch status");
            return Err(command_failed(&result));
        }

        Ok(parse_embedded_document(&result.stdout))
    }

    async fn dnf_updates(&self) -> Result<UpdateList, FetchError> {
        let cmd = ShellCommand::new("dnf")
            .arg("-q")
            .arg("check-update")
            .with_sudo(self.runner.use_sudo());
        let result = self.runner.run(&cmd).await?;

        // 100 means updates are available, 0 means none
        match result.status {
            0 => Ok(UpdateList::default()),
            DNF_UPDATES_AVAILABLE => {
                let available = Self::parse_check_update(&result.stdout);
                if available.is_empty() {
                    return Err(FetchError::ParseError(
                        "dnf reported available updates but none could be parsed".to_string(),
                    ));
                }
                Ok(UpdateList::new(available))
            }
            _ => {
                warn!(status = result.status, "could not determine patch status");
                Err(command_failed(&result))
            }
        }
    }

    /// Parse dnf check-update output
    ///
    /// Lines look like `vim-enhanced.x86_64 2:8.2.2637-20.el9_1 baseos`. A
    /// `name.arch` too long for its column stands alone and the version and
    /// repo follow on an indented line.
    fn parse_check_update(output: &str) -> Vec<UpdateRecord> {
        let mut records = Vec::new();
        let mut wrapped: Option<&str> = None;

        for line in output.lines() {
            if line.starts_with("Obsoleting Packages") {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            let continuation = line.starts_with(char::is_whitespace);

            let (name_arch, version, repo) = match (wrapped.take(), continuation) {
                (Some(name_arch), true) if parts.len() == 2 => (name_arch, parts[0], parts[1]),
                (_, false) if parts.len() == 1 => {
                    wrapped = Some(parts[0]);
                    continue;
                }
                (_, false) if parts.len() == 3 => (parts[0], parts[1], parts[2]),
                _ => {
                    debug!(line, "skipping check-update line");
                    continue;
                }
            };

            let (name, arch) = match name_arch.rfind('.') {
                Some(idx) => (&name_arch[..idx], Some(&name_arch[idx + 1..])),
                None => (name_arch, None),
            };

            let mut record = UpdateRecord::new(name).with_version(version).with_repo(repo);
            if let Some(a) = arch {
                record = record.with_arch(a);
            }
            records.push(record);
        }

        records
    }
}

#[async_trait]
impl UpdateFetcher for YumFetcher {
    #[instrument(skip(self), fields(backend = ?self.backend))]
    async fn updates(&self) -> Result<UpdateList, FetchError> {
        debug!("listing available updates");

        let list = match self.backend {
            RhelBackend::Yum => self.yum_updates().await?,
            RhelBackend::Dnf => self.dnf_updates().await?,
        };
        info!(count = list.available.len(), "found available updates");

        Ok(list)
    }

    async fn packages(&self) -> Result<InstalledList, FetchError> {
        rpm::installed(&self.runner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yum_output_with_preamble() {
        let output = "Loaded plugins: fastestmirror\nLoading mirror speeds from cached hostfile\n\
{\"available\":[{\"name\":\"bash\",\"version\":\"4.4-20\",\"arch\":\"x86_64\",\"repository\":\"base\"}]}";

        let list: UpdateList = parse_embedded_document(output);

        assert_eq!(
            list.available,
            vec![
                UpdateRecord::new("bash")
                    .with_version("4.4-20")
                    .with_arch("x86_64")
                    .with_repo("base")
            ]
        );
    }

    #[test]
    fn test_parse_check_update() {
        let output = r"
vim-enhanced.x86_64                  2:8.2.2637-20.el9_1              baseos
curl.x86_64                          7.76.1-26.el9_0                  baseos
Obsoleting Packages
grub2-tools.x86_64                   1:2.06-61.el9                    baseos
    grub2-tools.x86_64               1:2.06-46.el9                    @baseos";

        let records = YumFetcher::parse_check_update(output);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "vim-enhanced");
        assert_eq!(records[0].arch.as_deref(), Some("x86_64"));
        assert_eq!(records[0].version.as_deref(), Some("2:8.2.2637-20.el9_1"));
        assert_eq!(records[1].repo.as_deref(), Some("baseos"));
    }

    #[test]
    fn test_parse_check_update_wrapped_name() {
        let output = "python3-libselinux-devel-extra.x86_64
                                     3.4-3.el9_1                      baseos
curl.x86_64                          7.76.1-26.el9_0                  baseos
";

        let records = YumFetcher::parse_check_update(output);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "python3-libselinux-devel-extra");
        assert_eq!(records[0].arch.as_deref(), Some("x86_64"));
        assert_eq!(records[0].version.as_deref(), Some("3.4-3.el9_1"));
        assert_eq!(records[0].repo.as_deref(), Some("baseos"));
        assert_eq!(records[1].name, "curl");
    }
}
