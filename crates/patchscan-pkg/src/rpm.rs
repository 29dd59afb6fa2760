//! RPM database queries shared by the RPM-based families

use patchscan_exec::ShellCommand;
use tracing::{info, instrument};

use crate::error::FetchError;
use crate::json::parse_json_lines;
use crate::runner::HostRunner;
use crate::types::{InstalledList, PackageRecord};

/// One JSON object per installed package
const INSTALLED_QUERY_FORMAT: &str =
    r#"{"name":"%{NAME}","version":"%{VERSION}-%{RELEASE}","arch":"%{ARCH}"}\n"#;

/// List installed packages from the RPM database
///
/// # Errors
/// Returns `FetchError::CommandFailed` if `rpm` exits with a non-zero status.
#[instrument(skip(runner))]
pub(crate) async fn installed(runner: &HostRunner) -> Result<InstalledList, FetchError> {
    let cmd = ShellCommand::new("rpm")
        .arg("-qa")
        .arg("--queryformat")
        .arg(INSTALLED_QUERY_FORMAT);
    let result = runner.run_checked(&cmd).await?;

    let installed = parse_installed(&result.stdout);
    info!(count = installed.len(), "found installed packages");

    Ok(InstalledList { installed })
}

fn parse_installed(output: &str) -> Vec<PackageRecord> {
    let mut packages: Vec<PackageRecord> = parse_json_lines(output);
    // gpg-pubkey pseudo packages report "(none)"
    for p in &mut packages {
        if p.arch.as_deref() == Some("(none)") {
            p.arch = None;
        }
    }
    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed() {
        let output = r#"{"name":"bash","version":"4.4.20-4.el8","arch":"x86_64"}
{"name":"tzdata","version":"2024a-1.el8","arch":"noarch"}
{"name":"gpg-pubkey","version":"8483c65d-5ccc5b19","arch":"(none)"}
"#;

        let packages = parse_installed(output);

        assert_eq!(packages.len(), 3);
        assert_eq!(packages[0].name, "bash");
        assert_eq!(packages[0].version, "4.4.20-4.el8");
        assert_eq!(packages[1].arch.as_deref(), Some("noarch"));
        assert_eq!(packages[2].arch, None);
    }

    #[test]
    fn test_parse_installed_empty() {
        assert!(parse_installed("").is_empty());
    }
}
