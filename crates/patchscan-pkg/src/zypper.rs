//! Zypper fetcher (SLES/openSUSE)
//!
//! Both updates and patches come from `zypper --xmlout list-updates`. The
//! `update-list` and `blocked-update-list` sections are merged into one list:
//! blocked updates are still pending, and callers get no way to tell them
//! apart.

use async_trait::async_trait;
use patchscan_exec::ShellCommand;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, error, info, instrument};

use crate::error::FetchError;
use crate::rpm;
use crate::runner::{HostRunner, command_failed};
use crate::traits::UpdateFetcher;
use crate::types::{InstalledList, PatchRecord, UpdateList, UpdateRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Available,
    Blocked,
}

/// Attributes of one `<update>` element
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ZypperEntry {
    name: Option<String>,
    edition: Option<String>,
    arch: Option<String>,
    category: Option<String>,
    severity: Option<String>,
}

impl ZypperEntry {
    fn from_element(element: &BytesStart<'_>) -> Result<Self, FetchError> {
        let mut entry = Self::default();

        for attr in element.attributes() {
            let attr = attr.map_err(|e| FetchError::ParseError(e.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|e| FetchError::ParseError(e.to_string()))?
                .into_owned();

            match attr.key.as_ref() {
                b"name" => entry.name = Some(value),
                b"edition" => entry.edition = Some(value),
                b"arch" => entry.arch = Some(value),
                b"category" => entry.category = Some(value),
                b"severity" => entry.severity = Some(value),
                _ => {}
            }
        }

        Ok(entry)
    }

    /// The edition is only reported when an arch is present too; entries
    /// without an arch are treated as incomplete
    fn version(&self) -> Option<String> {
        self.arch.as_ref().and(self.edition.clone())
    }

    fn into_update_record(self) -> Option<UpdateRecord> {
        let version = self.version();
        Some(UpdateRecord {
            name: self.name?,
            version,
            arch: self.arch,
            repo: None,
            category: self.category,
            severity: self.severity,
        })
    }

    fn into_patch_record(self) -> Option<PatchRecord> {
        let version = self.version();
        Some(PatchRecord {
            name: self.name?,
            version,
            arch: self.arch,
            category: self.category,
            severity: self.severity,
        })
    }
}

/// Zypper fetcher
pub struct ZypperFetcher {
    runner: HostRunner,
}

impl ZypperFetcher {
    /// Create a new Zypper fetcher
    pub fn new(runner: HostRunner) -> Self {
        Self { runner }
    }

    /// Run `zypper --xmlout list-updates` with `extra` arguments
    async fn list_updates(&self, extra: &[&str]) -> Result<Vec<ZypperEntry>, FetchError> {
        let cmd = ShellCommand::new("zypper")
            .arg("--non-interactive")
            .arg("--xmlout")
            .arg("list-updates")
            .args(extra.iter().copied())
            .with_sudo(self.runner.use_sudo());
        let result = self.runner.run(&cmd).await?;

        if !result.success() {
            error!(
                status = result.status,
                stderr = %result.stderr.trim(),
                "cannot retrieve package updates from the OS"
            );
            return Err(command_failed(&result));
        }

        Self::parse_update_lists(&result.stdout)
    }

    /// Collect the `<update>` children of the first `update-list` and the
    /// first `blocked-update-list`, in that order
    fn parse_update_lists(xml: &str) -> Result<Vec<ZypperEntry>, FetchError> {
        let mut reader = Reader::from_str(xml);

        let mut depth = 0usize;
        let mut current: Option<(ListKind, usize)> = None;
        let mut seen_available = false;
        let mut seen_blocked = false;
        let mut available = Vec::new();
        let mut blocked = Vec::new();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(FetchError::ParseError(format!(
                        "invalid zypper XML at byte {}: {e}",
                        reader.buffer_position()
                    )));
                }
            };

            match event {
                Event::Start(ref element) | Event::Empty(ref element) => {
                    let opens = matches!(event, Event::Start(_));

                    match current {
                        Some((kind, list_depth))
                            if depth == list_depth + 1 && element.name().as_ref() == b"update" =>
                        {
                            let entry = ZypperEntry::from_element(element)?;
                            match kind {
                                ListKind::Available => available.push(entry),
                                ListKind::Blocked => blocked.push(entry),
                            }
                        }
                        None => {
                            let kind = match element.name().as_ref() {
                                b"update-list" if !seen_available => {
                                    seen_available = true;
                                    Some(ListKind::Available)
                                }
                                b"blocked-update-list" if !seen_blocked => {
                                    seen_blocked = true;
                                    Some(ListKind::Blocked)
                                }
                                _ => None,
                            };
                            if let Some(kind) = kind
                                && opens
                            {
                                current = Some((kind, depth));
                            }
                        }
                        Some(_) => {}
                    }

                    if opens {
                        depth += 1;
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if current.is_some_and(|(_, list_depth)| list_depth == depth) {
                        current = None;
                    }
                }
                Event::Eof => {
                    if depth != 0 || current.is_some() {
                        return Err(FetchError::ParseError(format!(
                            "truncated zypper XML: {depth} element(s) left open"
                        )));
                    }
                    break;
                }
                _ => {}
            }
        }

        debug!(
            available = available.len(),
            blocked = blocked.len(),
            "parsed zypper update lists"
        );
        available.extend(blocked);
        Ok(available)
    }
}

#[async_trait]
impl UpdateFetcher for ZypperFetcher {
    #[instrument(skip(self))]
    async fn updates(&self) -> Result<UpdateList, FetchError> {
        debug!("listing available updates");

        let entries = self.list_updates(&[]).await?;
        let available: Vec<UpdateRecord> = entries
            .into_iter()
            .filter_map(ZypperEntry::into_update_record)
            .collect();
        info!(count = available.len(), "found available updates");

        Ok(UpdateList::new(available))
    }

    async fn packages(&self) -> Result<InstalledList, FetchError> {
        rpm::installed(&self.runner).await
    }

    #[instrument(skip(self))]
    async fn patches(&self) -> Result<Vec<PatchRecord>, FetchError> {
        debug!("listing pending patches");

        let entries = self.list_updates(&["-t", "patch"]).await?;
        let patches: Vec<PatchRecord> = entries
            .into_iter()
            .filter_map(ZypperEntry::into_patch_record)
            .collect();
        info!(count = patches.len(), "found pending patches");

        Ok(patches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPDATES_XML: &str = r#"<?xml version='1.0'?>
<stream>
<message type="info">Loading repository data...</message>
<message type="info">Reading installed packages...</message>
<update-status version="0.6">
<update-list>
<update kind="package" name="libzypp" edition="17.31.8-150400.3.29.1" arch="x86_64" edition-old="17.31.7-150400.3.26.1">
<summary>Library for package, patch, pattern and product management</summary>
<description>libzypp is the package management library.</description>
<license></license>
<source url="http://download.opensuse.org/update/leap/15.4/sle" alias="repo-sle-update"/>
</update>
<update kind="package" name="zypper" edition="1.14-1"><summary>Command line software manager</summary></update>
</update-list>
<blocked-update-list>
<update kind="package" name="kernel-default" edition="5.14.21-150400.24.46.1" arch="x86_64"/>
</blocked-update-list>
</update-status>
</stream>
"#;

    const PATCHES_XML: &str = r#"<?xml version='1.0'?>
<stream>
<update-status version="0.6">
<update-list>
<update kind="patch" name="openSUSE-SLE-15.4-2023-1234" edition="1" arch="noarch" status="needed" category="security" severity="important" pkgmanager="false" restart="false" interactive="false">
<summary>Security update for curl</summary>
</update>
<update kind="patch" name="openSUSE-2023-99" edition="1" arch="noarch" category="recommended" severity="moderate"/>
</update-list>
<blocked-update-list/>
</update-status>
</stream>
"#;

    fn updates(xml: &str) -> Vec<UpdateRecord> {
        ZypperFetcher::parse_update_lists(xml)
            .unwrap()
            .into_iter()
            .filter_map(ZypperEntry::into_update_record)
            .collect()
    }

    #[test]
    fn test_update_and_blocked_lists_are_merged() {
        let records = updates(UPDATES_XML);

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["libzypp", "zypper", "kernel-default"]);

        assert_eq!(
            records[0].version.as_deref(),
            Some("17.31.8-150400.3.29.1")
        );
        assert_eq!(records[0].arch.as_deref(), Some("x86_64"));
        assert_eq!(records[0].repo, None);
        assert_eq!(records[2].version.as_deref(), Some("5.14.21-150400.24.46.1"));
    }

    #[test]
    fn test_version_omitted_without_arch() {
        let records = updates(UPDATES_XML);

        assert_eq!(records[1].name, "zypper");
        assert_eq!(records[1].version, None);
        assert_eq!(records[1].arch, None);
    }

    #[test]
    fn test_patch_attributes() {
        let patches: Vec<PatchRecord> = ZypperFetcher::parse_update_lists(PATCHES_XML)
            .unwrap()
            .into_iter()
            .filter_map(ZypperEntry::into_patch_record)
            .collect();

        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].name, "openSUSE-SLE-15.4-2023-1234");
        assert_eq!(patches[0].category.as_deref(), Some("security"));
        assert_eq!(patches[0].severity.as_deref(), Some("important"));
        assert_eq!(patches[1].severity.as_deref(), Some("moderate"));
    }

    #[test]
    fn test_no_updates() {
        let xml = r#"<?xml version='1.0'?>
<stream>
<update-status version="0.6">
<update-list>
</update-list>
</update-status>
</stream>"#;
        assert!(updates(xml).is_empty());
    }

    #[test]
    fn test_nested_update_elements_are_ignored() {
        let xml = r#"<stream><update-list>
<update name="a" edition="1" arch="noarch"><update name="nested"/></update>
</update-list></stream>"#;
        let records = updates(xml);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a");
    }

    #[test]
    fn test_entity_in_attribute() {
        let xml = r#"<stream><update-list><update name="a&amp;b" edition="1" arch="noarch"/></update-list></stream>"#;
        assert_eq!(updates(xml)[0].name, "a&b");
    }

    #[test]
    fn test_truncated_xml_is_an_error() {
        let xml = r#"<?xml version='1.0'?>
<stream>
<update-status version="0.6">
<update-list>
<update kind="package" name="curl" edition="8.0.1-1" arch="x86_64"/>
"#;
        assert!(matches!(
            ZypperFetcher::parse_update_lists(xml),
            Err(FetchError::ParseError(_))
        ));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let xml = "<stream><update-list><update name=\"a\"></update-list></stream>";
        assert!(matches!(
            ZypperFetcher::parse_update_lists(xml),
            Err(FetchError::ParseError(_))
        ));
    }
}
