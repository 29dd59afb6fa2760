#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use patchscan_exec::{CommandResult, ExecError, RemoteExecutor};

/// Executor answering from canned results
///
/// A command gets the responses of the longest registered pattern it
/// contains. Queued responses are consumed in order; the last one repeats.
/// Commands matching nothing exit with 127.
#[derive(Default)]
pub struct MockExecutor {
    rules: Mutex<Vec<(String, VecDeque<CommandResult>)>>,
    calls: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, pattern: &str, status: i32, stdout: &str, stderr: &str) -> Self {
        {
            let mut rules = self.rules.lock().unwrap();
            let result = CommandResult::new(status, stdout, stderr);
            match rules.iter_mut().find(|(p, _)| p == pattern) {
                Some((_, queue)) => queue.push_back(result),
                None => rules.push((pattern.to_string(), VecDeque::from([result]))),
            }
        }
        self
    }

    pub fn ok(self, pattern: &str, stdout: &str) -> Self {
        self.on(pattern, 0, stdout, "")
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }
}

#[async_trait]
impl RemoteExecutor for MockExecutor {
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        self.calls.lock().unwrap().push(cmd.to_string());

        let mut rules = self.rules.lock().unwrap();
        let rule = rules
            .iter_mut()
            .filter(|(pattern, _)| cmd.contains(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len());

        match rule {
            Some((_, queue)) if queue.len() > 1 => Ok(queue.pop_front().unwrap()),
            Some((_, queue)) => Ok(queue.front().unwrap().clone()),
            None => Ok(CommandResult::new(127, "", "command not found")),
        }
    }

    async fn run_with_timeout(
        &self,
        cmd: &str,
        _timeout: Duration,
    ) -> Result<CommandResult, ExecError> {
        self.run(cmd).await
    }

    fn executor_type(&self) -> &'static str {
        "mock"
    }
}

/// Executor whose commands never start
pub struct BrokenExecutor;

#[async_trait]
impl RemoteExecutor for BrokenExecutor {
    async fn run(&self, _cmd: &str) -> Result<CommandResult, ExecError> {
        Err(ExecError::SpawnError("no such host".to_string()))
    }

    async fn run_with_timeout(
        &self,
        cmd: &str,
        _timeout: Duration,
    ) -> Result<CommandResult, ExecError> {
        self.run(cmd).await
    }

    fn executor_type(&self) -> &'static str {
        "broken"
    }
}

pub const DEBIAN_OS_RELEASE: &str = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n";
pub const RHEL_OS_RELEASE: &str = "NAME=\"CentOS Linux\"\nID=\"centos\"\nID_LIKE=\"rhel fedora\"\n";
pub const SUSE_OS_RELEASE: &str = "NAME=\"SLES\"\nID=\"sles\"\nID_LIKE=\"suse\"\n";

pub const APT_SIMULATION: &str = "Reading package lists...
Inst vim [2:8.0-1] (2:8.1-1 Ubuntu:18.04/bionic [amd64])
Conf vim (2:8.1-1 Ubuntu:18.04/bionic [amd64])
";

pub const APT_NOTHING: &str =
    "Reading package lists...\n0 upgraded, 0 newly installed, 0 to remove and 0 not upgraded.\n";

pub const YUM_OUTPUT: &str = "Loaded plugins: fastestmirror
{\"available\":[{\"name\":\"bash\",\"version\":\"4.4-20\",\"arch\":\"x86_64\",\"repository\":\"base\"}]}
";

pub const ZYPPER_UPDATES: &str = r#"<?xml version='1.0'?>
<stream>
<update-status version="0.6">
<update-list>
<update kind="package" name="zypper" edition="1.14-1"/>
<update kind="package" name="curl" edition="8.0.1-1.1" arch="x86_64"/>
</update-list>
<blocked-update-list>
<update kind="package" name="kernel-default" edition="5.14.21-1.1" arch="x86_64"/>
</blocked-update-list>
</update-status>
</stream>
"#;

pub const ZYPPER_PATCHES: &str = r#"<?xml version='1.0'?>
<stream>
<update-status version="0.6">
<update-list>
<update kind="patch" name="SUSE-2023-1234" edition="1" arch="noarch" category="security" severity="critical"/>
</update-list>
</update-status>
</stream>
"#;

pub const ZYPPER_NOTHING: &str = r#"<?xml version='1.0'?>
<stream>
<update-status version="0.6">
<update-list>
</update-list>
</update-status>
</stream>
"#;
