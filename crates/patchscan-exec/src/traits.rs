//! Command executor trait

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::CommandResult;

/// Runs a shell command on the inspected host
///
/// A non-zero exit status is not an error at this level: it is reported in
/// [`CommandResult::status`] and interpreted by the caller.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run a command to completion
    ///
    /// # Errors
    /// Returns `ExecError` if the command could not be started or its output
    /// could not be collected.
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError>;

    /// Run a command, giving up after `timeout`
    ///
    /// # Errors
    /// Returns `ExecError::Timeout` if the command does not finish in time.
    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<CommandResult, ExecError>;

    /// Short executor name used in logs
    fn executor_type(&self) -> &'static str;
}
