//! Command invocation shared by the fetchers

use std::sync::Arc;
use std::time::Duration;

use patchscan_exec::{CommandResult, RemoteExecutor, ShellCommand};
use tracing::{debug, instrument};

use crate::config::FetcherConfig;
use crate::error::FetchError;

/// Runs fetcher commands on one host
#[derive(Clone)]
pub struct HostRunner {
    executor: Arc<dyn RemoteExecutor>,
    timeout: Option<Duration>,
    use_sudo: bool,
}

impl HostRunner {
    /// Create a runner over `executor`
    pub fn new(executor: Arc<dyn RemoteExecutor>, config: &FetcherConfig) -> Self {
        Self {
            executor,
            timeout: config.command_timeout(),
            use_sudo: config.use_sudo,
        }
    }

    /// Whether package manager commands get a sudo prefix
    #[must_use]
    pub fn use_sudo(&self) -> bool {
        self.use_sudo
    }

    /// Run a command and return its result whatever the exit status
    ///
    /// # Errors
    /// Returns `FetchError::ExecutionError` if the executor could not run it.
    #[instrument(
        skip(self, cmd),
        fields(program = %cmd.program(), executor = self.executor.executor_type())
    )]
    pub async fn run(&self, cmd: &ShellCommand) -> Result<CommandResult, FetchError> {
        let rendered = cmd.render();
        debug!(command = %rendered, "running package manager command");

        let result = match self.timeout {
            Some(timeout) => self.executor.run_with_timeout(&rendered, timeout).await,
            None => self.executor.run(&rendered).await,
        };

        result.map_err(|e| FetchError::ExecutionError(e.to_string()))
    }

    /// Run a command, treating a non-zero exit status as a failure
    ///
    /// # Errors
    /// Returns `FetchError::CommandFailed` on a non-zero exit status.
    pub async fn run_checked(&self, cmd: &ShellCommand) -> Result<CommandResult, FetchError> {
        let result = self.run(cmd).await?;
        if !result.success() {
            return Err(command_failed(&result));
        }
        Ok(result)
    }
}

/// Build a `CommandFailed` error from a finished command
pub(crate) fn command_failed(result: &CommandResult) -> FetchError {
    FetchError::CommandFailed {
        status: result.status,
        stderr: result.stderr.trim().to_string(),
    }
}
