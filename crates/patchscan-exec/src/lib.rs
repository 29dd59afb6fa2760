//! patchscan-exec: Command execution abstraction
//!
//! Provides the executor trait the inspector runs package manager queries
//! through, a local implementation, and a quoting-safe command builder.

pub mod command;
pub mod error;
pub mod local;
pub mod result;
pub mod traits;

pub use command::ShellCommand;
pub use error::ExecError;
pub use local::LocalExecutor;
pub use result::CommandResult;
pub use traits::RemoteExecutor;
