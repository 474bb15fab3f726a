//! Guest sessions and command execution.
//!
//! - **connector**: host connect, VM open, tools wait, guest login
//! - **session**: the established session and its handle guards
//! - **runner**: one command through guest and host staging files
//! - **staging**: staging file names and shell quoting
//! - **context**: [`GuestContext`], the session owner shared by the tools

mod connector;
mod context;
mod runner;
mod session;
mod staging;

pub use connector::ConnectRequest;
pub use context::{GuestContext, LIST_PROCESSES_COMMAND};
pub use session::{GuestCredentials, Session, SessionInfo};
pub use staging::{mkdir_args, redirect_args, shell_quote, StagedOutput, StagingDirs};
