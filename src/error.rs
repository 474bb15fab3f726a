//! Custom error types for vix-guest-tools.
//!
//! Each error type implements Display, Debug, Clone, PartialEq, Eq, and
//! std::error::Error. No external error crates (anyhow, thiserror, eyre) are
//! used in the library.

use crate::vix::VixCode;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The library-backed step a guest operation failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuestStep {
    /// Connecting to the virtualization host
    HostConnect,
    /// Opening the virtual machine
    VmOpen,
    /// Waiting for VMware Tools in the guest
    ToolsWait,
    /// Logging in to the guest
    GuestLogin,
    /// Starting the command in the guest
    CommandExecution,
    /// Checking that the output file exists
    OutputCheck,
    /// Copying the output file to the host
    FileCopy,
    /// Deleting the output file in the guest
    GuestCleanup,
}

impl GuestStep {
    /// The message prefix used when this step fails.
    #[must_use]
    pub fn failure_prefix(self) -> &'static str {
        match self {
            Self::HostConnect => "Failed to connect to host",
            Self::VmOpen => "Failed to open VM",
            Self::ToolsWait => "Failed to wait for tools",
            Self::GuestLogin => "Failed to login to guest",
            Self::CommandExecution => "Failed to execute command in guest",
            Self::OutputCheck => "Output file not found or check failed",
            Self::FileCopy => "Failed to copy command output file",
            Self::GuestCleanup => "Failed to delete guest output file",
        }
    }

    /// Machine-readable tag for this step.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::HostConnect => "host_connect",
            Self::VmOpen => "vm_open",
            Self::ToolsWait => "tools_wait",
            Self::GuestLogin => "guest_login",
            Self::CommandExecution => "command_execution",
            Self::OutputCheck => "output_check",
            Self::FileCopy => "file_copy",
            Self::GuestCleanup => "guest_cleanup",
        }
    }
}

impl fmt::Display for GuestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Errors that can occur while connecting to or running commands in a guest.
///
/// This type uses Box<GuestErrorKind> to keep the error size small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestError {
    kind: Box<GuestErrorKind>,
}

/// Specific guest error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuestErrorKind {
    /// No session has been established with connect-and-login
    NoActiveSession,
    /// A VIX job completed with a non-OK result
    Library {
        /// The step that failed
        step: GuestStep,
        /// The raw result code
        code: VixCode,
        /// The library's description of the code
        text: String,
    },
    /// The command's output file never appeared in the guest
    OutputMissing {
        /// Guest path that was polled
        guest_path: String,
    },
    /// The copied output file could not be read on the host
    HostRead {
        /// Host path of the copied file
        path: PathBuf,
        /// Why the read failed
        reason: String,
    },
    /// A VIX job or the whole run exceeded its deadline
    Timeout {
        /// The step that was waiting
        step: GuestStep,
        /// The deadline that was exceeded
        duration: Duration,
    },
    /// A caller-supplied argument was rejected
    InvalidArgument {
        /// The offending argument
        field: String,
        /// Why it was rejected
        reason: String,
    },
    /// Unexpected failure (for example a panicked blocking job)
    Internal {
        /// Description of the failure
        message: String,
    },
}

impl GuestError {
    /// Creates a new GuestError with the given kind.
    #[must_use]
    pub fn new(kind: GuestErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    /// Returns a reference to the error kind.
    #[must_use]
    pub fn kind(&self) -> &GuestErrorKind {
        &self.kind
    }

    /// Creates a no-active-session error.
    #[must_use]
    pub fn no_active_session() -> Self {
        Self::new(GuestErrorKind::NoActiveSession)
    }

    /// Creates a library failure for `step`.
    #[must_use]
    pub fn library(step: GuestStep, code: VixCode, text: impl Into<String>) -> Self {
        Self::new(GuestErrorKind::Library {
            step,
            code,
            text: text.into(),
        })
    }

    /// Creates an output-missing error.
    #[must_use]
    pub fn output_missing(guest_path: impl Into<String>) -> Self {
        Self::new(GuestErrorKind::OutputMissing {
            guest_path: guest_path.into(),
        })
    }

    /// Creates a host read error.
    #[must_use]
    pub fn host_read(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::new(GuestErrorKind::HostRead {
            path: path.into(),
            reason: reason.into(),
        })
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(step: GuestStep, duration: Duration) -> Self {
        Self::new(GuestErrorKind::Timeout { step, duration })
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(GuestErrorKind::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(GuestErrorKind::Internal {
            message: message.into(),
        })
    }

    /// The step this error belongs to, when it came from a library step.
    #[must_use]
    pub fn step(&self) -> Option<GuestStep> {
        match *self.kind {
            GuestErrorKind::Library { step, .. } | GuestErrorKind::Timeout { step, .. } => {
                Some(step)
            }
            GuestErrorKind::OutputMissing { .. } => Some(GuestStep::OutputCheck),
            _ => None,
        }
    }

    /// The raw VIX code, when the library reported one.
    #[must_use]
    pub fn vix_code(&self) -> Option<VixCode> {
        match *self.kind {
            GuestErrorKind::Library { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Machine-readable tag for the error kind.
    #[must_use]
    pub fn kind_tag(&self) -> &'static str {
        match self.kind.as_ref() {
            GuestErrorKind::NoActiveSession => "no_active_session",
            GuestErrorKind::Library { step, .. } => step.tag(),
            GuestErrorKind::OutputMissing { .. } => "output_missing",
            GuestErrorKind::HostRead { .. } => "host_read",
            GuestErrorKind::Timeout { .. } => "timeout",
            GuestErrorKind::InvalidArgument { .. } => "invalid_argument",
            GuestErrorKind::Internal { .. } => "internal",
        }
    }

    /// Returns true if no session was established.
    #[must_use]
    pub fn is_no_active_session(&self) -> bool {
        matches!(*self.kind, GuestErrorKind::NoActiveSession)
    }

    /// Returns true if a deadline was exceeded.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(*self.kind, GuestErrorKind::Timeout { .. })
    }
}

impl fmt::Display for GuestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_ref() {
            GuestErrorKind::NoActiveSession => {
                write!(f, "No active session. Please connect and login first.")
            }
            GuestErrorKind::Library { step, text, .. } => {
                write!(f, "{}: {}", step.failure_prefix(), text)
            }
            GuestErrorKind::OutputMissing { guest_path } => {
                write!(
                    f,
                    "{}: '{}' does not exist in the guest",
                    GuestStep::OutputCheck.failure_prefix(),
                    guest_path
                )
            }
            GuestErrorKind::HostRead { reason, .. } => {
                write!(f, "Reading command output file on host failed: {}", reason)
            }
            GuestErrorKind::Timeout { step, duration } => {
                write!(
                    f,
                    "{}: timed out after {} ms",
                    step.failure_prefix(),
                    duration.as_millis()
                )
            }
            GuestErrorKind::InvalidArgument { field, reason } => {
                write!(f, "invalid argument '{}': {}", field, reason)
            }
            GuestErrorKind::Internal { message } => {
                write!(f, "internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for GuestError {}

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field or source that was invalid
    pub field: String,
    /// Why it was invalid
    pub reason: String,
}

impl ConfigError {
    /// Creates a configuration error.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "configuration error in '{}': {}",
            self.field, self.reason
        )
    }
}

impl std::error::Error for ConfigError {}
