//! Configuration types for vix-guest-tools.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::vix::ServiceProvider;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
///
/// This structure maps directly to the TOML configuration file format:
///
/// ```toml
/// [host]
/// service_provider = "workstation"
/// verify_ssl = true
///
/// [guest]
/// shell = "/bin/bash"
/// guest_temp_dir = "/tmp"
/// tools_timeout_secs = 600
///
/// [logging]
/// level = "debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VixToolsConfig {
    /// Host connection options.
    #[serde(default)]
    pub host: HostConfig,

    /// Guest session and command staging options.
    #[serde(default)]
    pub guest: GuestConfig,

    /// Log output options.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VixToolsConfig {
    /// Creates a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks values that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.guest.validate()
    }
}

/// Host connection options applied to every connect call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Which VMware product to connect to.
    pub service_provider: ServiceProvider,

    /// Verify the host's SSL certificate.
    pub verify_ssl: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            service_provider: ServiceProvider::Workstation,
            verify_ssl: true,
        }
    }
}

/// Default guest shell.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Default guest staging directory.
pub const DEFAULT_GUEST_TEMP_DIR: &str = "/tmp";

/// Seconds VMware Tools may take to come up in the guest.
pub const DEFAULT_TOOLS_TIMEOUT_SECS: u32 = 600;

/// Guest session and command staging options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestConfig {
    /// Program used to run commands in the guest.
    pub shell: String,

    /// Default guest directory for output files.
    pub guest_temp_dir: String,

    /// Default host directory for copied output files.
    ///
    /// Falls back to the system temp directory.
    pub host_temp_dir: Option<PathBuf>,

    /// Timeout handed to the library's wait-for-tools job.
    pub tools_timeout_secs: u32,

    /// Pause between starting a command and the first output check.
    pub output_settle_delay_ms: u64,

    /// How many times to check for the output file.
    pub output_poll_attempts: u32,

    /// Pause between output checks.
    pub output_poll_interval_ms: u64,

    /// Deadline for any single library job.
    pub job_timeout_secs: u64,
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            guest_temp_dir: DEFAULT_GUEST_TEMP_DIR.to_string(),
            host_temp_dir: None,
            tools_timeout_secs: DEFAULT_TOOLS_TIMEOUT_SECS,
            output_settle_delay_ms: 2000,
            output_poll_attempts: 5,
            output_poll_interval_ms: 500,
            job_timeout_secs: 900,
        }
    }
}

impl GuestConfig {
    /// Returns the host staging directory, resolving the default.
    #[must_use]
    pub fn host_temp_dir(&self) -> PathBuf {
        self.host_temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Returns the settle delay.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.output_settle_delay_ms)
    }

    /// Returns the pause between output checks.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.output_poll_interval_ms)
    }

    /// Returns the per-job deadline.
    #[must_use]
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Returns the deadline for the wait-for-tools job.
    ///
    /// Never shorter than the library-side timeout plus a minute.
    #[must_use]
    pub fn tools_job_timeout(&self) -> Duration {
        let library_side = Duration::from_secs(u64::from(self.tools_timeout_secs) + 60);
        self.job_timeout().max(library_side)
    }

    /// Sets the host staging directory.
    #[must_use]
    pub fn with_host_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.host_temp_dir = Some(dir.into());
        self
    }

    /// Sets the settle delay and poll interval, in milliseconds.
    #[must_use]
    pub fn with_polling(mut self, settle_delay_ms: u64, attempts: u32, interval_ms: u64) -> Self {
        self.output_settle_delay_ms = settle_delay_ms;
        self.output_poll_attempts = attempts;
        self.output_poll_interval_ms = interval_ms;
        self
    }

    /// Sets the per-job deadline.
    #[must_use]
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout_secs = timeout.as_secs();
        self
    }

    /// Checks the guest options.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shell.trim().is_empty() {
            return Err(ConfigError::new("guest.shell", "cannot be empty"));
        }
        if self.guest_temp_dir.trim().is_empty() {
            return Err(ConfigError::new("guest.guest_temp_dir", "cannot be empty"));
        }
        if self.output_poll_attempts == 0 {
            return Err(ConfigError::new(
                "guest.output_poll_attempts",
                "must be at least 1",
            ));
        }
        if self.job_timeout_secs == 0 {
            return Err(ConfigError::new(
                "guest.job_timeout_secs",
                "must be greater than zero",
            ));
        }
        if i32::try_from(self.tools_timeout_secs).is_err() {
            return Err(ConfigError::new(
                "guest.tools_timeout_secs",
                format!("must not exceed {}", i32::MAX),
            ));
        }
        Ok(())
    }
}
