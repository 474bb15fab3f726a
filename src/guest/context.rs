//! The session owner shared by all tools.

use super::connector::{establish, ConnectRequest};
use super::runner::CommandRunner;
use super::session::{Session, SessionInfo};
use super::staging::StagingDirs;
use crate::config::VixToolsConfig;
use crate::error::GuestError;
use crate::vix::VixBackend;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Command used to list guest processes.
pub const LIST_PROCESSES_COMMAND: &str = "ps aux";

/// Owns the backend, configuration and the current session.
///
/// Connect, disconnect and command runs take the session lock, so a session
/// is never replaced while a command is using its handles.
#[derive(Debug)]
pub struct GuestContext {
    backend: Arc<dyn VixBackend>,
    config: VixToolsConfig,
    session: Mutex<Option<Session>>,
}

impl GuestContext {
    /// Creates a context with no session.
    #[must_use]
    pub fn new(backend: Arc<dyn VixBackend>, config: VixToolsConfig) -> Self {
        Self {
            backend,
            config,
            session: Mutex::new(None),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &VixToolsConfig {
        &self.config
    }

    /// Staging directories from tool arguments, falling back to configuration.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for an empty guest directory.
    pub fn staging_dirs(
        &self,
        guest_dir: Option<String>,
        host_dir: Option<String>,
    ) -> Result<StagingDirs, GuestError> {
        let defaults = StagingDirs::from_config(&self.config.guest);
        let guest_dir = guest_dir.unwrap_or(defaults.guest_dir);
        if guest_dir.trim().is_empty() {
            return Err(GuestError::invalid_argument(
                "guest_temp_path",
                "cannot be empty",
            ));
        }
        let host_dir = match host_dir {
            Some(dir) if !dir.trim().is_empty() => dir.into(),
            _ => defaults.host_dir,
        };
        Ok(StagingDirs::new(guest_dir, host_dir))
    }

    /// Connects and logs in, replacing any existing session.
    ///
    /// The request is validated first; an invalid request leaves the
    /// previous session in place. Otherwise the previous session's handles
    /// are released before the new connection is attempted, and on failure
    /// no session remains.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for a request without a VM path or
    /// guest credentials, else the first failing step's error.
    pub async fn connect_and_login(
        &self,
        request: &ConnectRequest,
    ) -> Result<SessionInfo, GuestError> {
        request.validate_session()?;

        let mut slot = self.session.lock().await;
        if let Some(previous) = slot.take() {
            tracing::info!(session_id = %previous.id(), "Releasing previous session");
            drop(previous);
        }

        let session = establish(
            &self.backend,
            &self.config.host,
            &self.config.guest,
            request,
        )
        .await?;
        let info = session.info();
        tracing::info!(
            session_id = %info.session_id,
            vmx = %info.vmx_path,
            "Session established"
        );
        *slot = Some(session);
        Ok(info)
    }

    /// Runs the full connect sequence and releases everything again.
    ///
    /// The stored session is left untouched. Guest credentials are passed
    /// to the login step as given, so the guest decides whether they work.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    pub async fn check_connection(&self, request: &ConnectRequest) -> Result<(), GuestError> {
        request.validate_target()?;
        let session = establish(
            &self.backend,
            &self.config.host,
            &self.config.guest,
            request,
        )
        .await?;
        tracing::info!(session_id = %session.id(), "Guest connection check passed");
        Ok(())
    }

    /// Releases the current session, returning what it was.
    pub async fn disconnect(&self) -> Option<SessionInfo> {
        let previous = self.session.lock().await.take()?;
        let info = previous.info();
        drop(previous);
        tracing::info!(session_id = %info.session_id, "Session closed");
        Some(info)
    }

    /// Describes the current session, if any.
    pub async fn session_info(&self) -> Option<SessionInfo> {
        self.session.lock().await.as_ref().map(Session::info)
    }

    /// Runs `command` in the guest and returns its output.
    ///
    /// # Errors
    ///
    /// Fails without a valid session, for an empty command, or when any
    /// staging step fails. When `timeout` elapses the error names the step
    /// that was running.
    pub async fn exec_command(
        &self,
        command: &str,
        dirs: &StagingDirs,
        timeout: Option<Duration>,
    ) -> Result<String, GuestError> {
        self.run_staged(command, dirs, "cmd_output", timeout).await
    }

    /// Runs `ps aux` in the guest.
    ///
    /// # Errors
    ///
    /// Same as [`GuestContext::exec_command`].
    pub async fn list_processes(&self, dirs: &StagingDirs) -> Result<String, GuestError> {
        self.run_staged(LIST_PROCESSES_COMMAND, dirs, "ps_aux_output", None)
            .await
    }

    async fn run_staged(
        &self,
        command: &str,
        dirs: &StagingDirs,
        kind: &str,
        timeout: Option<Duration>,
    ) -> Result<String, GuestError> {
        let slot = self.session.lock().await;
        let session = slot
            .as_ref()
            .filter(|session| session.is_valid())
            .ok_or_else(GuestError::no_active_session)?;

        if command.trim().is_empty() {
            return Err(GuestError::invalid_argument("command", "cannot be empty"));
        }

        tracing::info!(session_id = %session.id(), kind, "Running command in guest");
        CommandRunner::new(&self.backend, &self.config.guest, session.vm_guard())
            .with_timeout(timeout)
            .run(command, dirs, kind)
            .await
    }
}
