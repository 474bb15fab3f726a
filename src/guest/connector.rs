//! Host connection, VM open, tools wait and guest login.

use super::session::{GuestCredentials, HostConnection, Session, VmHandle};
use crate::config::{GuestConfig, HostConfig};
use crate::error::{GuestError, GuestStep};
use crate::vix::{run_blocking, HostConnectParams, VixBackend};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Everything needed to reach a guest.
///
/// Field names are snake_case; the camelCase spellings are accepted too.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectRequest {
    /// Host name; empty for the local host
    #[serde(default, alias = "hostName")]
    pub host_name: String,
    /// Host port; 0 lets the library choose
    #[serde(default, alias = "hostPort")]
    pub host_port: i32,
    /// Host user name
    #[serde(default, alias = "hostUserName")]
    pub host_user_name: String,
    /// Host password
    #[serde(default, alias = "hostPassword")]
    pub host_password: String,
    /// Path of the VM's `.vmx` file
    #[serde(alias = "vmxFilePath")]
    pub vmx_file_path: String,
    /// Guest user name
    #[serde(alias = "guestUserName")]
    pub guest_user_name: String,
    /// Guest password
    #[serde(alias = "guestPassword")]
    pub guest_password: String,
}

impl ConnectRequest {
    /// Rejects requests that cannot reach a VM.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error naming the first bad field.
    pub fn validate_target(&self) -> Result<(), GuestError> {
        if self.vmx_file_path.trim().is_empty() {
            return Err(GuestError::invalid_argument(
                "vmx_file_path",
                "cannot be empty",
            ));
        }
        if self.host_port < 0 {
            return Err(GuestError::invalid_argument(
                "host_port",
                "cannot be negative",
            ));
        }
        Ok(())
    }

    /// Rejects requests that cannot produce a session usable for commands.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error naming the first bad field.
    pub fn validate_session(&self) -> Result<(), GuestError> {
        self.validate_target()?;
        if self.guest_user_name.is_empty() {
            return Err(GuestError::invalid_argument(
                "guest_user_name",
                "cannot be empty",
            ));
        }
        if self.guest_password.is_empty() {
            return Err(GuestError::invalid_argument(
                "guest_password",
                "cannot be empty",
            ));
        }
        Ok(())
    }

    fn host_params(&self, host: &HostConfig) -> HostConnectParams {
        HostConnectParams {
            host_name: self.host_name.clone(),
            port: self.host_port,
            user_name: self.host_user_name.clone(),
            password: self.host_password.clone(),
            provider: host.service_provider,
            verify_ssl: host.verify_ssl,
        }
    }
}

impl fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("host_name", &self.host_name)
            .field("host_port", &self.host_port)
            .field("host_user_name", &self.host_user_name)
            .field("host_password", &"<redacted>")
            .field("vmx_file_path", &self.vmx_file_path)
            .field("guest_user_name", &self.guest_user_name)
            .field("guest_password", &"<redacted>")
            .finish()
    }
}

/// Runs the four connection steps in order.
///
/// The first failing step ends the attempt; handles opened by earlier steps
/// are released before the error is returned. Each job wraps the handle it
/// opens in its guard, so a job that outlives its deadline releases it too.
///
/// # Errors
///
/// Returns the failing step's error with the library's text for its code.
pub(crate) async fn establish(
    backend: &Arc<dyn VixBackend>,
    host_config: &HostConfig,
    guest_config: &GuestConfig,
    request: &ConnectRequest,
) -> Result<Session, GuestError> {
    let job_timeout = guest_config.job_timeout();

    tracing::info!(
        host = %request.host_name,
        port = request.host_port,
        provider = ?host_config.service_provider,
        "Connecting to host"
    );
    let params = request.host_params(host_config);
    let job_backend = backend.clone();
    let host = run_blocking(job_timeout, move || {
        let handle = job_backend.connect_host(&params)?;
        Ok(Arc::new(HostConnection::new(job_backend, handle)))
    })
    .await
    .map_err(|failure| failure.into_guest_error(backend.as_ref(), GuestStep::HostConnect))?;

    tracing::info!(vmx = %request.vmx_file_path, "Opening VM");
    let vmx_path = request.vmx_file_path.clone();
    let job_backend = backend.clone();
    let vm = run_blocking(job_timeout, move || {
        let handle = job_backend.open_vm(host.handle(), &vmx_path)?;
        Ok(Arc::new(VmHandle::new(job_backend, handle, host)))
    })
    .await
    .map_err(|failure| failure.into_guest_error(backend.as_ref(), GuestStep::VmOpen))?;

    let tools_timeout = i32::try_from(guest_config.tools_timeout_secs).unwrap_or(i32::MAX);
    tracing::info!(timeout_secs = tools_timeout, "Waiting for VMware Tools");
    let job_vm = vm.clone();
    let job_backend = backend.clone();
    run_blocking(guest_config.tools_job_timeout(), move || {
        job_backend.wait_for_tools(job_vm.handle(), tools_timeout)
    })
    .await
    .map_err(|failure| failure.into_guest_error(backend.as_ref(), GuestStep::ToolsWait))?;

    tracing::info!(user = %request.guest_user_name, "Logging in to guest");
    let credentials = GuestCredentials {
        user: request.guest_user_name.clone(),
        password: request.guest_password.clone(),
    };
    let login = credentials.clone();
    let job_vm = vm.clone();
    let job_backend = backend.clone();
    run_blocking(job_timeout, move || {
        job_backend.login_in_guest(job_vm.handle(), &login.user, &login.password)
    })
    .await
    .map_err(|failure| failure.into_guest_error(backend.as_ref(), GuestStep::GuestLogin))?;

    Ok(Session::new(
        vm,
        credentials,
        request.host_name.clone(),
        request.vmx_file_path.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vix::{StubVix, VixCode, VixOp};
    use serde_json::json;
    use std::time::Duration;

    fn request() -> ConnectRequest {
        ConnectRequest {
            host_name: String::new(),
            host_port: 0,
            host_user_name: String::new(),
            host_password: String::new(),
            vmx_file_path: "/vms/ubuntu/ubuntu.vmx".to_string(),
            guest_user_name: "ops".to_string(),
            guest_password: "secret".to_string(),
        }
    }

    async fn connect(stub: &Arc<StubVix>) -> Result<Session, GuestError> {
        let backend: Arc<dyn VixBackend> = stub.clone();
        establish(
            &backend,
            &HostConfig::default(),
            &GuestConfig::default(),
            &request(),
        )
        .await
    }

    #[test]
    fn request_accepts_camel_case_names() {
        let parsed: ConnectRequest = serde_json::from_value(json!({
            "hostName": "esx01",
            "hostPort": 443,
            "hostUserName": "root",
            "hostPassword": "pw",
            "vmxFilePath": "[ds1] a/a.vmx",
            "guestUserName": "ops",
            "guestPassword": "secret"
        }))
        .unwrap();
        assert_eq!(parsed.host_name, "esx01");
        assert_eq!(parsed.host_port, 443);
        assert_eq!(parsed.vmx_file_path, "[ds1] a/a.vmx");
    }

    #[test]
    fn session_requires_guest_credentials() {
        let mut req = request();
        req.guest_password.clear();
        assert!(req.validate_target().is_ok());

        let err = req.validate_session().unwrap_err();
        assert_eq!(err.kind_tag(), "invalid_argument");
        assert!(err.to_string().contains("guest_password"));
    }

    #[test]
    fn target_requires_vmx_path_and_port() {
        let mut req = request();
        req.host_port = -1;
        assert!(req.validate_target().unwrap_err().to_string().contains("host_port"));

        req.host_port = 0;
        req.vmx_file_path = "  ".to_string();
        assert!(req
            .validate_target()
            .unwrap_err()
            .to_string()
            .contains("vmx_file_path"));
    }

    #[test]
    fn request_debug_hides_passwords() {
        let mut req = request();
        req.host_password = "host-pw".to_string();
        let debug = format!("{req:?}");
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("host-pw"));
    }

    #[tokio::test]
    async fn successful_connect_runs_all_steps() {
        let stub = Arc::new(StubVix::new());
        let session = connect(&stub).await.unwrap();

        assert!(session.is_valid());
        assert_eq!(stub.count(VixOp::ConnectHost), 1);
        assert_eq!(stub.count(VixOp::OpenVm), 1);
        assert_eq!(stub.count(VixOp::WaitForTools), 1);
        assert_eq!(stub.count(VixOp::LoginInGuest), 1);
        assert_eq!(stub.live_handles(), 2);
    }

    #[tokio::test]
    async fn tools_wait_gets_configured_timeout() {
        let stub = Arc::new(StubVix::new());
        let _session = connect(&stub).await.unwrap();

        let waited = stub.calls().into_iter().any(|call| {
            matches!(
                call,
                crate::vix::StubCall::WaitForTools {
                    timeout_secs: 600,
                    ..
                }
            )
        });
        assert!(waited);
    }

    #[tokio::test]
    async fn host_failure_short_circuits() {
        let stub = Arc::new(
            StubVix::new().with_failure(VixOp::ConnectHost, VixCode::CANNOT_CONNECT_TO_HOST),
        );
        let err = connect(&stub).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to connect to host: Cannot connect to host"
        );
        assert_eq!(stub.count(VixOp::OpenVm), 0);
        assert_eq!(stub.live_handles(), 0);
    }

    #[tokio::test]
    async fn login_failure_releases_opened_handles() {
        let stub = Arc::new(
            StubVix::new().with_failure(VixOp::LoginInGuest, VixCode::GUEST_USER_PERMISSIONS),
        );
        let err = connect(&stub).await.unwrap_err();

        assert!(err.to_string().starts_with("Failed to login to guest: "));
        assert_eq!(err.kind_tag(), "guest_login");
        assert_eq!(stub.live_handles(), 0);
        assert_eq!(stub.stale_releases(), 0);
    }

    #[tokio::test]
    async fn vm_open_failure_disconnects_host() {
        let stub =
            Arc::new(StubVix::new().with_failure(VixOp::OpenVm, VixCode::VM_NOT_FOUND));
        let err = connect(&stub).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to open VM: The virtual machine cannot be found"
        );
        assert_eq!(stub.count(VixOp::WaitForTools), 0);
        assert_eq!(stub.live_handles(), 0);
    }

    #[tokio::test]
    async fn abandoned_connect_releases_handles_after_the_job() {
        let stub = Arc::new(StubVix::new().with_job_delay(Duration::from_millis(200)));
        let backend: Arc<dyn VixBackend> = stub.clone();
        let config = GuestConfig::default();

        // Dropped while the VM is opening; the handle it returns late is still released.
        let host = HostConfig::default();
        let req = request();
        let attempt = establish(&backend, &host, &config, &req);
        let _ = tokio::time::timeout(Duration::from_millis(300), attempt).await;
        assert_eq!(stub.count(VixOp::OpenVm), 1);

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(stub.live_handles(), 0);
        assert_eq!(stub.stale_releases(), 0);
    }

    #[tokio::test]
    async fn tools_timeout_is_reported_as_tools_wait() {
        let stub = Arc::new(
            StubVix::new().with_failure(VixOp::WaitForTools, VixCode::TIMEOUT_WAITING_FOR_TOOLS),
        );
        let err = connect(&stub).await.unwrap_err();

        assert!(err.to_string().starts_with("Failed to wait for tools: "));
        assert_eq!(stub.count(VixOp::LoginInGuest), 0);
    }
}
