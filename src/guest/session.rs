//! Session state and the handle guards it owns.

use crate::types::SessionId;
use crate::vix::{VixBackend, VixHandle};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A host connection, disconnected when dropped.
pub(crate) struct HostConnection {
    backend: Arc<dyn VixBackend>,
    handle: VixHandle,
}

impl HostConnection {
    pub(crate) fn new(backend: Arc<dyn VixBackend>, handle: VixHandle) -> Self {
        Self { backend, handle }
    }

    pub(crate) fn handle(&self) -> VixHandle {
        self.handle
    }
}

impl Drop for HostConnection {
    fn drop(&mut self) {
        if self.handle.is_valid() {
            tracing::debug!(handle = %self.handle, "Disconnecting from host");
            self.backend.disconnect_host(self.handle);
        }
    }
}

impl fmt::Debug for HostConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostConnection").field(&self.handle).finish()
    }
}

/// An open VM, released when the last reference drops.
///
/// Holds its host connection, so the host outlives the VM handle. Blocking
/// jobs clone the `Arc<VmHandle>` they run against; a session dropped while
/// a job is still inside the library is released when that job returns.
pub(crate) struct VmHandle {
    backend: Arc<dyn VixBackend>,
    handle: VixHandle,
    host: Arc<HostConnection>,
}

impl VmHandle {
    pub(crate) fn new(
        backend: Arc<dyn VixBackend>,
        handle: VixHandle,
        host: Arc<HostConnection>,
    ) -> Self {
        Self {
            backend,
            handle,
            host,
        }
    }

    pub(crate) fn handle(&self) -> VixHandle {
        self.handle
    }

    pub(crate) fn host(&self) -> &HostConnection {
        &self.host
    }
}

impl Drop for VmHandle {
    fn drop(&mut self) {
        if self.handle.is_valid() {
            tracing::debug!(handle = %self.handle, "Releasing VM handle");
            self.backend.release_handle(self.handle);
        }
    }
}

impl fmt::Debug for VmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VmHandle")
            .field("handle", &self.handle)
            .field("host", &self.host)
            .finish()
    }
}

/// Guest login credentials kept for the session's lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct GuestCredentials {
    /// Guest user name
    pub user: String,
    /// Guest password
    pub password: String,
}

impl GuestCredentials {
    /// Returns true when both fields are set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for GuestCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An established host connection, open VM and guest login.
///
/// Dropping a session releases the VM handle, then disconnects the host,
/// once no job is using them any more.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    vm: Arc<VmHandle>,
    credentials: GuestCredentials,
    host_name: String,
    vmx_path: String,
}

impl Session {
    pub(crate) fn new(
        vm: Arc<VmHandle>,
        credentials: GuestCredentials,
        host_name: impl Into<String>,
        vmx_path: impl Into<String>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            vm,
            credentials,
            host_name: host_name.into(),
            vmx_path: vmx_path.into(),
        }
    }

    /// The session identifier.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The open VM's handle.
    #[must_use]
    pub fn vm(&self) -> VixHandle {
        self.vm.handle()
    }

    /// The host connection's handle.
    #[must_use]
    pub fn host(&self) -> VixHandle {
        self.vm.host().handle()
    }

    /// A reference to the VM guard for a job to hold while it runs.
    pub(crate) fn vm_guard(&self) -> Arc<VmHandle> {
        self.vm.clone()
    }

    /// Both handles are live and guest credentials are present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.vm().is_valid()
            && self.host().is_valid()
            && self.credentials.is_complete()
    }

    /// A loggable summary of the session.
    #[must_use]
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id.to_string(),
            host_name: self.host_name.clone(),
            vmx_path: self.vmx_path.clone(),
            guest_user: self.credentials.user.clone(),
        }
    }
}

/// Public description of a session, without secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    /// Session identifier
    pub session_id: String,
    /// Host the session is connected to; empty for the local host
    pub host_name: String,
    /// Path of the VM's configuration file
    pub vmx_path: String,
    /// User logged in to the guest
    pub guest_user: String,
}
