//! Backend trait over the VIX control library.
//!
//! Every method performs one blocking VIX job: it starts the job, waits for
//! completion and releases the job handle before returning. Callers run these
//! methods on the blocking thread pool (see [`crate::vix::job`]).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::path::Path;

/// An opaque VIX handle (host connection, VM or job).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VixHandle(pub i32);

impl VixHandle {
    /// The library's invalid-handle sentinel (`VIX_INVALID_HANDLE`).
    pub const INVALID: VixHandle = VixHandle(0);

    /// Returns true unless this is the sentinel.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for VixHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A VIX result code (`VixError`, a 64-bit value).
///
/// The low 16 bits carry the error number; the upper bits carry flags and
/// extra detail the library packs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VixCode(pub u64);

impl VixCode {
    /// `VIX_OK`
    pub const OK: VixCode = VixCode(0);
    /// `VIX_E_FAIL`
    pub const FAIL: VixCode = VixCode(1);
    /// `VIX_E_INVALID_ARG`
    pub const INVALID_ARG: VixCode = VixCode(3);
    /// `VIX_E_FILE_NOT_FOUND`
    pub const FILE_NOT_FOUND: VixCode = VixCode(4);
    /// `VIX_E_HOST_CONNECTION_LOST`
    pub const HOST_CONNECTION_LOST: VixCode = VixCode(3008);
    /// `VIX_E_TIMEOUT_WAITING_FOR_TOOLS`
    pub const TIMEOUT_WAITING_FOR_TOOLS: VixCode = VixCode(3015);
    /// `VIX_E_GUEST_USER_PERMISSIONS`
    pub const GUEST_USER_PERMISSIONS: VixCode = VixCode(3016);
    /// `VIX_E_VM_NOT_FOUND`
    pub const VM_NOT_FOUND: VixCode = VixCode(4000);
    /// `VIX_E_CANNOT_CONNECT_TO_HOST`
    pub const CANNOT_CONNECT_TO_HOST: VixCode = VixCode(18000);

    /// Returns true for `VIX_OK`.
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    /// The error number without flag bits (`VIX_ERROR_CODE`).
    #[must_use]
    pub fn error_number(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl fmt::Display for VixCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_number())
    }
}

/// Which VMware product the host connection targets (`VixServiceProvider`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceProvider {
    /// VMware Server 1.0
    Server,
    /// VMware Workstation
    #[default]
    Workstation,
    /// VMware Player
    Player,
    /// vCenter / ESX
    ViServer,
    /// Workstation shared VMs
    WorkstationShared,
}

impl ServiceProvider {
    /// The `VIX_SERVICEPROVIDER_*` constant.
    #[must_use]
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Server => 2,
            Self::Workstation => 3,
            Self::Player => 4,
            Self::ViServer => 10,
            Self::WorkstationShared => 11,
        }
    }
}

/// Parameters for a host connection job.
#[derive(Clone, PartialEq, Eq)]
pub struct HostConnectParams {
    /// Host name; empty for the local host
    pub host_name: String,
    /// Port; 0 lets the library choose
    pub port: i32,
    /// Host user name
    pub user_name: String,
    /// Host password
    pub password: String,
    /// Product to connect to
    pub provider: ServiceProvider,
    /// Whether to pass `VIX_HOSTOPTION_VERIFY_SSL_CERT`
    pub verify_ssl: bool,
}

impl Debug for HostConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConnectParams")
            .field("host_name", &self.host_name)
            .field("port", &self.port)
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .field("provider", &self.provider)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

/// Options for `VixVM_RunProgramInGuest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunProgramOptions {
    /// `VIX_RUNPROGRAM_RETURN_IMMEDIATELY`: the job completes once the program
    /// has started instead of when it exits.
    pub return_immediately: bool,
}

impl RunProgramOptions {
    /// The raw option bits.
    #[must_use]
    pub fn as_raw(self) -> i32 {
        if self.return_immediately {
            0x0001
        } else {
            0
        }
    }
}

/// Blocking access to the VIX control library.
///
/// Errors are returned as raw [`VixCode`]s; turning them into text is the job
/// of [`crate::vix::translate`].
pub trait VixBackend: Send + Sync + Debug {
    /// `VixHost_Connect`; returns the host handle.
    fn connect_host(&self, params: &HostConnectParams) -> Result<VixHandle, VixCode>;

    /// `VixHost_OpenVM`; returns the VM handle.
    fn open_vm(&self, host: VixHandle, vmx_path: &str) -> Result<VixHandle, VixCode>;

    /// `VixVM_WaitForToolsInGuest` with a timeout in seconds.
    fn wait_for_tools(&self, vm: VixHandle, timeout_secs: i32) -> Result<(), VixCode>;

    /// `VixVM_LoginInGuest`
    fn login_in_guest(&self, vm: VixHandle, user: &str, password: &str) -> Result<(), VixCode>;

    /// `VixVM_RunProgramInGuest`
    fn run_program_in_guest(
        &self,
        vm: VixHandle,
        program: &str,
        args: &str,
        options: RunProgramOptions,
    ) -> Result<(), VixCode>;

    /// `VixVM_FileExistsInGuest`; returns the job's object-exists result.
    fn file_exists_in_guest(&self, vm: VixHandle, guest_path: &str) -> Result<bool, VixCode>;

    /// `VixVM_CopyFileFromGuestToHost`
    fn copy_file_from_guest_to_host(
        &self,
        vm: VixHandle,
        guest_path: &str,
        host_path: &Path,
    ) -> Result<(), VixCode>;

    /// `VixVM_DeleteFileInGuest`
    fn delete_file_in_guest(&self, vm: VixHandle, guest_path: &str) -> Result<(), VixCode>;

    /// `Vix_GetErrorText`, copied out before the library buffer is freed.
    fn error_text(&self, code: VixCode) -> Option<String>;

    /// `Vix_ReleaseHandle`
    fn release_handle(&self, handle: VixHandle);

    /// `VixHost_Disconnect`
    fn disconnect_host(&self, host: VixHandle);
}
