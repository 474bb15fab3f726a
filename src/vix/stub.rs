//! Stub VIX backend.
//!
//! Simulates a host, one VM and the guest file system in process memory so
//! connector and runner behaviour can be exercised without a hypervisor.
//! This implementation does NOT talk to VMware.
//!
//! Guest programs are not executed. A `bash -c '<command> > <file> 2>&1'`
//! invocation writes the scripted output for `<command>` (empty by default)
//! to `<file>` in the simulated guest; copying that file to the host writes a
//! real host file.

use super::backend::{HostConnectParams, RunProgramOptions, VixBackend, VixCode, VixHandle};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// A library operation that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VixOp {
    /// `VixHost_Connect`
    ConnectHost,
    /// `VixHost_OpenVM`
    OpenVm,
    /// `VixVM_WaitForToolsInGuest`
    WaitForTools,
    /// `VixVM_LoginInGuest`
    LoginInGuest,
    /// `VixVM_RunProgramInGuest`
    RunProgram,
    /// `VixVM_FileExistsInGuest`
    FileExists,
    /// `VixVM_CopyFileFromGuestToHost`
    CopyFile,
    /// `VixVM_DeleteFileInGuest`
    DeleteFile,
}

/// One recorded call into the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubCall {
    ConnectHost { host_name: String, port: i32 },
    OpenVm { host: VixHandle, vmx_path: String },
    WaitForTools { vm: VixHandle, timeout_secs: i32 },
    LoginInGuest { vm: VixHandle, user: String },
    RunProgram { vm: VixHandle, program: String, args: String },
    FileExists { vm: VixHandle, guest_path: String },
    CopyFile { vm: VixHandle, guest_path: String, host_path: PathBuf },
    DeleteFile { vm: VixHandle, guest_path: String },
    ReleaseHandle(VixHandle),
    DisconnectHost(VixHandle),
}

impl StubCall {
    /// The scriptable operation this call belongs to, if any.
    #[must_use]
    pub fn op(&self) -> Option<VixOp> {
        match self {
            Self::ConnectHost { .. } => Some(VixOp::ConnectHost),
            Self::OpenVm { .. } => Some(VixOp::OpenVm),
            Self::WaitForTools { .. } => Some(VixOp::WaitForTools),
            Self::LoginInGuest { .. } => Some(VixOp::LoginInGuest),
            Self::RunProgram { .. } => Some(VixOp::RunProgram),
            Self::FileExists { .. } => Some(VixOp::FileExists),
            Self::CopyFile { .. } => Some(VixOp::CopyFile),
            Self::DeleteFile { .. } => Some(VixOp::DeleteFile),
            Self::ReleaseHandle(_) | Self::DisconnectHost(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct StubState {
    next_handle: i32,
    calls: Vec<StubCall>,
    failures: HashMap<VixOp, VixCode>,
    outputs: HashMap<String, String>,
    guest_files: HashMap<String, String>,
    live_handles: HashSet<VixHandle>,
    stale_releases: usize,
    skip_output_files: bool,
    skip_host_copies: bool,
    hidden_polls: usize,
    job_delay: Option<Duration>,
}

impl StubState {
    fn allocate(&mut self) -> VixHandle {
        self.next_handle += 1;
        let handle = VixHandle(self.next_handle);
        self.live_handles.insert(handle);
        handle
    }

    fn check(&self, op: VixOp) -> Result<(), VixCode> {
        match self.failures.get(&op) {
            Some(code) => Err(*code),
            None => Ok(()),
        }
    }

    fn free(&mut self, handle: VixHandle) {
        if !self.live_handles.remove(&handle) {
            self.stale_releases += 1;
        }
    }
}

/// In-memory VIX backend for tests and dry runs.
#[derive(Debug, Default)]
pub struct StubVix {
    state: Mutex<StubState>,
}

impl StubVix {
    /// Creates a stub where every operation succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call of `op` fail with `code`.
    #[must_use]
    pub fn with_failure(self, op: VixOp, code: VixCode) -> Self {
        self.lock().failures.insert(op, code);
        self
    }

    /// Scripts the output written when `command` runs in the guest.
    #[must_use]
    pub fn with_command_output(self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.lock().outputs.insert(command.into(), output.into());
        self
    }

    /// Guest programs start but never create their redirect file.
    #[must_use]
    pub fn without_output_files(self) -> Self {
        self.lock().skip_output_files = true;
        self
    }

    /// Guest-to-host copies report success without writing the host file.
    #[must_use]
    pub fn without_host_copies(self) -> Self {
        self.lock().skip_host_copies = true;
        self
    }

    /// The first `polls` existence checks report the file as missing.
    #[must_use]
    pub fn with_hidden_polls(self, polls: usize) -> Self {
        self.lock().hidden_polls = polls;
        self
    }

    /// Every job blocks for `delay` before completing.
    #[must_use]
    pub fn with_job_delay(self, delay: Duration) -> Self {
        self.lock().job_delay = Some(delay);
        self
    }

    /// Makes every later call of `op` fail with `code`.
    pub fn set_failure(&self, op: VixOp, code: VixCode) {
        self.lock().failures.insert(op, code);
    }

    /// Returns every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<StubCall> {
        self.lock().calls.clone()
    }

    /// Returns how many calls of `op` were made.
    #[must_use]
    pub fn count(&self, op: VixOp) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.op() == Some(op))
            .count()
    }

    /// Returns the number of host and VM handles not yet released.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.lock().live_handles.len()
    }

    /// Returns how many releases targeted an already released handle.
    #[must_use]
    pub fn stale_releases(&self) -> usize {
        self.lock().stale_releases
    }

    /// Returns the simulated guest files.
    #[must_use]
    pub fn guest_files(&self) -> HashMap<String, String> {
        self.lock().guest_files.clone()
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `call`, applies the job delay and the scripted failure for it.
    fn begin(&self, call: StubCall) -> Result<MutexGuard<'_, StubState>, VixCode> {
        let op = call.op();
        let delay = {
            let mut state = self.lock();
            state.calls.push(call);
            state.job_delay
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let state = self.lock();
        if let Some(op) = op {
            state.check(op)?;
        }
        Ok(state)
    }
}

impl VixBackend for StubVix {
    fn connect_host(&self, params: &HostConnectParams) -> Result<VixHandle, VixCode> {
        let mut state = self.begin(StubCall::ConnectHost {
            host_name: params.host_name.clone(),
            port: params.port,
        })?;
        Ok(state.allocate())
    }

    fn open_vm(&self, host: VixHandle, vmx_path: &str) -> Result<VixHandle, VixCode> {
        let mut state = self.begin(StubCall::OpenVm {
            host,
            vmx_path: vmx_path.to_string(),
        })?;
        if !state.live_handles.contains(&host) {
            return Err(VixCode::HOST_CONNECTION_LOST);
        }
        Ok(state.allocate())
    }

    fn wait_for_tools(&self, vm: VixHandle, timeout_secs: i32) -> Result<(), VixCode> {
        self.begin(StubCall::WaitForTools { vm, timeout_secs })?;
        Ok(())
    }

    fn login_in_guest(&self, vm: VixHandle, user: &str, _password: &str) -> Result<(), VixCode> {
        self.begin(StubCall::LoginInGuest {
            vm,
            user: user.to_string(),
        })?;
        Ok(())
    }

    fn run_program_in_guest(
        &self,
        vm: VixHandle,
        program: &str,
        args: &str,
        _options: RunProgramOptions,
    ) -> Result<(), VixCode> {
        let mut state = self.begin(StubCall::RunProgram {
            vm,
            program: program.to_string(),
            args: args.to_string(),
        })?;

        if state.skip_output_files {
            return Ok(());
        }

        let script = args
            .strip_prefix("-c ")
            .map(unquote_shell_words)
            .unwrap_or_default();
        if let Some((command, target)) = split_redirect(&script) {
            let output = state.outputs.get(&command).cloned().unwrap_or_default();
            state.guest_files.insert(target, output);
        }
        Ok(())
    }

    fn file_exists_in_guest(&self, vm: VixHandle, guest_path: &str) -> Result<bool, VixCode> {
        let mut state = self.begin(StubCall::FileExists {
            vm,
            guest_path: guest_path.to_string(),
        })?;
        if state.hidden_polls > 0 {
            state.hidden_polls -= 1;
            return Ok(false);
        }
        Ok(state.guest_files.contains_key(guest_path))
    }

    fn copy_file_from_guest_to_host(
        &self,
        vm: VixHandle,
        guest_path: &str,
        host_path: &Path,
    ) -> Result<(), VixCode> {
        let state = self.begin(StubCall::CopyFile {
            vm,
            guest_path: guest_path.to_string(),
            host_path: host_path.to_path_buf(),
        })?;
        let contents = state
            .guest_files
            .get(guest_path)
            .ok_or(VixCode::FILE_NOT_FOUND)?;
        if state.skip_host_copies {
            return Ok(());
        }
        std::fs::write(host_path, contents).map_err(|_| VixCode::FAIL)
    }

    fn delete_file_in_guest(&self, vm: VixHandle, guest_path: &str) -> Result<(), VixCode> {
        let mut state = self.begin(StubCall::DeleteFile {
            vm,
            guest_path: guest_path.to_string(),
        })?;
        state
            .guest_files
            .remove(guest_path)
            .map(|_| ())
            .ok_or(VixCode::FILE_NOT_FOUND)
    }

    fn error_text(&self, code: VixCode) -> Option<String> {
        let text = match code.error_number() {
            0 => "The operation was successfully completed",
            1 => "Unknown error",
            3 => "One of the parameters was invalid",
            4 => "A file was not found",
            3008 => "The network connection to the host was lost",
            3015 => "A timeout error occurred while waiting for VMware Tools to start",
            3016 => "The guest user does not have permission to perform this operation",
            4000 => "The virtual machine cannot be found",
            18000 => "Cannot connect to host",
            _ => return None,
        };
        Some(text.to_string())
    }

    fn release_handle(&self, handle: VixHandle) {
        let mut state = self.lock();
        state.calls.push(StubCall::ReleaseHandle(handle));
        state.free(handle);
    }

    fn disconnect_host(&self, host: VixHandle) {
        let mut state = self.lock();
        state.calls.push(StubCall::DisconnectHost(host));
        state.free(host);
    }
}

/// Undoes POSIX single-quote shell quoting of one word.
fn unquote_shell_words(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_quotes = false;
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '\\' if !in_quotes => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Splits `{ <command>\n} > <target> 2>&1` into the command and unquoted target.
fn split_redirect(script: &str) -> Option<(String, String)> {
    let body = script.strip_prefix("{ ")?.strip_suffix(" 2>&1")?;
    let idx = body.rfind("\n} > ")?;
    let command = body[..idx].to_string();
    let target = unquote_shell_words(&body[idx + 5..]);
    Some((command, target))
}
