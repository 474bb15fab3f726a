//! Native backend calling into `libvixAllProducts`.
//!
//! Jobs are started without a callback and completed with `VixJob_Wait`, which
//! blocks the calling thread. Run these calls on the blocking pool.

use super::backend::{HostConnectParams, RunProgramOptions, VixBackend, VixCode, VixHandle};
use super::ffi;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::path::Path;
use std::ptr;

/// The VIX library backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeVix;

impl NativeVix {
    /// Creates the native backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// A job handle released on drop.
struct Job(ffi::VixHandle);

impl Job {
    /// Waits for a job that produces no result properties.
    fn wait(self) -> Result<(), VixCode> {
        // SAFETY: the job handle is live until `self` drops; the property list
        // is terminated by VIX_PROPERTY_NONE.
        let err = unsafe { ffi::VixJob_Wait(self.0, ffi::VIX_PROPERTY_NONE) };
        check(err)
    }

    /// Waits for a job whose result is a new handle.
    fn wait_for_handle(self) -> Result<VixHandle, VixCode> {
        let mut handle: ffi::VixHandle = ffi::VIX_INVALID_HANDLE;
        // SAFETY: `handle` outlives the call and matches the int-sized
        // VIX_PROPERTY_JOB_RESULT_HANDLE property.
        let err = unsafe {
            ffi::VixJob_Wait(
                self.0,
                ffi::VIX_PROPERTY_JOB_RESULT_HANDLE,
                &mut handle as *mut ffi::VixHandle,
                ffi::VIX_PROPERTY_NONE,
            )
        };
        check(err)?;
        Ok(VixHandle(handle))
    }

    /// Waits for a job whose result is the object-exists flag.
    fn wait_for_exists(self) -> Result<bool, VixCode> {
        let mut exists: ffi::Bool = 0;
        // SAFETY: `exists` outlives the call and matches the Bool-sized
        // VIX_PROPERTY_JOB_RESULT_GUEST_OBJECT_EXISTS property.
        let err = unsafe {
            ffi::VixJob_Wait(
                self.0,
                ffi::VIX_PROPERTY_JOB_RESULT_GUEST_OBJECT_EXISTS,
                &mut exists as *mut ffi::Bool,
                ffi::VIX_PROPERTY_NONE,
            )
        };
        check(err)?;
        Ok(exists != 0)
    }
}

impl Drop for Job {
    fn drop(&mut self) {
        if self.0 != ffi::VIX_INVALID_HANDLE {
            // SAFETY: the handle came from a VIX job constructor and is
            // released exactly once.
            unsafe { ffi::Vix_ReleaseHandle(self.0) };
        }
    }
}

fn check(err: ffi::VixError) -> Result<(), VixCode> {
    if err == ffi::VIX_OK {
        Ok(())
    } else {
        Err(VixCode(err))
    }
}

fn c_string(value: &str) -> Result<CString, VixCode> {
    CString::new(value).map_err(|_| VixCode::INVALID_ARG)
}

/// Empty strings are passed as NULL, which VIX reads as "not supplied".
fn optional_ptr(value: &Option<CString>) -> *const c_char {
    value.as_ref().map_or(ptr::null(), |s| s.as_ptr())
}

fn optional_c_string(value: &str) -> Result<Option<CString>, VixCode> {
    if value.is_empty() {
        Ok(None)
    } else {
        c_string(value).map(Some)
    }
}

impl VixBackend for NativeVix {
    fn connect_host(&self, params: &HostConnectParams) -> Result<VixHandle, VixCode> {
        let host_name = optional_c_string(&params.host_name)?;
        let user_name = optional_c_string(&params.user_name)?;
        let password = optional_c_string(&params.password)?;
        let options = if params.verify_ssl {
            ffi::VIX_HOSTOPTION_VERIFY_SSL_CERT
        } else {
            0
        };

        // SAFETY: all string pointers are either NULL or point into CStrings
        // that live until the job has been waited on.
        let job = Job(unsafe {
            ffi::VixHost_Connect(
                ffi::VIX_API_VERSION,
                params.provider.as_raw(),
                optional_ptr(&host_name),
                params.port,
                optional_ptr(&user_name),
                optional_ptr(&password),
                options,
                ffi::VIX_INVALID_HANDLE,
                None,
                ptr::null_mut(),
            )
        });
        job.wait_for_handle()
    }

    fn open_vm(&self, host: VixHandle, vmx_path: &str) -> Result<VixHandle, VixCode> {
        let vmx_path = c_string(vmx_path)?;
        // SAFETY: `vmx_path` lives until the job completes.
        let job = Job(unsafe {
            ffi::VixHost_OpenVM(
                host.0,
                vmx_path.as_ptr(),
                ffi::VIX_VMOPEN_NORMAL,
                ffi::VIX_INVALID_HANDLE,
                None,
                ptr::null_mut(),
            )
        });
        job.wait_for_handle()
    }

    fn wait_for_tools(&self, vm: VixHandle, timeout_secs: i32) -> Result<(), VixCode> {
        // SAFETY: no pointers are passed.
        let job = Job(unsafe {
            ffi::VixVM_WaitForToolsInGuest(vm.0, timeout_secs, None, ptr::null_mut())
        });
        job.wait()
    }

    fn login_in_guest(&self, vm: VixHandle, user: &str, password: &str) -> Result<(), VixCode> {
        let user = c_string(user)?;
        let password = c_string(password)?;
        // SAFETY: both CStrings live until the job completes.
        let job = Job(unsafe {
            ffi::VixVM_LoginInGuest(
                vm.0,
                user.as_ptr(),
                password.as_ptr(),
                0,
                None,
                ptr::null_mut(),
            )
        });
        job.wait()
    }

    fn run_program_in_guest(
        &self,
        vm: VixHandle,
        program: &str,
        args: &str,
        options: RunProgramOptions,
    ) -> Result<(), VixCode> {
        let program = c_string(program)?;
        let args = c_string(args)?;
        // SAFETY: both CStrings live until the job completes.
        let job = Job(unsafe {
            ffi::VixVM_RunProgramInGuest(
                vm.0,
                program.as_ptr(),
                args.as_ptr(),
                options.as_raw(),
                ffi::VIX_INVALID_HANDLE,
                None,
                ptr::null_mut(),
            )
        });
        job.wait()
    }

    fn file_exists_in_guest(&self, vm: VixHandle, guest_path: &str) -> Result<bool, VixCode> {
        let guest_path = c_string(guest_path)?;
        // SAFETY: `guest_path` lives until the job completes.
        let job = Job(unsafe {
            ffi::VixVM_FileExistsInGuest(vm.0, guest_path.as_ptr(), None, ptr::null_mut())
        });
        job.wait_for_exists()
    }

    fn copy_file_from_guest_to_host(
        &self,
        vm: VixHandle,
        guest_path: &str,
        host_path: &Path,
    ) -> Result<(), VixCode> {
        let guest_path = c_string(guest_path)?;
        let host_path = c_string(host_path.to_str().ok_or(VixCode::INVALID_ARG)?)?;
        // SAFETY: both CStrings live until the job completes.
        let job = Job(unsafe {
            ffi::VixVM_CopyFileFromGuestToHost(
                vm.0,
                guest_path.as_ptr(),
                host_path.as_ptr(),
                0,
                ffi::VIX_INVALID_HANDLE,
                None,
                ptr::null_mut(),
            )
        });
        job.wait()
    }

    fn delete_file_in_guest(&self, vm: VixHandle, guest_path: &str) -> Result<(), VixCode> {
        let guest_path = c_string(guest_path)?;
        // SAFETY: `guest_path` lives until the job completes.
        let job = Job(unsafe {
            ffi::VixVM_DeleteFileInGuest(vm.0, guest_path.as_ptr(), None, ptr::null_mut())
        });
        job.wait()
    }

    fn error_text(&self, code: VixCode) -> Option<String> {
        // SAFETY: a NULL locale selects the default; the returned buffer is
        // copied before it is handed back to the library.
        unsafe {
            let text = ffi::Vix_GetErrorText(code.0, ptr::null());
            if text.is_null() {
                return None;
            }
            let owned = CStr::from_ptr(text).to_string_lossy().into_owned();
            ffi::Vix_FreeBuffer(text as *mut c_void);
            Some(owned)
        }
    }

    fn release_handle(&self, handle: VixHandle) {
        if handle.is_valid() {
            // SAFETY: callers release each handle once.
            unsafe { ffi::Vix_ReleaseHandle(handle.0) };
        }
    }

    fn disconnect_host(&self, host: VixHandle) {
        if host.is_valid() {
            // SAFETY: callers disconnect each host handle once.
            unsafe { ffi::VixHost_Disconnect(host.0) };
        }
    }
}
