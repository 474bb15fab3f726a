//! Raw bindings to `libvixAllProducts`.
//!
//! Only the entry points used by [`super::native`] are declared. Linking is
//! configured by the build script when the `native` feature is on.

#![allow(non_snake_case)]

use std::os::raw::{c_char, c_int, c_void};

pub type VixHandle = c_int;
pub type VixError = u64;
pub type VixPropertyID = c_int;
pub type VixEventType = c_int;
pub type Bool = c_char;

pub type VixEventProc = unsafe extern "C" fn(
    handle: VixHandle,
    event_type: VixEventType,
    more_event_info: VixHandle,
    client_data: *mut c_void,
);

pub const VIX_API_VERSION: c_int = -1;
pub const VIX_INVALID_HANDLE: VixHandle = 0;
pub const VIX_OK: VixError = 0;

pub const VIX_PROPERTY_NONE: VixPropertyID = 0;
pub const VIX_PROPERTY_JOB_RESULT_HANDLE: VixPropertyID = 3010;
pub const VIX_PROPERTY_JOB_RESULT_GUEST_OBJECT_EXISTS: VixPropertyID = 3046;

pub const VIX_HOSTOPTION_VERIFY_SSL_CERT: c_int = 0x4000;
pub const VIX_VMOPEN_NORMAL: c_int = 0;

extern "C" {
    pub fn VixHost_Connect(
        api_version: c_int,
        host_type: c_int,
        host_name: *const c_char,
        host_port: c_int,
        user_name: *const c_char,
        password: *const c_char,
        options: c_int,
        property_list_handle: VixHandle,
        callback_proc: Option<VixEventProc>,
        client_data: *mut c_void,
    ) -> VixHandle;

    pub fn VixHost_Disconnect(host_handle: VixHandle);

    pub fn VixHost_OpenVM(
        host_handle: VixHandle,
        vmx_file_path_name: *const c_char,
        options: c_int,
        property_list_handle: VixHandle,
        callback_proc: Option<VixEventProc>,
        client_data: *mut c_void,
    ) -> VixHandle;

    pub fn VixVM_WaitForToolsInGuest(
        vm_handle: VixHandle,
        timeout_in_seconds: c_int,
        callback_proc: Option<VixEventProc>,
        client_data: *mut c_void,
    ) -> VixHandle;

    pub fn VixVM_LoginInGuest(
        vm_handle: VixHandle,
        user_name: *const c_char,
        password: *const c_char,
        options: c_int,
        callback_proc: Option<VixEventProc>,
        client_data: *mut c_void,
    ) -> VixHandle;

    pub fn VixVM_RunProgramInGuest(
        vm_handle: VixHandle,
        guest_program_name: *const c_char,
        command_line_args: *const c_char,
        options: c_int,
        property_list_handle: VixHandle,
        callback_proc: Option<VixEventProc>,
        client_data: *mut c_void,
    ) -> VixHandle;

    pub fn VixVM_FileExistsInGuest(
        vm_handle: VixHandle,
        guest_path_name: *const c_char,
        callback_proc: Option<VixEventProc>,
        client_data: *mut c_void,
    ) -> VixHandle;

    pub fn VixVM_CopyFileFromGuestToHost(
        vm_handle: VixHandle,
        guest_path_name: *const c_char,
        host_path_name: *const c_char,
        options: c_int,
        property_list_handle: VixHandle,
        callback_proc: Option<VixEventProc>,
        client_data: *mut c_void,
    ) -> VixHandle;

    pub fn VixVM_DeleteFileInGuest(
        vm_handle: VixHandle,
        guest_path_name: *const c_char,
        callback_proc: Option<VixEventProc>,
        client_data: *mut c_void,
    ) -> VixHandle;

    /// Variadic: pairs of (property id, out pointer), terminated by
    /// `VIX_PROPERTY_NONE`.
    pub fn VixJob_Wait(job_handle: VixHandle, first_property_id: VixPropertyID, ...) -> VixError;

    pub fn Vix_GetErrorText(err: VixError, locale: *const c_char) -> *const c_char;

    pub fn Vix_FreeBuffer(p: *mut c_void);

    pub fn Vix_ReleaseHandle(handle: VixHandle);
}
