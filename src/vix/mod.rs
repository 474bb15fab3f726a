//! Access to the VMware VIX control library.
//!
//! - **backend**: the [`VixBackend`] trait, handle and result-code types
//! - **native**: FFI implementation over `libvixAllProducts` (`native` feature)
//! - **stub**: in-memory implementation for tests and dry runs
//! - **job**: completion futures with deadlines for blocking jobs
//! - **translate**: result code to text

pub mod backend;
#[cfg(feature = "native")]
mod ffi;
pub mod job;
#[cfg(feature = "native")]
pub mod native;
pub mod stub;
pub mod translate;

pub use backend::{
    HostConnectParams, RunProgramOptions, ServiceProvider, VixBackend, VixCode, VixHandle,
};
pub use job::{run_blocking, JobFailure};
#[cfg(feature = "native")]
pub use native::NativeVix;
pub use stub::{StubCall, StubVix, VixOp};
pub use translate::{translate, UNKNOWN_ERROR};
