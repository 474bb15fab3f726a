//! Build script for vix-guest-tools.
//!
//! Emits linker directives for VMware's `libvixAllProducts` when the `native`
//! feature is enabled. Without the feature nothing is linked and only the stub
//! backend is available.

use std::env;
use std::path::PathBuf;

/// Library name as shipped by the VIX SDK.
const VIX_LIBRARY: &str = "vixAllProducts";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=VIX_LIB_DIR");

    if env::var_os("CARGO_FEATURE_NATIVE").is_none() {
        return;
    }

    match vix_lib_dir() {
        Some(dir) => {
            println!("cargo:rustc-link-search=native={}", dir.display());
        }
        None => {
            println!(
                "cargo:warning=VIX_LIB_DIR not set; relying on the default linker path for lib{}",
                VIX_LIBRARY
            );
        }
    }

    println!("cargo:rustc-link-lib=dylib={}", VIX_LIBRARY);
}

/// Resolves the directory holding the VIX shared library.
///
/// `VIX_LIB_DIR` wins; otherwise the SDK's default Linux install prefix is
/// used when it exists.
fn vix_lib_dir() -> Option<PathBuf> {
    if let Some(dir) = env::var_os("VIX_LIB_DIR") {
        return Some(PathBuf::from(dir));
    }

    let default_dir = PathBuf::from("/usr/lib/vmware-vix");
    if default_dir.exists() {
        Some(default_dir)
    } else {
        None
    }
}
