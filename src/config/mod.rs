//! Configuration management for vix-guest-tools.
//!
//! # Configuration File Format
//!
//! Configuration is stored in TOML format. The search order is:
//! 1. `./vix-guest-tools.toml` (project-local)
//! 2. `~/.config/vix-guest-tools/config.toml` (XDG config)
//!
//! # Example Configuration
//!
//! ```toml
//! [host]
//! service_provider = "workstation"   # server, player, vi_server, workstation_shared
//! verify_ssl = true
//!
//! [guest]
//! shell = "/bin/bash"
//! guest_temp_dir = "/tmp"
//! host_temp_dir = "/var/tmp/vix"
//! tools_timeout_secs = 600
//! output_settle_delay_ms = 2000
//! output_poll_attempts = 5
//! output_poll_interval_ms = 500
//! job_timeout_secs = 900
//!
//! [logging]
//! enabled = true
//! level = "info"
//! ```

mod file;
mod types;

pub use file::{from_path, from_str, load, search_paths, xdg_config_dir};
pub use types::{
    GuestConfig, HostConfig, VixToolsConfig, DEFAULT_GUEST_TEMP_DIR, DEFAULT_SHELL,
    DEFAULT_TOOLS_TIMEOUT_SECS,
};
