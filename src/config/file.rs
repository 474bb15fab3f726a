//! Configuration file loading.
//!
//! This module handles loading configuration from TOML files at XDG-compliant
//! locations.

use crate::config::types::VixToolsConfig;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Default configuration file name for project-local config.
const LOCAL_CONFIG_NAME: &str = "vix-guest-tools.toml";

/// Default configuration file name within XDG config directory.
const XDG_CONFIG_NAME: &str = "config.toml";

/// Application name for XDG directory lookup.
const APP_NAME: &str = "vix-guest-tools";

/// Loads configuration from the default search paths.
///
/// Search order:
/// 1. `./vix-guest-tools.toml` (project-local)
/// 2. `~/.config/vix-guest-tools/config.toml` (XDG config)
///
/// Returns the default configuration if no config file is found.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed.
pub fn load() -> Result<VixToolsConfig, ConfigError> {
    for path in search_paths() {
        if path.exists() {
            tracing::debug!(path = %path.display(), "Loading configuration");
            return from_path(&path);
        }
    }

    Ok(VixToolsConfig::default())
}

/// Loads configuration from a specific file path.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file contains invalid TOML
/// - The TOML doesn't match the expected schema or fails validation
pub fn from_path(path: &Path) -> Result<VixToolsConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::new(
            "config_file",
            format!("failed to read '{}': {}", path.display(), e),
        )
    })?;

    from_str(&contents).map_err(|e| {
        ConfigError::new(
            e.field,
            format!("{} (in '{}')", e.reason, path.display()),
        )
    })
}

/// Parses configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid, doesn't match the schema, or
/// fails validation.
pub fn from_str(toml_str: &str) -> Result<VixToolsConfig, ConfigError> {
    let config: VixToolsConfig = toml::from_str(toml_str)
        .map_err(|e| ConfigError::new("config", format!("invalid TOML: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Returns the paths that would be searched for configuration files.
#[must_use]
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_NAME)];

    if let Some(dir) = xdg_config_dir() {
        paths.push(dir.join(XDG_CONFIG_NAME));
    }

    paths
}

/// Returns the path to the XDG config directory for vix-guest-tools.
///
/// This is `~/.config/vix-guest-tools` on most systems.
#[must_use]
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use crate::vix::ServiceProvider;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn from_str_empty_gives_defaults() {
        let config = from_str("").unwrap();
        assert_eq!(config, VixToolsConfig::default());
    }

    #[test]
    fn from_str_parses_all_sections() {
        let toml = r#"
[host]
service_provider = "vi_server"
verify_ssl = false

[guest]
shell = "/bin/sh"
guest_temp_dir = "/var/tmp"
host_temp_dir = "/srv/staging"
tools_timeout_secs = 120
output_poll_attempts = 10

[logging]
enabled = false
level = "debug"
        "#;

        let config = from_str(toml).unwrap();

        assert_eq!(config.host.service_provider, ServiceProvider::ViServer);
        assert!(!config.host.verify_ssl);
        assert_eq!(config.guest.shell, "/bin/sh");
        assert_eq!(config.guest.guest_temp_dir, "/var/tmp");
        assert_eq!(
            config.guest.host_temp_dir,
            Some(PathBuf::from("/srv/staging"))
        );
        assert_eq!(config.guest.tools_timeout_secs, 120);
        assert_eq!(config.guest.output_poll_attempts, 10);
        // unspecified fields keep their defaults
        assert_eq!(config.guest.output_settle_delay_ms, 2000);
        assert!(!config.logging.enabled);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn from_str_error_on_invalid_toml() {
        let err = from_str("this is not valid toml [[[").unwrap_err();
        assert!(err.reason.contains("invalid TOML"));
    }

    #[test]
    fn from_str_error_on_unknown_provider() {
        let err = from_str("[host]\nservice_provider = \"hyper-v\"\n").unwrap_err();
        assert!(err.reason.contains("invalid TOML"));
    }

    #[test]
    fn from_str_runs_validation() {
        let err = from_str("[guest]\noutput_poll_attempts = 0\n").unwrap_err();
        assert_eq!(err.field, "guest.output_poll_attempts");
    }

    #[test]
    fn from_path_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "[guest]\nguest_temp_dir = \"/opt/stage\"").unwrap();

        let config = from_path(&config_path).unwrap();
        assert_eq!(config.guest.guest_temp_dir, "/opt/stage");
    }

    #[test]
    fn from_path_error_names_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        std::fs::write(&config_path, "[guest\n").unwrap();

        let err = from_path(&config_path).unwrap_err();
        assert!(err.reason.contains("broken.toml"));
    }

    #[test]
    fn from_path_error_on_missing_file() {
        let err = from_path(Path::new("/nonexistent/path/config.toml")).unwrap_err();
        assert_eq!(err.field, "config_file");
    }

    #[test]
    fn search_paths_includes_local() {
        let paths = search_paths();
        assert!(paths
            .iter()
            .any(|p| p.file_name() == Some(std::ffi::OsStr::new(LOCAL_CONFIG_NAME))));
    }

    #[test]
    fn xdg_config_dir_returns_path() {
        if let Some(dir) = xdg_config_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
