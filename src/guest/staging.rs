//! Staging file naming and shell quoting for guest commands.

use crate::config::GuestConfig;
use crate::types::RunId;
use std::path::PathBuf;

/// Where a command's output is staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingDirs {
    /// Directory in the guest (POSIX path)
    pub guest_dir: String,
    /// Directory on the controlling host
    pub host_dir: PathBuf,
}

impl StagingDirs {
    /// Creates staging directories.
    #[must_use]
    pub fn new(guest_dir: impl Into<String>, host_dir: impl Into<PathBuf>) -> Self {
        Self {
            guest_dir: guest_dir.into(),
            host_dir: host_dir.into(),
        }
    }

    /// The configured default directories.
    #[must_use]
    pub fn from_config(config: &GuestConfig) -> Self {
        Self::new(config.guest_temp_dir.clone(), config.host_temp_dir())
    }
}

/// The pair of temporary files used by one command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedOutput {
    /// Identifier shared by both file names
    pub run_id: RunId,
    /// `<guest_dir>/<kind>_<run id>.txt`
    pub guest_path: String,
    /// `<host_dir>/<kind>_<run id>_host.txt`
    pub host_path: PathBuf,
}

impl StagedOutput {
    /// Allocates fresh file names for a run of `kind`.
    #[must_use]
    pub fn new(dirs: &StagingDirs, kind: &str) -> Self {
        let run_id = RunId::new();
        let guest_path = join_guest_path(&dirs.guest_dir, &format!("{kind}_{run_id}.txt"));
        let host_path = dirs.host_dir.join(format!("{kind}_{run_id}_host.txt"));
        Self {
            run_id,
            guest_path,
            host_path,
        }
    }
}

/// Joins a guest directory and file name with `/`, whatever the host OS.
fn join_guest_path(dir: &str, file_name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), file_name)
}

/// Quotes `word` for a POSIX shell.
#[must_use]
pub fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// Script that runs all of `command` with stdout and stderr redirected to
/// `guest_path`.
///
/// The command is grouped so the redirect covers every part of a list or
/// pipeline. The closing brace sits on its own line, so a trailing comment
/// in `command` cannot swallow it.
#[must_use]
pub fn redirect_script(command: &str, guest_path: &str) -> String {
    format!("{{ {command}\n}} > {} 2>&1", shell_quote(guest_path))
}

/// Shell arguments for [`redirect_script`].
#[must_use]
pub fn redirect_args(command: &str, guest_path: &str) -> String {
    format!("-c {}", shell_quote(&redirect_script(command, guest_path)))
}

/// Shell arguments that create `dir` and its parents.
#[must_use]
pub fn mkdir_args(dir: &str) -> String {
    let script = format!("mkdir -p {}", shell_quote(dir));
    format!("-c {}", shell_quote(&script))
}
