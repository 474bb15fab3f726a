//! Runs one shell command in the guest and collects its output through a
//! pair of staging files.

use super::session::VmHandle;
use super::staging::{mkdir_args, redirect_args, StagedOutput, StagingDirs};
use crate::config::GuestConfig;
use crate::error::{GuestError, GuestStep};
use crate::vix::{run_blocking, JobFailure, RunProgramOptions, VixBackend, VixCode, VixHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A caller's limit for the whole run.
#[derive(Debug, Clone, Copy)]
struct CallDeadline {
    at: Instant,
    limit: Duration,
}

/// Command runner bound to an open, logged-in VM.
#[derive(Debug)]
pub(crate) struct CommandRunner<'a> {
    backend: &'a Arc<dyn VixBackend>,
    config: &'a GuestConfig,
    vm: Arc<VmHandle>,
    deadline: Option<CallDeadline>,
}

impl<'a> CommandRunner<'a> {
    pub(crate) fn new(
        backend: &'a Arc<dyn VixBackend>,
        config: &'a GuestConfig,
        vm: Arc<VmHandle>,
    ) -> Self {
        Self {
            backend,
            config,
            vm,
            deadline: None,
        }
    }

    /// Bounds the whole run by `limit`, counted from now.
    #[must_use]
    pub(crate) fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.deadline = limit.map(|limit| CallDeadline {
            at: Instant::now() + limit,
            limit,
        });
        self
    }

    /// Creates the guest staging directory. The outcome is only logged.
    pub(crate) async fn ensure_guest_dir(&self, dir: &str) {
        let shell = self.config.shell.clone();
        let args = mkdir_args(dir);

        let result = self
            .job(GuestStep::CommandExecution, move |backend, vm| {
                backend.run_program_in_guest(vm, &shell, &args, RunProgramOptions::default())
            })
            .await;

        if let Err(error) = result {
            tracing::debug!(dir, error = %error, "Creating guest staging directory failed");
        }
    }

    /// Runs `command` and returns its combined stdout and stderr.
    ///
    /// `kind` prefixes the staging file names.
    ///
    /// # Errors
    ///
    /// Fails on the first step that fails: starting the command, finding the
    /// output file, copying it, or reading the copy. A step still running at
    /// the call's deadline fails with a timeout for that step.
    pub(crate) async fn run(
        &self,
        command: &str,
        dirs: &StagingDirs,
        kind: &str,
    ) -> Result<String, GuestError> {
        self.ensure_guest_dir(&dirs.guest_dir).await;

        let staged = StagedOutput::new(dirs, kind);
        tracing::debug!(
            run_id = %staged.run_id,
            guest_path = %staged.guest_path,
            "Running guest command"
        );

        self.start(command, &staged.guest_path).await?;
        self.pause(self.config.settle_delay(), GuestStep::OutputCheck)
            .await?;
        self.wait_for_output(&staged.guest_path).await?;
        self.copy_to_host(&staged).await?;

        let bytes = tokio::fs::read(&staged.host_path)
            .await
            .map_err(|e| GuestError::host_read(&staged.host_path, e.to_string()))?;
        let output = String::from_utf8_lossy(&bytes).into_owned();

        self.cleanup(&staged).await;

        tracing::debug!(run_id = %staged.run_id, bytes = bytes.len(), "Guest command finished");
        Ok(output)
    }

    async fn start(&self, command: &str, guest_path: &str) -> Result<(), GuestError> {
        let shell = self.config.shell.clone();
        let args = redirect_args(command, guest_path);
        let options = RunProgramOptions {
            return_immediately: true,
        };

        self.job(GuestStep::CommandExecution, move |backend, vm| {
            backend.run_program_in_guest(vm, &shell, &args, options)
        })
        .await
    }

    /// Polls until the output file exists, up to the configured attempts.
    async fn wait_for_output(&self, guest_path: &str) -> Result<(), GuestError> {
        let attempts = self.config.output_poll_attempts.max(1);

        for attempt in 1..=attempts {
            let path = guest_path.to_string();
            let exists = self
                .job(GuestStep::OutputCheck, move |backend, vm| {
                    backend.file_exists_in_guest(vm, &path)
                })
                .await?;

            if exists {
                return Ok(());
            }
            tracing::debug!(attempt, attempts, guest_path, "Output file not there yet");
            if attempt < attempts {
                self.pause(self.config.poll_interval(), GuestStep::OutputCheck)
                    .await?;
            }
        }

        Err(GuestError::output_missing(guest_path))
    }

    async fn copy_to_host(&self, staged: &StagedOutput) -> Result<(), GuestError> {
        let guest_path = staged.guest_path.clone();
        let host_path = staged.host_path.clone();

        self.job(GuestStep::FileCopy, move |backend, vm| {
            backend.copy_file_from_guest_to_host(vm, &guest_path, &host_path)
        })
        .await
    }

    /// Deletes both staging files. Failures are logged, never returned.
    async fn cleanup(&self, staged: &StagedOutput) {
        let guest_path = staged.guest_path.clone();

        let deleted = self
            .job(GuestStep::GuestCleanup, move |backend, vm| {
                backend.delete_file_in_guest(vm, &guest_path)
            })
            .await;
        if let Err(error) = deleted {
            tracing::warn!(guest_path = %staged.guest_path, error = %error, "Guest output file left behind");
        }

        if let Err(e) = tokio::fs::remove_file(&staged.host_path).await {
            tracing::debug!(
                host_path = %staged.host_path.display(),
                error = %e,
                "Host output file not removed"
            );
        }
    }

    /// Runs one blocking library call against the VM.
    ///
    /// The job holds its own reference to the VM guard, so the handle stays
    /// open until the call returns even if this future is dropped first.
    async fn job<T, F>(&self, step: GuestStep, job: F) -> Result<T, GuestError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn VixBackend, VixHandle) -> Result<T, VixCode> + Send + 'static,
    {
        let job_timeout = self.config.job_timeout();
        let limit = match self.deadline {
            Some(deadline) => {
                let remaining = deadline.at.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(GuestError::timeout(step, deadline.limit));
                }
                remaining.min(job_timeout)
            }
            None => job_timeout,
        };

        let backend = self.backend.clone();
        let vm = self.vm.clone();
        run_blocking(limit, move || job(backend.as_ref(), vm.handle()))
            .await
            .map_err(|failure| match (failure, self.deadline) {
                (JobFailure::TimedOut(_), Some(deadline)) if limit < job_timeout => {
                    GuestError::timeout(step, deadline.limit)
                }
                (failure, _) => failure.into_guest_error(self.backend.as_ref(), step),
            })
    }

    /// Sleeps for `pause`, failing at the call's deadline.
    async fn pause(&self, pause: Duration, step: GuestStep) -> Result<(), GuestError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() + pause >= deadline.at {
                tokio::time::sleep_until(deadline.at).await;
                return Err(GuestError::timeout(step, deadline.limit));
            }
        }
        tokio::time::sleep(pause).await;
        Ok(())
    }
}
