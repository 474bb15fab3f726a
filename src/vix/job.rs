//! Completion futures for blocking VIX jobs.
//!
//! A job runs on tokio's blocking pool and is awaited with a deadline. When
//! the deadline passes, or the waiting future is dropped, the job keeps
//! running on its thread. Whatever it captured or returned is dropped when it
//! finishes, so jobs that hold handle guards release them only then.

use super::backend::{VixBackend, VixCode};
use super::translate::translate;
use crate::error::{GuestError, GuestStep};
use std::time::Duration;

/// How a blocking job ended, other than successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    /// The library reported a non-OK result
    Library(VixCode),
    /// The deadline passed before the job completed
    TimedOut(Duration),
    /// The blocking task panicked or was cancelled
    Aborted(String),
}

impl JobFailure {
    /// Converts the failure into a [`GuestError`] for `step`, translating
    /// library codes to text.
    #[must_use]
    pub fn into_guest_error(self, backend: &dyn VixBackend, step: GuestStep) -> GuestError {
        match self {
            Self::Library(code) => GuestError::library(step, code, translate(backend, code)),
            Self::TimedOut(duration) => GuestError::timeout(step, duration),
            Self::Aborted(reason) => {
                GuestError::internal(format!("{} job aborted: {}", step, reason))
            }
        }
    }
}

/// Runs `job` on the blocking pool and waits at most `deadline` for it.
///
/// # Errors
///
/// Returns the library code, the timeout, or the join failure.
pub async fn run_blocking<T, F>(deadline: Duration, job: F) -> Result<T, JobFailure>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, VixCode> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);

    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(code))) => Err(JobFailure::Library(code)),
        Ok(Err(join_error)) => Err(JobFailure::Aborted(join_error.to_string())),
        Err(_) => {
            tracing::warn!(
                deadline_ms = deadline.as_millis(),
                "VIX job exceeded its deadline; its result is dropped when it completes"
            );
            Err(JobFailure::TimedOut(deadline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vix::stub::StubVix;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn successful_job_returns_value() {
        let result = run_blocking(Duration::from_secs(5), || Ok::<_, VixCode>(7)).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn library_failure_is_reported() {
        let result =
            run_blocking(Duration::from_secs(5), || Err::<(), _>(VixCode::VM_NOT_FOUND)).await;
        assert_eq!(result, Err(JobFailure::Library(VixCode::VM_NOT_FOUND)));
    }

    /// Sets its flag when dropped.
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn slow_job_times_out_and_late_result_is_dropped() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = dropped.clone();

        let result = run_blocking(Duration::from_millis(20), move || {
            std::thread::sleep(Duration::from_millis(200));
            Ok::<_, VixCode>(DropFlag(flag))
        })
        .await;

        assert!(matches!(
            result,
            Err(JobFailure::TimedOut(deadline)) if deadline == Duration::from_millis(20)
        ));
        assert!(!dropped.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn panicking_job_is_aborted() {
        let result = run_blocking(Duration::from_secs(5), || -> Result<(), VixCode> {
            panic!("boom")
        })
        .await;
        assert!(matches!(result, Err(JobFailure::Aborted(_))));
    }

    #[test]
    fn library_failure_translates_to_guest_error() {
        let backend = StubVix::new();
        let error = JobFailure::Library(VixCode::VM_NOT_FOUND)
            .into_guest_error(&backend, GuestStep::VmOpen);
        assert_eq!(
            error.to_string(),
            "Failed to open VM: The virtual machine cannot be found"
        );
    }

    #[test]
    fn timeout_translates_to_guest_error() {
        let backend = StubVix::new();
        let error = JobFailure::TimedOut(Duration::from_secs(3))
            .into_guest_error(&backend, GuestStep::FileCopy);
        assert!(error.is_timeout());
    }
}
