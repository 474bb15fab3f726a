//! Core type definitions for vix-guest-tools.
//!
//! Identity types for guest sessions and command runs.

mod run_id;
mod session_id;

pub use run_id::{InvalidRunId, RunId};
pub use session_id::SessionId;
