//! Session identifier type using TypeID format.
//!
//! Format: `sess_01h455vb4pex5vsknk084sn02q`

use mti::prelude::*;
use serde::{Serialize, Serializer};
use std::fmt;

/// Identifies one established guest session in logs and tool replies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(MagicTypeId);

impl SessionId {
    /// The TypeID prefix for session identifiers.
    pub const PREFIX: &'static str = "sess";

    /// Creates a new session ID with a fresh UUIDv7.
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SessionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.to_string().serialize(serializer)
    }
}
