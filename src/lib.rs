//! # vix-guest-tools: guest commands over MCP
//!
//! Exposes a VMware virtual machine's guest shell to MCP clients through the
//! VIX API. A client connects and logs in once, then runs commands whose
//! combined output is staged in a guest file, copied to the host and
//! returned as text.
//!
//! ## Architecture
//!
//! - **Vix**: the [`vix::VixBackend`] seam, with a native FFI backend and an
//!   in-memory stub
//! - **Guest**: connect sequence, session ownership and staged command runs
//! - **Tools**: the tool registry and the five guest tools
//! - **Server**: the tools served over MCP stdio with `poem-mcpserver`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vix_guest_tools::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = vix_guest_tools::config::load()?;
//!     let ctx = Arc::new(GuestContext::new(Arc::new(StubVix::new()), config));
//!
//!     let mut registry = ToolRegistry::new();
//!     GuestTools::all(ctx).register_into(&mut registry)?;
//!
//!     GuestToolServer::new(Arc::new(registry)).serve_stdio().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod guest;
pub mod logging;
pub mod server;
pub mod tools;
pub mod types;
pub mod vix;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{GuestConfig, HostConfig, VixToolsConfig};
    pub use crate::error::{ConfigError, GuestError, GuestErrorKind, GuestStep};
    pub use crate::guest::{ConnectRequest, GuestContext, SessionInfo, StagingDirs};
    pub use crate::logging::{init_logging, LogLevel, LoggingConfig, LoggingGuard};
    pub use crate::server::GuestToolServer;
    pub use crate::tools::{
        GuestTools, ToolConfig, ToolDefinition, ToolError, ToolExecutorTrait, ToolRegistry,
    };
    pub use crate::types::{RunId, SessionId};
    pub use crate::vix::{StubVix, VixBackend, VixCode, VixHandle};

    pub use serde_json::json;
    pub use std::sync::Arc;
}
