//! Tool system for vix-guest-tools.
//!
//! This module provides the infrastructure for tool registration and execution:
//!
//! - **Definition**: tool metadata and the executor trait
//! - **Registry**: registration, argument validation, timeouts and dispatch
//! - **Envelope**: the `{ success, ... }` result objects
//! - **Builtins**: the guest session and command tools
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |                       ToolRegistry                           |
//! |                                                              |
//! |  register --> tools: HashMap<String, RegisteredTool>        |
//! |  list     --> Vec<ToolDefinition>                           |
//! |  execute  --> validate_args --> timeout(execute(args))      |
//! |                                                              |
//! +-------------------------------------------------------------+
//!                            |
//!                            v
//! +-------------------------------------------------------------+
//! |              Guest tool (one per name)                       |
//! |                                                              |
//! |  Arc<GuestContext> --> session / staged command             |
//! |                                                              |
//! +-------------------------------------------------------------+
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vix_guest_tools::prelude::*;
//!
//! let mut registry = ToolRegistry::new();
//! GuestTools::all(ctx).register_into(&mut registry)?;
//!
//! let result = registry
//!     .execute("exec_command_in_guest_session", json!({"command": "uname -a"}))
//!     .await?;
//! ```

pub mod builtins;
pub mod definition;
pub mod envelope;
pub mod error;
pub mod registry;

// Re-exports
pub use builtins::GuestTools;
pub use definition::{
    SharedToolExecutor, ToolConfig, ToolDefinition, ToolExecutionFuture, ToolExecutorTrait,
};
pub use error::{ToolError, ToolErrorKind};
pub use registry::{RegisteredTool, RegistryMetrics, ToolRegistry};
