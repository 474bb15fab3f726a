//! Session establishment built-in tool.

use super::{connect_timeout, connect_schema, parse_args};
use crate::guest::{ConnectRequest, GuestContext};
use crate::tools::{envelope, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const TOOL_NAME: &str = "connect_and_login";

/// Message returned once the session is stored.
pub const CONNECTED_MESSAGE: &str = "Connected and logged in. Session is ready for commands.";

/// Connects to the host, opens the VM, logs in and keeps the session.
///
/// An existing session is released first.
#[derive(Debug, Clone)]
pub struct ConnectAndLoginTool {
    ctx: Arc<GuestContext>,
}

impl ConnectAndLoginTool {
    /// Creates the tool over a shared context.
    #[must_use]
    pub fn new(ctx: Arc<GuestContext>) -> Self {
        Self { ctx }
    }

    /// Returns the tool configuration for registration.
    #[must_use]
    pub fn config(&self) -> ToolConfig {
        ToolConfig::new(ToolDefinition::new(
            TOOL_NAME,
            "Connects to the virtualization host, opens the VM, waits for VMware Tools and logs in to the guest. The session is kept for later commands and replaces any previous one.",
            connect_schema(),
        ))
        .with_timeout(self.timeout())
    }
}

impl ToolExecutorTrait for ConnectAndLoginTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let ctx = self.ctx.clone();

        Box::pin(async move {
            let request: ConnectRequest = parse_args(TOOL_NAME, args)?;
            Ok(match ctx.connect_and_login(&request).await {
                Ok(_) => envelope::message(CONNECTED_MESSAGE),
                Err(error) => envelope::failure(&error),
            })
        })
    }

    fn timeout(&self) -> Duration {
        connect_timeout(&self.ctx.config().guest)
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        parse_args::<ConnectRequest>(TOOL_NAME, args.clone()).map(|_| ())
    }
}
