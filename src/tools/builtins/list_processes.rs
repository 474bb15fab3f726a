//! Guest process listing built-in tool.
//!
//! Runs `ps aux` in the guest through the current session.

use super::{command_timeout, parse_args, staging_properties};
use crate::guest::GuestContext;
use crate::tools::{envelope, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const TOOL_NAME: &str = "list_processes_in_guest";

/// Lists the processes running in the guest.
#[derive(Debug, Clone)]
pub struct ListProcessesTool {
    ctx: Arc<GuestContext>,
}

/// Arguments for the list processes tool.
#[derive(Debug, Default, Deserialize)]
struct ListProcessesArgs {
    #[serde(default, alias = "guestTempPath")]
    guest_temp_path: Option<String>,
    #[serde(default, alias = "hostTempPath")]
    host_temp_path: Option<String>,
}

impl ListProcessesTool {
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
            "Lists all running processes inside the guest VM (ps aux) using the current session.",
            json!({
                "type": "object",
                "properties": staging_properties(&self.ctx.config().guest),
                "required": []
            }),
        ))
        .with_timeout(self.timeout())
    }
}

impl ToolExecutorTrait for ListProcessesTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let ctx = self.ctx.clone();

        Box::pin(async move {
            let args: ListProcessesArgs = parse_args(TOOL_NAME, args)?;

            let dirs = match ctx.staging_dirs(args.guest_temp_path, args.host_temp_path) {
                Ok(dirs) => dirs,
                Err(error) => return Ok(envelope::failure(&error)),
            };

            Ok(match ctx.list_processes(&dirs).await {
                Ok(output) => envelope::output(output),
                Err(error) => envelope::failure(&error),
            })
        })
    }

    fn timeout(&self) -> Duration {
        command_timeout(&self.ctx.config().guest)
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        parse_args::<ListProcessesArgs>(TOOL_NAME, args.clone()).map(|_| ())
    }
}
