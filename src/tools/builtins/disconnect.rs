//! Session release built-in tool.

use crate::guest::GuestContext;
use crate::tools::{envelope, ToolConfig, ToolDefinition, ToolExecutionFuture, ToolExecutorTrait};
use serde_json::{json, Value};
use std::sync::Arc;

const TOOL_NAME: &str = "disconnect_session";

/// Releases the current session's VM handle and host connection.
#[derive(Debug, Clone)]
pub struct DisconnectSessionTool {
    ctx: Arc<GuestContext>,
}

impl DisconnectSessionTool {
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
            "Logs out of the current session and releases the VM and host connection.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ))
    }
}

impl ToolExecutorTrait for DisconnectSessionTool {
    fn execute(&self, _args: Value) -> ToolExecutionFuture {
        let ctx = self.ctx.clone();

        Box::pin(async move {
            Ok(match ctx.disconnect().await {
                Some(info) => envelope::message(format!("Session {} closed.", info.session_id)),
                None => envelope::message("No active session."),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VixToolsConfig;
    use crate::guest::ConnectRequest;
    use crate::vix::StubVix;

    #[tokio::test]
    async fn disconnect_releases_and_is_idempotent() {
        let stub = Arc::new(StubVix::new());
        let ctx = Arc::new(GuestContext::new(stub.clone(), VixToolsConfig::default()));
        let request: ConnectRequest = serde_json::from_value(json!({
            "vmx_file_path": "/vms/a.vmx",
            "guest_user_name": "ops",
            "guest_password": "secret"
        }))
        .unwrap();
        ctx.connect_and_login(&request).await.unwrap();

        let tool = DisconnectSessionTool::new(ctx);
        let first = tool.execute(json!({})).await.unwrap();
        assert_eq!(first["success"], true);
        assert!(first["message"].as_str().unwrap().contains("closed"));
        assert_eq!(stub.live_handles(), 0);

        let second = tool.execute(Value::Null).await.unwrap();
        assert_eq!(second["message"], "No active session.");
    }
}
