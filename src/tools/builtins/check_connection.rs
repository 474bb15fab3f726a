//! Guest connection check built-in tool.

use super::{connect_timeout, connect_schema, parse_args};
use crate::guest::{ConnectRequest, GuestContext};
use crate::tools::{envelope, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const TOOL_NAME: &str = "check_guest_connection";

/// Message returned when the check passes.
pub const CHECK_SUCCESS_MESSAGE: &str = "Successfully logged in to guest OS.";

/// Connects, logs in to the guest and releases everything again.
///
/// The session used by other tools is not touched.
#[derive(Debug, Clone)]
pub struct CheckConnectionTool {
    ctx: Arc<GuestContext>,
}

impl CheckConnectionTool {
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
            "Checks that the host is reachable, the VM opens, VMware Tools is running and the guest credentials work. Does not keep a session.",
            connect_schema(),
        ))
        .with_timeout(self.timeout())
    }
}

impl ToolExecutorTrait for CheckConnectionTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let ctx = self.ctx.clone();

        Box::pin(async move {
            let request: ConnectRequest = parse_args(TOOL_NAME, args)?;
            Ok(match ctx.check_connection(&request).await {
                Ok(()) => envelope::message(CHECK_SUCCESS_MESSAGE),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VixToolsConfig;
    use crate::vix::{StubVix, VixCode, VixOp};
    use serde_json::json;

    fn args() -> Value {
        json!({
            "vmxFilePath": "/vms/a.vmx",
            "guestUserName": "ops",
            "guestPassword": "secret"
        })
    }

    #[tokio::test]
    async fn success_message_and_no_session() {
        let stub = Arc::new(StubVix::new());
        let ctx = Arc::new(GuestContext::new(stub.clone(), VixToolsConfig::default()));
        let tool = CheckConnectionTool::new(ctx.clone());

        let result = tool.execute(args()).await.unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["message"], CHECK_SUCCESS_MESSAGE);
        assert!(ctx.session_info().await.is_none());
        assert_eq!(stub.live_handles(), 0);
    }

    #[tokio::test]
    async fn login_failure_is_enveloped() {
        let stub = Arc::new(
            StubVix::new().with_failure(VixOp::LoginInGuest, VixCode::GUEST_USER_PERMISSIONS),
        );
        let ctx = Arc::new(GuestContext::new(stub, VixToolsConfig::default()));
        let tool = CheckConnectionTool::new(ctx);

        let result = tool.execute(args()).await.unwrap();
        assert_eq!(result["success"], false);
        assert_eq!(result["error_kind"], "guest_login");
        assert!(result["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to login to guest: "));
    }

    #[test]
    fn missing_vmx_path_fails_validation() {
        let ctx = Arc::new(GuestContext::new(
            Arc::new(StubVix::new()),
            VixToolsConfig::default(),
        ));
        let tool = CheckConnectionTool::new(ctx);
        let err = tool
            .validate_args(&json!({"guest_user_name": "ops", "guest_password": "x"}))
            .unwrap_err();
        assert!(err.is_invalid_params());
    }
}
