//! Guest command execution built-in tool.
//!
//! Runs a shell command in the guest through the current session and
//! returns its combined output.

use super::{command_timeout, parse_args, staging_properties};
use crate::guest::GuestContext;
use crate::tools::{envelope, ToolConfig, ToolDefinition, ToolError, ToolExecutionFuture, ToolExecutorTrait};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const TOOL_NAME: &str = "exec_command_in_guest_session";

/// Guest command execution tool executor.
#[derive(Debug, Clone)]
pub struct ExecCommandTool {
    ctx: Arc<GuestContext>,
}

/// Arguments for the exec command tool.
#[derive(Debug, Deserialize)]
struct ExecCommandArgs {
    /// Command to run through the guest shell
    command: String,
    #[serde(default, alias = "guestTempPath")]
    guest_temp_path: Option<String>,
    #[serde(default, alias = "hostTempPath")]
    host_temp_path: Option<String>,
    /// Overall limit for this call
    #[serde(default, alias = "timeoutSecs")]
    timeout_secs: Option<u64>,
}

impl ExecCommandTool {
    /// Creates the tool over a shared context.
    #[must_use]
    pub fn new(ctx: Arc<GuestContext>) -> Self {
        Self { ctx }
    }

    /// Returns the tool configuration for registration.
    #[must_use]
    pub fn config(&self) -> ToolConfig {
        let mut properties = staging_properties(&self.ctx.config().guest);
        properties["command"] = json!({
            "type": "string",
            "description": "Shell command to run in the guest; stdout and stderr are returned together"
        });
        properties["timeout_secs"] = json!({
            "type": "integer",
            "description": "Overall limit for this call in seconds",
            "minimum": 1,
            "maximum": self.timeout().as_secs()
        });

        ToolConfig::new(ToolDefinition::new(
            TOOL_NAME,
            "Executes a command in the guest OS using the current session and returns its output.",
            json!({
                "type": "object",
                "properties": properties,
                "required": ["command"]
            }),
        ))
        .with_timeout(self.timeout())
    }
}

impl ToolExecutorTrait for ExecCommandTool {
    fn execute(&self, args: Value) -> ToolExecutionFuture {
        let ctx = self.ctx.clone();
        let limit = self.timeout();

        Box::pin(async move {
            let args: ExecCommandArgs = parse_args(TOOL_NAME, args)?;

            let dirs = match ctx.staging_dirs(args.guest_temp_path, args.host_temp_path) {
                Ok(dirs) => dirs,
                Err(error) => return Ok(envelope::failure(&error)),
            };
            let timeout = args
                .timeout_secs
                .map(|secs| Duration::from_secs(secs).min(limit));

            Ok(match ctx.exec_command(&args.command, &dirs, timeout).await {
                Ok(output) => envelope::output(output),
                Err(error) => envelope::failure(&error),
            })
        })
    }

    fn timeout(&self) -> Duration {
        command_timeout(&self.ctx.config().guest)
    }

    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        let args: ExecCommandArgs = parse_args(TOOL_NAME, args.clone())?;
        if args.timeout_secs == Some(0) {
            return Err(ToolError::validation_failed(
                TOOL_NAME,
                "timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GuestConfig, VixToolsConfig};
    use crate::guest::ConnectRequest;
    use crate::vix::{StubVix, VixCode, VixOp};
    use tempfile::TempDir;

    fn context(stub: &Arc<StubVix>, host_dir: &TempDir) -> Arc<GuestContext> {
        let config = VixToolsConfig {
            guest: GuestConfig::default()
                .with_host_temp_dir(host_dir.path())
                .with_polling(0, 2, 1),
            ..VixToolsConfig::default()
        };
        Arc::new(GuestContext::new(stub.clone(), config))
    }

    async fn connect(ctx: &GuestContext) {
        let request: ConnectRequest = serde_json::from_value(json!({
            "vmx_file_path": "/vms/a.vmx",
            "guest_user_name": "ops",
            "guest_password": "secret"
        }))
        .unwrap();
        ctx.connect_and_login(&request).await.unwrap();
    }

    #[tokio::test]
    async fn echo_returns_output() {
        let temp = TempDir::new().unwrap();
        let stub = Arc::new(StubVix::new().with_command_output("echo hi", "hi\n"));
        let ctx = context(&stub, &temp);
        connect(&ctx).await;

        let tool = ExecCommandTool::new(ctx);
        let result = tool.execute(json!({"command": "echo hi"})).await.unwrap();
        assert_eq!(result, json!({"success": true, "output": "hi\n"}));
    }

    #[tokio::test]
    async fn without_session_reports_no_active_session() {
        let temp = TempDir::new().unwrap();
        let stub = Arc::new(StubVix::new());
        let tool = ExecCommandTool::new(context(&stub, &temp));

        let result = tool.execute(json!({"command": "ls"})).await.unwrap();
        assert_eq!(
            result["error"],
            "No active session. Please connect and login first."
        );
        assert_eq!(stub.count(VixOp::RunProgram), 0);
    }

    #[tokio::test]
    async fn start_failure_is_enveloped() {
        let temp = TempDir::new().unwrap();
        let stub = Arc::new(StubVix::new());
        let ctx = context(&stub, &temp);
        connect(&ctx).await;
        stub.set_failure(VixOp::RunProgram, VixCode::GUEST_USER_PERMISSIONS);

        let tool = ExecCommandTool::new(ctx);
        let result = tool.execute(json!({"command": "ls"})).await.unwrap();
        assert_eq!(result["success"], false);
        assert_eq!(result["error_kind"], "command_execution");
        assert_eq!(stub.count(VixOp::FileExists), 0);
    }

    #[test]
    fn command_is_required() {
        let temp = TempDir::new().unwrap();
        let stub = Arc::new(StubVix::new());
        let tool = ExecCommandTool::new(context(&stub, &temp));

        assert!(tool.validate_args(&json!({})).is_err());
        assert!(tool
            .validate_args(&json!({"command": "ls", "timeout_secs": 0}))
            .is_err());
        assert!(tool
            .validate_args(&json!({"command": "ls", "timeoutSecs": 30}))
            .is_ok());
    }

    #[test]
    fn schema_lists_command_and_staging_paths() {
        let temp = TempDir::new().unwrap();
        let stub = Arc::new(StubVix::new());
        let config = ExecCommandTool::new(context(&stub, &temp)).config();
        let schema = &config.definition.input_schema;

        assert_eq!(schema["required"], json!(["command"]));
        assert!(schema["properties"]["guest_temp_path"].is_object());
        assert!(schema["properties"]["timeout_secs"].is_object());
    }
}
