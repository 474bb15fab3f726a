//! MCP server for the guest tools.
//!
//! The transport and protocol handling come from `poem-mcpserver`; each tool
//! method forwards its arguments to the [`ToolRegistry`], which validates
//! them, applies the tool's timeout and keeps the execution counters.
//! Stdout carries protocol frames only, so nothing here prints.

use crate::tools::{envelope, ToolErrorKind, ToolRegistry};
use poem_mcpserver::{content::Text, stdio::stdio, McpServer, Tools};
use serde_json::{json, Value};
use std::io;
use std::sync::Arc;

/// Serves the registered guest tools to one MCP client.
#[derive(Debug, Clone)]
pub struct GuestToolServer {
    registry: Arc<ToolRegistry>,
}

#[Tools]
impl GuestToolServer {
    /// Run `ps aux` in the guest of the current session and return its output
    async fn list_processes_in_guest(
        &self,
        /// Guest directory for the output file (default from configuration)
        guest_temp_path: Option<String>,
        /// Host directory for the copied output file (default from configuration)
        host_temp_path: Option<String>,
    ) -> Result<Text<String>, String> {
        self.call(
            "list_processes_in_guest",
            json!({
                "guest_temp_path": guest_temp_path,
                "host_temp_path": host_temp_path,
            }),
        )
        .await
    }

    /// Connect to the host, open the VM, wait for VMware Tools and log in,
    /// then release everything again. The current session is not touched.
    #[allow(clippy::too_many_arguments)]
    async fn check_guest_connection(
        &self,
        /// Virtualization host; empty for the local host
        host_name: Option<String>,
        /// Host port; 0 lets the library choose
        host_port: Option<i32>,
        /// Host user name; empty for Workstation
        host_user_name: Option<String>,
        /// Host password; empty for Workstation
        host_password: Option<String>,
        /// Path of the VM's .vmx file
        vmx_file_path: String,
        /// User to log in as inside the guest
        guest_user_name: String,
        /// Password of the guest user
        guest_password: String,
    ) -> Result<Text<String>, String> {
        self.call(
            "check_guest_connection",
            connect_args(
                host_name,
                host_port,
                host_user_name,
                host_password,
                vmx_file_path,
                guest_user_name,
                guest_password,
            ),
        )
        .await
    }

    /// Connect to the host, open the VM, wait for VMware Tools and log in to
    /// the guest. Replaces any existing session.
    #[allow(clippy::too_many_arguments)]
    async fn connect_and_login(
        &self,
        /// Virtualization host; empty for the local host
        host_name: Option<String>,
        /// Host port; 0 lets the library choose
        host_port: Option<i32>,
        /// Host user name; empty for Workstation
        host_user_name: Option<String>,
        /// Host password; empty for Workstation
        host_password: Option<String>,
        /// Path of the VM's .vmx file
        vmx_file_path: String,
        /// User to log in as inside the guest
        guest_user_name: String,
        /// Password of the guest user
        guest_password: String,
    ) -> Result<Text<String>, String> {
        self.call(
            "connect_and_login",
            connect_args(
                host_name,
                host_port,
                host_user_name,
                host_password,
                vmx_file_path,
                guest_user_name,
                guest_password,
            ),
        )
        .await
    }

    /// Run a shell command in the guest of the current session and return
    /// its combined stdout and stderr
    async fn exec_command_in_guest_session(
        &self,
        /// Command to run through the guest shell
        command: String,
        /// Guest directory for the output file (default from configuration)
        guest_temp_path: Option<String>,
        /// Host directory for the copied output file (default from configuration)
        host_temp_path: Option<String>,
        /// Overall limit for this call in seconds
        timeout_secs: Option<u64>,
    ) -> Result<Text<String>, String> {
        self.call(
            "exec_command_in_guest_session",
            json!({
                "command": command,
                "guest_temp_path": guest_temp_path,
                "host_temp_path": host_temp_path,
                "timeout_secs": timeout_secs,
            }),
        )
        .await
    }

    /// Release the current session's VM and host handles
    async fn disconnect_session(&self) -> Result<Text<String>, String> {
        self.call("disconnect_session", json!({})).await
    }
}

impl GuestToolServer {
    /// Creates a server over `registry`.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Runs a registered tool and renders its result envelope as text.
    ///
    /// A failed envelope is returned as `Err`, which MCP reports as a tool
    /// error result.
    ///
    /// # Errors
    ///
    /// Returns the envelope text when the tool did not succeed.
    pub async fn call(&self, name: &str, args: Value) -> Result<Text<String>, String> {
        let result = match self.registry.execute(name, args).await {
            Ok(result) => result,
            Err(error) => {
                let kind = match error.kind() {
                    ToolErrorKind::Timeout { .. } => "timeout",
                    ToolErrorKind::ValidationFailed { .. } => "invalid_argument",
                    ToolErrorKind::NotFound { .. } => "not_found",
                    _ => "internal",
                };
                envelope::failure_with_kind(kind, error.to_string())
            }
        };

        let text = result.to_string();
        if envelope::is_success(&result) {
            Ok(Text(text))
        } else {
            Err(text)
        }
    }

    /// Serves MCP on stdin/stdout until the client closes its input.
    ///
    /// The registry's counters are logged when the server stops.
    ///
    /// # Errors
    ///
    /// Returns an error when reading or writing stdio fails.
    pub async fn serve_stdio(self) -> io::Result<()> {
        let registry = self.registry.clone();
        tracing::info!(tools = registry.tool_count(), "MCP server started on stdio");

        let result = stdio(McpServer::new().tools(self)).await;

        let metrics = registry.metrics_snapshot();
        tracing::info!(
            tools_registered = metrics.tools_registered,
            executions_requested = metrics.executions_requested,
            executions_succeeded = metrics.executions_succeeded,
            executions_failed = metrics.executions_failed,
            "MCP server stopped"
        );
        result
    }
}

fn connect_args(
    host_name: Option<String>,
    host_port: Option<i32>,
    host_user_name: Option<String>,
    host_password: Option<String>,
    vmx_file_path: String,
    guest_user_name: String,
    guest_password: String,
) -> Value {
    json!({
        "host_name": host_name.unwrap_or_default(),
        "host_port": host_port.unwrap_or_default(),
        "host_user_name": host_user_name.unwrap_or_default(),
        "host_password": host_password.unwrap_or_default(),
        "vmx_file_path": vmx_file_path,
        "guest_user_name": guest_user_name,
        "guest_password": guest_password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GuestConfig, VixToolsConfig};
    use crate::guest::GuestContext;
    use crate::tools::GuestTools;
    use crate::vix::StubVix;
    use tempfile::TempDir;

    fn server(host_dir: &TempDir) -> GuestToolServer {
        let stub = Arc::new(StubVix::new().with_command_output("echo hi", "hi\n"));
        let config = VixToolsConfig {
            guest: GuestConfig::default()
                .with_host_temp_dir(host_dir.path())
                .with_polling(0, 2, 1),
            ..VixToolsConfig::default()
        };
        let ctx = Arc::new(GuestContext::new(stub, config));
        let mut registry = ToolRegistry::new();
        GuestTools::all(ctx).register_into(&mut registry).unwrap();
        GuestToolServer::new(Arc::new(registry))
    }

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn guest_failure_is_tool_error_result() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);

        let Err(text) = server.call("list_processes_in_guest", json!({})).await else {
            panic!("listing without a session succeeded");
        };
        assert_eq!(parse(&text)["error_kind"], "no_active_session");
    }

    #[tokio::test]
    async fn connect_then_exec() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);

        let args = connect_args(
            None,
            None,
            None,
            None,
            "/vms/a.vmx".to_string(),
            "ops".to_string(),
            "secret".to_string(),
        );
        let Text(connected) = server.call("connect_and_login", args).await.unwrap();
        assert_eq!(parse(&connected)["success"], true);

        let Text(output) = server
            .call(
                "exec_command_in_guest_session",
                json!({"command": "echo hi", "guest_temp_path": null, "timeout_secs": null}),
            )
            .await
            .unwrap();
        assert_eq!(parse(&output), json!({"success": true, "output": "hi\n"}));

        let Text(closed) = server.call("disconnect_session", json!({})).await.unwrap();
        assert_eq!(parse(&closed)["success"], true);
    }

    #[test]
    fn connect_args_fill_host_defaults() {
        let args = connect_args(
            None,
            Some(902),
            None,
            None,
            "/vms/a.vmx".to_string(),
            "ops".to_string(),
            String::new(),
        );
        assert_eq!(args["host_name"], "");
        assert_eq!(args["host_port"], 902);
        assert_eq!(args["guest_password"], "");
    }

    #[tokio::test]
    async fn registry_errors_become_failed_envelopes() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);

        let Err(text) = server.call("reboot_guest", json!({})).await else {
            panic!("unknown tool succeeded");
        };
        assert_eq!(parse(&text)["error_kind"], "not_found");

        let Err(text) = server
            .call("exec_command_in_guest_session", json!({}))
            .await
        else {
            panic!("exec without a command succeeded");
        };
        let value = parse(&text);
        assert_eq!(value["success"], false);
        assert_eq!(value["error_kind"], "invalid_argument");
    }

    #[tokio::test]
    async fn counters_follow_tool_calls() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);

        server.call("disconnect_session", json!({})).await.unwrap();
        let _ = server.call("reboot_guest", json!({})).await;

        let metrics = server.registry.metrics_snapshot();
        assert_eq!(metrics.tools_registered, 5);
        assert_eq!(metrics.executions_requested, 2);
        assert_eq!(metrics.executions_succeeded, 1);
        assert_eq!(metrics.executions_failed, 1);
    }
}
