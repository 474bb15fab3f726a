//! Guest tools exposed by the server.
//!
//! ## Available Tools
//!
//! ### Session Tools
//! - **check_guest_connection**: connect, log in and release again
//! - **connect_and_login**: establish the session used by later commands
//! - **disconnect_session**: release the session
//!
//! ### Command Tools
//! - **exec_command_in_guest_session**: run a shell command in the guest
//! - **list_processes_in_guest**: run `ps aux` in the guest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vix_guest_tools::prelude::*;
//!
//! let ctx = Arc::new(GuestContext::new(Arc::new(StubVix::new()), VixToolsConfig::default()));
//! let mut registry = ToolRegistry::new();
//! GuestTools::all(ctx).register_into(&mut registry)?;
//! ```

mod check_connection;
mod connect;
mod disconnect;
mod exec_command;
mod list_processes;

pub use check_connection::CheckConnectionTool;
pub use connect::ConnectAndLoginTool;
pub use disconnect::DisconnectSessionTool;
pub use exec_command::ExecCommandTool;
pub use list_processes::ListProcessesTool;

use crate::config::GuestConfig;
use crate::guest::GuestContext;
use crate::tools::{SharedToolExecutor, ToolConfig, ToolError, ToolRegistry};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// The guest tools, ready to register.
#[derive(Debug, Default)]
pub struct GuestTools {
    /// Tool configurations by name
    configs: HashMap<String, ToolConfig>,
    /// Tool executors by name
    executors: HashMap<String, SharedToolExecutor>,
}

impl GuestTools {
    /// Creates every guest tool over `ctx`.
    #[must_use]
    pub fn all(ctx: Arc<GuestContext>) -> Self {
        let mut tools = Self::default();

        let list = ListProcessesTool::new(ctx.clone());
        tools.insert(list.config(), Arc::new(list));
        let check = CheckConnectionTool::new(ctx.clone());
        tools.insert(check.config(), Arc::new(check));
        let connect = ConnectAndLoginTool::new(ctx.clone());
        tools.insert(connect.config(), Arc::new(connect));
        let exec = ExecCommandTool::new(ctx.clone());
        tools.insert(exec.config(), Arc::new(exec));
        let disconnect = DisconnectSessionTool::new(ctx);
        tools.insert(disconnect.config(), Arc::new(disconnect));

        tools
    }

    /// Lists all guest tool names.
    #[must_use]
    pub fn available() -> Vec<&'static str> {
        vec![
            "list_processes_in_guest",
            "check_guest_connection",
            "connect_and_login",
            "exec_command_in_guest_session",
            "disconnect_session",
        ]
    }

    /// Returns the configuration for a specific tool.
    #[must_use]
    pub fn get_config(&self, name: &str) -> Option<&ToolConfig> {
        self.configs.get(name)
    }

    /// Returns the number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Returns true if there are no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Registers every tool with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error if a tool name is already taken.
    pub fn register_into(self, registry: &mut ToolRegistry) -> Result<(), ToolError> {
        let mut executors = self.executors;
        let mut configs: Vec<ToolConfig> = self.configs.into_values().collect();
        configs.sort_by(|a, b| a.definition.name.cmp(&b.definition.name));

        for config in configs {
            let executor = executors.remove(&config.definition.name).ok_or_else(|| {
                ToolError::internal(format!(
                    "executor not found for tool: {}",
                    config.definition.name
                ))
            })?;
            registry.register(config, executor)?;
        }
        Ok(())
    }

    fn insert(&mut self, config: ToolConfig, executor: SharedToolExecutor) {
        let name = config.definition.name.clone();
        self.configs.insert(name.clone(), config);
        self.executors.insert(name, executor);
    }
}

/// Deserializes tool arguments, treating `null` as an empty object.
pub(crate) fn parse_args<T: DeserializeOwned>(tool_name: &str, args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args)
        .map_err(|e| ToolError::validation_failed(tool_name, format!("invalid arguments: {e}")))
}

/// Input schema shared by the two connect tools.
pub(crate) fn connect_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "host_name": {
                "type": "string",
                "description": "Virtualization host; empty for the local host"
            },
            "host_port": {
                "type": "integer",
                "description": "Host port; 0 lets the library choose",
                "minimum": 0
            },
            "host_user_name": {
                "type": "string",
                "description": "Host user name; empty for Workstation"
            },
            "host_password": {
                "type": "string",
                "description": "Host password; empty for Workstation"
            },
            "vmx_file_path": {
                "type": "string",
                "description": "Path of the VM's .vmx file"
            },
            "guest_user_name": {
                "type": "string",
                "description": "User to log in as inside the guest"
            },
            "guest_password": {
                "type": "string",
                "description": "Password of the guest user"
            }
        },
        "required": ["vmx_file_path", "guest_user_name", "guest_password"]
    })
}

/// Schema properties for the staging directory arguments.
pub(crate) fn staging_properties(config: &GuestConfig) -> Value {
    json!({
        "guest_temp_path": {
            "type": "string",
            "description": format!(
                "Guest directory for the output file (default: {})",
                config.guest_temp_dir
            )
        },
        "host_temp_path": {
            "type": "string",
            "description": format!(
                "Host directory for the copied output file (default: {})",
                config.host_temp_dir().display()
            )
        }
    })
}

/// Worst-case time for one staged command: every job at its deadline plus
/// the settle delay and poll pauses.
pub(crate) fn command_timeout(config: &GuestConfig) -> Duration {
    let jobs = config.output_poll_attempts.saturating_add(4);
    config
        .job_timeout()
        .saturating_mul(jobs)
        .saturating_add(config.settle_delay())
        .saturating_add(config.poll_interval().saturating_mul(config.output_poll_attempts))
}

/// Worst-case time for the connect sequence.
pub(crate) fn connect_timeout(config: &GuestConfig) -> Duration {
    config
        .job_timeout()
        .saturating_mul(3)
        .saturating_add(config.tools_job_timeout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VixToolsConfig;
    use crate::vix::StubVix;

    fn ctx() -> Arc<GuestContext> {
        Arc::new(GuestContext::new(
            Arc::new(StubVix::new()),
            VixToolsConfig::default(),
        ))
    }

    #[test]
    fn guest_tools_all_creates_all_tools() {
        let tools = GuestTools::all(ctx());
        assert_eq!(tools.len(), 5);

        for name in GuestTools::available() {
            assert!(tools.get_config(name).is_some(), "missing config for {name}");
        }
    }

    #[test]
    fn register_into_fills_registry() {
        let mut registry = ToolRegistry::new();
        GuestTools::all(ctx()).register_into(&mut registry).unwrap();
        assert_eq!(registry.tool_count(), 5);

        let err = GuestTools::all(ctx())
            .register_into(&mut registry)
            .unwrap_err();
        assert!(err.is_already_registered());
    }

    #[test]
    fn tool_configs_have_valid_schemas() {
        let tools = GuestTools::all(ctx());
        for name in GuestTools::available() {
            let config = tools.get_config(name).unwrap();
            assert!(!config.definition.description.is_empty());
            assert_eq!(config.definition.input_schema["type"], "object", "{name}");
        }
    }

    #[test]
    fn parse_args_treats_null_as_empty() {
        #[derive(serde::Deserialize)]
        struct Args {
            #[serde(default)]
            value: Option<String>,
        }
        let args: Args = parse_args("t", Value::Null).unwrap();
        assert!(args.value.is_none());
    }

    #[test]
    fn tool_timeouts_cover_default_job_timeouts() {
        let config = GuestConfig::default();
        assert!(command_timeout(&config) > config.job_timeout() * 5);
        assert!(connect_timeout(&config) > config.tools_job_timeout());
    }
}
