//! Tool registry.
//!
//! The registry holds every tool the server exposes. It handles registration,
//! argument validation, timeout enforcement and execution dispatch.

use crate::tools::definition::{SharedToolExecutor, ToolConfig, ToolDefinition};
use crate::tools::envelope;
use crate::tools::error::ToolError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// A registered tool entry.
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    /// The tool configuration
    pub config: ToolConfig,
    /// The tool executor
    pub executor: SharedToolExecutor,
}

/// Metrics for the Tool Registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryMetrics {
    /// Total tools registered
    pub tools_registered: u64,
    /// Total executions requested
    pub executions_requested: u64,
    /// Total executions succeeded
    pub executions_succeeded: u64,
    /// Total executions failed
    pub executions_failed: u64,
}

/// Registry of tools keyed by name.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    metrics: Mutex<RegistryMetrics>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its definition's name.
    ///
    /// # Errors
    ///
    /// Returns an error if a tool with that name is already registered.
    pub fn register(
        &mut self,
        config: ToolConfig,
        executor: SharedToolExecutor,
    ) -> Result<(), ToolError> {
        let tool_name = config.definition.name.clone();
        if self.tools.contains_key(&tool_name) {
            tracing::error!(tool_name = %tool_name, "Tool registration failed: duplicate name");
            return Err(ToolError::already_registered(tool_name));
        }

        self.tools
            .insert(tool_name.clone(), RegisteredTool { config, executor });
        self.metrics().tools_registered += 1;
        tracing::info!(tool_name = %tool_name, "Tool registered");
        Ok(())
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Returns every tool definition, sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDefinition> {
        let mut tools: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| tool.config.definition.clone())
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Returns a snapshot of the execution counters.
    #[must_use]
    pub fn metrics_snapshot(&self) -> RegistryMetrics {
        self.metrics().clone()
    }

    /// Validates the arguments and runs the named tool under its timeout.
    ///
    /// A result envelope with `success: false` counts as a failed execution
    /// but is still returned as `Ok`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown tool, rejected arguments, or when the
    /// tool's timeout elapses.
    pub async fn execute(&self, tool_name: &str, args: Value) -> Result<Value, ToolError> {
        self.metrics().executions_requested += 1;

        let Some(registered) = self.tools.get(tool_name) else {
            self.metrics().executions_failed += 1;
            return Err(ToolError::not_found(tool_name));
        };

        let executor = registered.executor.clone();
        let timeout = registered.config.timeout;

        if let Err(error) = executor.validate_args(&args) {
            self.metrics().executions_failed += 1;
            tracing::warn!(tool_name = %tool_name, error = %error, "Tool arguments rejected");
            return Err(error);
        }

        tracing::debug!(tool_name = %tool_name, timeout_secs = timeout.as_secs(), "Executing tool");
        let result = match tokio::time::timeout(timeout, executor.execute(args)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::timeout(tool_name, timeout)),
        };

        let succeeded = matches!(&result, Ok(value) if envelope::is_success(value));
        {
            let mut metrics = self.metrics();
            if succeeded {
                metrics.executions_succeeded += 1;
            } else {
                metrics.executions_failed += 1;
            }
        }

        match &result {
            Ok(_) => tracing::info!(tool_name = %tool_name, success = succeeded, "Tool executed"),
            Err(error) => tracing::error!(tool_name = %tool_name, error = %error, "Tool execution failed"),
        }
        result
    }

    fn metrics(&self) -> MutexGuard<'_, RegistryMetrics> {
        self.metrics.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
