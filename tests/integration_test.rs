//! Integration tests for vix-guest-tools.
//!
//! These tests drive the public API against the stub backend:
//! - Session lifecycle through the guest tools
//! - Staged command runs and their side effects
//! - The MCP tool server forwarding to the registry

use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;
use vix_guest_tools::prelude::*;
use vix_guest_tools::vix::{StubCall, VixOp};

fn config(host_dir: &Path) -> VixToolsConfig {
    VixToolsConfig {
        guest: GuestConfig::default()
            .with_host_temp_dir(host_dir)
            .with_polling(0, 3, 1),
        ..VixToolsConfig::default()
    }
}

fn registry(stub: &Arc<StubVix>, host_dir: &Path) -> ToolRegistry {
    let ctx = Arc::new(GuestContext::new(stub.clone(), config(host_dir)));
    let mut registry = ToolRegistry::new();
    GuestTools::all(ctx)
        .register_into(&mut registry)
        .expect("guest tools register");
    registry
}

fn connect_args() -> Value {
    json!({
        "host_name": "",
        "host_port": 0,
        "vmx_file_path": "/vms/ubuntu/ubuntu.vmx",
        "guest_user_name": "ops",
        "guest_password": "secret"
    })
}

fn host_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// Index of the first recorded call matching `pred`.
fn position(calls: &[StubCall], pred: impl Fn(&StubCall) -> bool) -> usize {
    calls
        .iter()
        .position(pred)
        .expect("expected call was recorded")
}

#[tokio::test]
async fn commands_before_connect_report_no_active_session() {
    let temp = TempDir::new().unwrap();
    let stub = Arc::new(StubVix::new());
    let registry = registry(&stub, temp.path());

    for (tool, args) in [
        ("exec_command_in_guest_session", json!({"command": "ls"})),
        ("list_processes_in_guest", json!({})),
    ] {
        let result = registry.execute(tool, args).await.unwrap();
        assert_eq!(result["success"], false, "{tool}");
        assert_eq!(result["error_kind"], "no_active_session", "{tool}");
    }
    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn echo_hi_returns_output_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    let stub = Arc::new(StubVix::new().with_command_output("echo hi", "hi\n"));
    let registry = registry(&stub, temp.path());

    let connected = registry
        .execute("connect_and_login", connect_args())
        .await
        .unwrap();
    assert_eq!(
        connected["message"],
        "Connected and logged in. Session is ready for commands."
    );

    let result = registry
        .execute("exec_command_in_guest_session", json!({"command": "echo hi"}))
        .await
        .unwrap();
    assert_eq!(result, json!({"success": true, "output": "hi\n"}));

    assert_eq!(host_files(temp.path()), 0, "host output file left behind");
    assert!(stub.guest_files().is_empty(), "guest output file left behind");
}

#[tokio::test]
async fn guest_directory_is_created_before_the_command() {
    let temp = TempDir::new().unwrap();
    let stub = Arc::new(StubVix::new());
    let registry = registry(&stub, temp.path());
    registry
        .execute("connect_and_login", connect_args())
        .await
        .unwrap();

    registry
        .execute(
            "exec_command_in_guest_session",
            json!({"command": "uname -a", "guest_temp_path": "/var/tmp/staging"}),
        )
        .await
        .unwrap();

    let calls = stub.calls();
    let mkdir = position(&calls, |call| {
        matches!(call, StubCall::RunProgram { args, .. } if args.contains("mkdir -p"))
    });
    let command = position(&calls, |call| {
        matches!(call, StubCall::RunProgram { args, .. } if args.contains("uname -a"))
    });
    assert!(mkdir < command);
    assert!(matches!(
        &calls[mkdir],
        StubCall::RunProgram { program, args, .. }
            if program == "/bin/bash" && args.contains("/var/tmp/staging")
    ));
}

#[tokio::test]
async fn failing_step_stops_the_run() {
    let cases = [
        (VixOp::FileExists, "output_check", VixOp::CopyFile),
        (VixOp::CopyFile, "file_copy", VixOp::DeleteFile),
    ];

    for (failing, kind, never) in cases {
        let temp = TempDir::new().unwrap();
        let stub = Arc::new(StubVix::new());
        let registry = registry(&stub, temp.path());
        registry
            .execute("connect_and_login", connect_args())
            .await
            .unwrap();
        stub.set_failure(failing, VixCode::GUEST_USER_PERMISSIONS);

        let result = registry
            .execute("exec_command_in_guest_session", json!({"command": "ls"}))
            .await
            .unwrap();
        assert_eq!(result["success"], false);
        assert_eq!(result["error_kind"], kind);
        assert_eq!(stub.count(never), 0, "{never:?} ran after {failing:?} failed");
    }
}

#[tokio::test]
async fn missing_output_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let stub = Arc::new(StubVix::new().without_output_files());
    let registry = registry(&stub, temp.path());
    registry
        .execute("connect_and_login", connect_args())
        .await
        .unwrap();

    let result = registry
        .execute("exec_command_in_guest_session", json!({"command": "true"}))
        .await
        .unwrap();
    assert_eq!(result["error_kind"], "output_missing");
    assert_eq!(stub.count(VixOp::FileExists), 3);
    assert_eq!(stub.count(VixOp::CopyFile), 0);
}

#[tokio::test]
async fn reconnect_releases_previous_handles_first() {
    let temp = TempDir::new().unwrap();
    let stub = Arc::new(StubVix::new());
    let registry = registry(&stub, temp.path());

    registry
        .execute("connect_and_login", connect_args())
        .await
        .unwrap();
    registry
        .execute("connect_and_login", connect_args())
        .await
        .unwrap();

    let calls = stub.calls();
    let first_vm = calls
        .iter()
        .find_map(|call| match call {
            StubCall::WaitForTools { vm, .. } => Some(*vm),
            _ => None,
        })
        .unwrap();
    let release = position(&calls, |call| *call == StubCall::ReleaseHandle(first_vm));
    let disconnect = position(&calls, |call| matches!(call, StubCall::DisconnectHost(_)));
    let second_connect = calls
        .iter()
        .enumerate()
        .filter(|(_, call)| matches!(call, StubCall::ConnectHost { .. }))
        .nth(1)
        .map(|(index, _)| index)
        .unwrap();

    assert!(release < disconnect, "VM handle must go before the host");
    assert!(disconnect < second_connect);
    assert_eq!(stub.live_handles(), 2);
    assert_eq!(stub.stale_releases(), 0);
}

#[tokio::test]
async fn unreachable_host_leaves_no_session() {
    let temp = TempDir::new().unwrap();
    let stub = Arc::new(
        StubVix::new().with_failure(VixOp::ConnectHost, VixCode::CANNOT_CONNECT_TO_HOST),
    );
    let registry = registry(&stub, temp.path());

    let result = registry
        .execute("connect_and_login", connect_args())
        .await
        .unwrap();
    assert_eq!(result["success"], false);
    assert_eq!(
        result["error"],
        "Failed to connect to host: Cannot connect to host"
    );
    assert_eq!(stub.count(VixOp::OpenVm), 0);

    let result = registry
        .execute("exec_command_in_guest_session", json!({"command": "ls"}))
        .await
        .unwrap();
    assert_eq!(result["error_kind"], "no_active_session");
}

#[tokio::test]
async fn check_connection_keeps_existing_session() {
    let temp = TempDir::new().unwrap();
    let stub = Arc::new(StubVix::new().with_command_output("whoami", "ops\n"));
    let registry = registry(&stub, temp.path());
    registry
        .execute("connect_and_login", connect_args())
        .await
        .unwrap();

    let check = registry
        .execute("check_guest_connection", connect_args())
        .await
        .unwrap();
    assert_eq!(check["message"], "Successfully logged in to guest OS.");
    assert_eq!(stub.live_handles(), 2);

    let result = registry
        .execute("exec_command_in_guest_session", json!({"command": "whoami"}))
        .await
        .unwrap();
    assert_eq!(result["output"], "ops\n");
}

#[tokio::test]
async fn registry_counts_envelope_failures() {
    let temp = TempDir::new().unwrap();
    let stub = Arc::new(StubVix::new());
    let registry = registry(&stub, temp.path());

    registry
        .execute("list_processes_in_guest", json!({}))
        .await
        .unwrap();
    registry
        .execute("connect_and_login", connect_args())
        .await
        .unwrap();

    let metrics = registry.metrics_snapshot();
    assert_eq!(metrics.tools_registered, 5);
    assert_eq!(metrics.executions_requested, 2);
    assert_eq!(metrics.executions_succeeded, 1);
    assert_eq!(metrics.executions_failed, 1);
}

#[tokio::test]
async fn tool_server_session() {
    let temp = TempDir::new().unwrap();
    let stub = Arc::new(StubVix::new().with_command_output("ps aux", "USER PID\n"));
    let server = GuestToolServer::new(Arc::new(registry(&stub, temp.path())));

    server
        .call("connect_and_login", connect_args())
        .await
        .unwrap();
    let listing = server
        .call("list_processes_in_guest", json!({}))
        .await
        .unwrap()
        .0;
    let envelope: Value = serde_json::from_str(&listing).unwrap();
    assert_eq!(envelope, json!({"success": true, "output": "USER PID\n"}));

    server
        .call("disconnect_session", json!({}))
        .await
        .unwrap();
    let Err(failed) = server.call("list_processes_in_guest", json!({})).await else {
        panic!("listing after disconnect succeeded");
    };
    let envelope: Value = serde_json::from_str(&failed).unwrap();
    assert_eq!(envelope["error_kind"], "no_active_session");
    assert_eq!(stub.live_handles(), 0);
}
