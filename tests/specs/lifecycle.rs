//! Daemon startup, status reporting, and graceful shutdown via the CLI.

use crate::prelude::*;

#[test]
fn ping_succeeds_once_the_daemon_is_ready() {
    let daemon = Supervisor::start(None);
    daemon.cli().args(&["ping"]).passes().stdout_has("pong");
}

#[test]
fn status_reports_zero_watchers_on_an_empty_snapshot() {
    let daemon = Supervisor::start(None);
    daemon
        .cli()
        .args(&["status"])
        .passes()
        .stdout_has("watcher_count:  0")
        .stdout_has("run_state:");
}

#[test]
fn list_is_empty_on_an_empty_snapshot() {
    let daemon = Supervisor::start(None);
    let output = daemon.cli().args(&["list"]).passes().stdout();
    assert!(output.trim().is_empty(), "expected no watcher names, got: {output}");
}

#[test]
fn quit_causes_the_daemon_process_to_exit() {
    let mut daemon = Supervisor::start(None);
    daemon.cli().args(&["quit"]).passes();
    let exited = wait_for(1000, || daemon.has_exited());
    assert!(exited, "wardend did not exit after quit\nlog:\n{}", daemon.daemon_log());
}

#[test]
fn an_invalid_config_snapshot_exits_with_code_2() {
    let code = wardend_exit_code_for_config("not valid json");
    assert_eq!(code, Some(2));
}
