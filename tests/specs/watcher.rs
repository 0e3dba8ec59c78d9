//! Declaring, scaling, and stopping a watcher end-to-end through the CLI.

use crate::prelude::*;

#[test]
fn declared_watcher_converges_to_its_replica_count() {
    let daemon = Supervisor::start(Some(&snapshot_with_watcher("web", "/bin/sleep", &["60"], 2)));

    daemon.cli().args(&["list"]).passes().stdout_has("web");

    let pids_present = wait_for(1000, || {
        let out = daemon.cli().args(&["pids", "web"]).passes().stdout();
        out.lines().filter(|l| !l.trim().is_empty()).count() == 2
    });
    assert!(pids_present, "expected 2 running pids for 'web'\nlog:\n{}", daemon.daemon_log());
}

#[test]
fn add_then_start_brings_replicas_up() {
    let daemon = Supervisor::start(None);

    daemon.cli().args(&["add", "idle", "/bin/sleep", "60", "--numprocesses", "1", "--start"]).passes();

    let running = wait_for(1000, || {
        let out = daemon.cli().args(&["pids", "idle"]).passes().stdout();
        out.lines().filter(|l| !l.trim().is_empty()).count() == 1
    });
    assert!(running, "expected 1 running pid for 'idle'\nlog:\n{}", daemon.daemon_log());
}

#[test]
fn incr_raises_the_replica_count() {
    let daemon = Supervisor::start(Some(&snapshot_with_watcher("web", "/bin/sleep", &["60"], 1)));

    wait_for(1000, || {
        daemon.cli().args(&["pids", "web"]).passes().stdout().lines().filter(|l| !l.trim().is_empty()).count() == 1
    });

    daemon.cli().args(&["incr", "web"]).passes().stdout_has("numprocesses: 2");

    let scaled = wait_for(1000, || {
        daemon.cli().args(&["pids", "web"]).passes().stdout().lines().filter(|l| !l.trim().is_empty()).count() == 2
    });
    assert!(scaled, "expected 2 running pids after incr\nlog:\n{}", daemon.daemon_log());
}

#[test]
fn stop_drops_the_replica_count_to_zero() {
    let daemon = Supervisor::start(Some(&snapshot_with_watcher("web", "/bin/sleep", &["60"], 2)));

    wait_for(1000, || {
        daemon.cli().args(&["pids", "web"]).passes().stdout().lines().filter(|l| !l.trim().is_empty()).count() == 2
    });

    daemon.cli().args(&["stop", "web"]).passes();

    let stopped = wait_for(2000, || {
        daemon.cli().args(&["pids", "web"]).passes().stdout().trim().is_empty()
    });
    assert!(stopped, "expected no running pids after stop\nlog:\n{}", daemon.daemon_log());
}

#[test]
fn operations_on_an_unknown_watcher_are_rejected() {
    let daemon = Supervisor::start(None);
    daemon.cli().args(&["watcher-status", "ghost"]).fails().stderr_has("error:");
}

#[test]
fn stdout_stream_sink_captures_replica_output_to_a_file() {
    let state = tempfile::tempdir().unwrap();
    let out_path = state.path().join("web.out");
    let snapshot = format!(
        r#"{{"global":{{}},"watchers":[{{"name":"web","cmd":"/bin/echo","args":["hi"],"numprocesses":1,
        "stdout_stream":{{"kind":"file","path":{path:?}}}}}],"sockets":[],"plugins":[]}}"#,
        path = out_path,
    );
    let daemon = Supervisor::start(Some(&snapshot));
    daemon.cli().args(&["list"]).passes().stdout_has("web");

    let captured = wait_for(1000, || {
        std::fs::read_to_string(&out_path).map(|s| s.contains("hi")).unwrap_or(false)
    });
    assert!(captured, "expected stdout_stream file to contain the replica's output\nlog:\n{}", daemon.daemon_log());
}
