use super::*;
use warden_core::Signal;

fn spec(cmdline: &[&str]) -> SpawnSpec {
    SpawnSpec {
        cmdline: cmdline.iter().map(|s| s.to_string()).collect(),
        working_dir: None,
        env: Default::default(),
        uid: None,
        gid: None,
        rlimits: Default::default(),
        umask: None,
        inherited_fds: Vec::new(),
        new_session: true,
        stdout_piped: false,
        stderr_piped: false,
    }
}

#[tokio::test]
async fn spawn_allocates_increasing_pids() {
    let adapter = FakeProcessAdapter::new();
    let a = adapter.spawn(&spec(&["/bin/sleep", "1"])).await.unwrap().pid;
    let b = adapter.spawn(&spec(&["/bin/sleep", "1"])).await.unwrap().pid;
    assert!(b.0 > a.0);
}

#[tokio::test]
async fn try_wait_reports_still_running_until_completed() {
    let adapter = FakeProcessAdapter::new();
    let pid = adapter.spawn(&spec(&["/bin/sleep", "1"])).await.unwrap().pid;
    assert_eq!(adapter.try_wait(pid).unwrap(), WaitOutcome::StillRunning);
    adapter.complete_exit(pid, WaitOutcome::Exited(0));
    assert_eq!(adapter.try_wait(pid).unwrap(), WaitOutcome::Exited(0));
}

#[tokio::test]
async fn signal_on_unknown_pid_errors() {
    let adapter = FakeProcessAdapter::new();
    let err = adapter.signal(Pid(99999), Signal::SIGTERM).unwrap_err();
    assert!(matches!(err, ProcessAdapterError::NoSuchProcess(_)));
}

#[tokio::test]
async fn calls_are_recorded_in_order() {
    let adapter = FakeProcessAdapter::new();
    let pid = adapter.spawn(&spec(&["/bin/true"])).await.unwrap().pid;
    adapter.signal(pid, Signal::SIGTERM).unwrap();
    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], SpawnCall::Spawn { .. }));
    assert!(matches!(calls[1], SpawnCall::Signal { .. }));
}

#[tokio::test]
async fn descendants_default_to_empty_until_set() {
    let adapter = FakeProcessAdapter::new();
    let pid = adapter.spawn(&spec(&["/bin/true"])).await.unwrap().pid;
    assert!(adapter.descendants(pid).is_empty());
    adapter.set_descendants(pid, vec![Pid(pid.0 + 1)]);
    assert_eq!(adapter.descendants(pid), vec![Pid(pid.0 + 1)]);
}
