use super::*;
use std::time::Duration;
use warden_core::{FlapConfig, Signal};

fn config() -> WatcherConfig {
    WatcherConfig {
        name: warden_core::WatcherName::new("web"),
        cmd: "/bin/sleep 60".to_string(),
        args: Vec::new(),
        numprocesses: 2,
        working_dir: None,
        uid: None,
        gid: None,
        env: HashMap::new(),
        shell: false,
        executable: None,
        stop_signal: Signal::SIGTERM,
        stop_children: false,
        graceful_timeout: Duration::from_secs(5),
        warmup_delay: Duration::ZERO,
        max_retry: 0,
        respawn: true,
        autostart: true,
        singleton: false,
        copy_env: false,
        copy_path: false,
        use_sockets: false,
        rlimits: HashMap::new(),
        hooks: HashMap::new(),
        stdout_stream: None,
        stderr_stream: None,
        priority: 0,
        flap: FlapConfig { attempts: 2, window: Duration::from_secs(1), retry_in: Duration::from_secs(5), max_retry: 2 },
    }
}

#[test]
fn deficit_counts_missing_replicas() {
    let mut rt = WatcherRuntime::new(config());
    assert_eq!(rt.deficit(), 2);
    let wid = rt.next_wid();
    rt.register_spawn(Pid(100), wid, vec!["/bin/sleep".into()], HashMap::new());
    assert_eq!(rt.deficit(), 1);
}

#[test]
fn expected_exit_with_respawn_disabled_does_not_flap() {
    let mut config = config();
    config.respawn = false;
    let mut rt = WatcherRuntime::new(config);
    let wid = rt.next_wid();
    rt.register_spawn(Pid(100), wid, vec![], HashMap::new());
    let disposition = rt.handle_exit(Pid(100), ExitCause::Exited(0), Instant::now());
    assert_eq!(disposition, ExitDisposition::Expected);
}

#[test]
fn unexpected_exit_within_window_eventually_flaps() {
    let mut rt = WatcherRuntime::new(config());
    let now = Instant::now();
    let wid = rt.next_wid();
    rt.register_spawn(Pid(100), wid, vec![], HashMap::new());
    let d1 = rt.handle_exit(Pid(100), ExitCause::Exited(1), now);
    assert_eq!(d1, ExitDisposition::ShouldRespawn);

    let wid2 = rt.next_wid();
    rt.register_spawn(Pid(101), wid2, vec![], HashMap::new());
    let d2 = rt.handle_exit(Pid(101), ExitCause::Exited(1), now);
    assert_eq!(d2, ExitDisposition::Paused);
}

#[test]
fn unknown_pid_exit_is_ignored() {
    let mut rt = WatcherRuntime::new(config());
    let disposition = rt.handle_exit(Pid(999), ExitCause::Exited(0), Instant::now());
    assert_eq!(disposition, ExitDisposition::Unknown);
}

#[test]
fn is_idle_true_only_when_no_processes_or_stopping_replicas() {
    let mut rt = WatcherRuntime::new(config());
    assert!(rt.is_idle());
    let wid = rt.next_wid();
    rt.register_spawn(Pid(100), wid, vec![], HashMap::new());
    assert!(!rt.is_idle());
}
