use super::*;
use crate::config::ConfigSnapshot;

#[tokio::test]
async fn startup_binds_sockets_and_writes_pidfile() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::under(dir.path());
    let result = startup(paths.clone(), ConfigSnapshot::default()).await.unwrap();

    assert!(paths.pidfile.exists());
    let pid: u32 = std::fs::read_to_string(&paths.pidfile).unwrap().trim().parse().unwrap();
    assert_eq!(pid, std::process::id());
    assert!(paths.control_socket.exists());
    assert!(paths.publish_socket.exists());

    result.daemon.shutdown();
    assert!(!paths.control_socket.exists());
    assert!(!paths.pidfile.exists());
}

#[tokio::test]
async fn second_startup_against_the_same_pidfile_fails_to_lock() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::under(dir.path());
    let first = startup(paths.clone(), ConfigSnapshot::default()).await.unwrap();

    let err = startup(paths.clone(), ConfigSnapshot::default()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::LockFailed(_)));

    first.daemon.shutdown();
}

#[tokio::test]
async fn declared_watchers_are_visible_after_startup() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::under(dir.path());
    let mut snapshot = ConfigSnapshot::default();
    snapshot.watchers.push(warden_core::WatcherConfig {
        name: warden_core::WatcherName::new("web"),
        cmd: "/bin/true".to_string(),
        args: Vec::new(),
        numprocesses: 0,
        working_dir: None,
        uid: None,
        gid: None,
        env: std::collections::HashMap::new(),
        shell: false,
        executable: None,
        stop_signal: warden_core::Signal::SIGTERM,
        stop_children: false,
        graceful_timeout: std::time::Duration::from_secs(5),
        warmup_delay: std::time::Duration::ZERO,
        max_retry: 0,
        respawn: true,
        autostart: false,
        singleton: false,
        copy_env: false,
        copy_path: false,
        use_sockets: false,
        rlimits: std::collections::HashMap::new(),
        hooks: std::collections::HashMap::new(),
        stdout_stream: None,
        stderr_stream: None,
        priority: 0,
        flap: warden_core::FlapConfig::default(),
    });

    let result = startup(paths, snapshot).await.unwrap();
    let names = result.daemon.arbiter.lock().await.watcher_names();
    assert_eq!(names, vec![warden_core::WatcherName::new("web")]);
    result.daemon.shutdown();
}
