//! Test helpers for black-box `wardend`/`warden` behavioral specs.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL_MS: u64 = 10;
const STARTUP_TIMEOUT_MS: u64 = 2000;

/// Resolve a built binary, checking llvm-cov's target directory first, then
/// falling back to the path relative to this test binary itself (the test
/// binary lives at target/debug/deps/specs-<hash>, so its grandparent is
/// target/debug/ where `warden`/`wardend` are built).
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn warden_binary() -> PathBuf {
    binary_path("warden")
}

fn wardend_binary() -> PathBuf {
    binary_path("wardend")
}

/// Poll a condition until it returns true or the timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll_interval = Duration::from_millis(POLL_INTERVAL_MS);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

/// Run `wardend` against a state directory seeded with `config_json` as its
/// snapshot and wait for it to exit on its own, returning its exit code.
/// For config that fails to parse, `wardend` should exit immediately rather
/// than ever bind its control socket, so this bypasses `Supervisor::start`.
pub fn wardend_exit_code_for_config(config_json: &str) -> Option<i32> {
    let state_dir = tempfile::tempdir().unwrap();
    let config_path = state_dir.path().join("snapshot.json");
    std::fs::write(&config_path, config_json).unwrap();

    let mut cmd = Command::new(wardend_binary());
    cmd.env("WARDEN_STATE_DIR", state_dir.path());
    cmd.env("WARDEN_CONFIG", &config_path);
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = cmd.spawn().expect("wardend should spawn");
    let exited = wait_for(STARTUP_TIMEOUT_MS, || matches!(child.try_wait(), Ok(Some(_))));
    assert!(exited, "wardend did not exit on an invalid config within {STARTUP_TIMEOUT_MS}ms");
    child.wait().unwrap().code()
}

/// A running `wardend` instance under an isolated state directory. Kills the
/// daemon and removes the state directory on drop.
pub struct Supervisor {
    state_dir: tempfile::TempDir,
    child: Child,
}

impl Supervisor {
    /// Start `wardend` against a fresh state directory, optionally seeded
    /// with a JSON config snapshot. Blocks until the control socket exists
    /// or the startup timeout elapses.
    pub fn start(snapshot_json: Option<&str>) -> Self {
        let state_dir = tempfile::tempdir().unwrap();

        let mut cmd = Command::new(wardend_binary());
        cmd.env("WARDEN_STATE_DIR", state_dir.path());
        cmd.env_remove("WARDEN_CONFIG");
        if let Some(json) = snapshot_json {
            let config_path = state_dir.path().join("snapshot.json");
            std::fs::write(&config_path, json).unwrap();
            cmd.env("WARDEN_CONFIG", &config_path);
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let child = cmd.spawn().expect("wardend should spawn");
        let control_socket = state_dir.path().join("control.sock");
        let ready = wait_for(STARTUP_TIMEOUT_MS, || control_socket.exists());
        assert!(ready, "wardend did not create its control socket within {STARTUP_TIMEOUT_MS}ms");

        Self { state_dir, child }
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    /// Build a `warden` CLI invocation scoped to this daemon's state directory.
    pub fn cli(&self) -> CliBuilder {
        CliBuilder::new().env("WARDEN_STATE_DIR", self.state_path())
    }

    pub fn daemon_log(&self) -> String {
        let log_path = self.state_path().join("wardend.log");
        std::fs::read_to_string(log_path).unwrap_or_else(|_| "(no daemon log)".to_string())
    }

    /// Non-blocking check of whether the daemon process has exited.
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        let _ = self.cli().args(&["quit", "--kill"]).command().status();
        let exited = wait_for(500, || matches!(self.child.try_wait(), Ok(Some(_))));
        if !exited {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Fluent builder for `warden` CLI invocations.
pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self { args: Vec::new(), envs: Vec::new() }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((key.to_string(), value.as_ref().to_string_lossy().to_string()));
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = Command::new(warden_binary());
        cmd.args(&self.args);
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }
}

/// A minimal one-watcher config snapshot JSON, for tests that just need a
/// supervised sleep loop to exist.
pub fn snapshot_with_watcher(name: &str, cmd: &str, args: &[&str], numprocesses: u32) -> String {
    let args_json: Vec<String> = args.iter().map(|a| format!("{a:?}")).collect();
    format!(
        r#"{{"global":{{}},"watchers":[{{"name":"{name}","cmd":"{cmd}","args":[{args}],"numprocesses":{numprocesses}}}],"sockets":[],"plugins":[]}}"#,
        args = args_json.join(","),
    )
}
