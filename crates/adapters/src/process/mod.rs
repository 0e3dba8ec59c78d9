//! Process spawning and control, behind a trait so the engine can be driven
//! by a fake in tests instead of forking real children.

mod fake;
mod unix;

pub use fake::FakeProcessAdapter;
pub use unix::UnixProcessAdapter;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use warden_core::{Pid, RLimits, Rusage, Signal};

#[derive(Debug, Error)]
pub enum ProcessAdapterError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("unknown group: {0}")]
    UnknownGroup(String),
    #[error("signal delivery failed: {0}")]
    SignalFailed(String),
    #[error("no such process: {0}")]
    NoSuchProcess(i32),
}

/// Everything needed to exec one replica.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub cmdline: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub uid: Option<String>,
    pub gid: Option<String>,
    pub rlimits: RLimits,
    pub umask: Option<u32>,
    /// Extra inherited file descriptors, in order, starting at fd 3 — used
    /// to hand bound listening sockets to the child.
    pub inherited_fds: Vec<i32>,
    /// Detach into a new session (`setsid`) so the child survives the
    /// supervisor's own controlling terminal and can be signaled as a group.
    pub new_session: bool,
    /// Capture stdout on a pipe instead of inheriting the daemon's, so a
    /// configured stream sink has something to read from.
    pub stdout_piped: bool,
    /// Capture stderr on a pipe instead of inheriting the daemon's.
    pub stderr_piped: bool,
}

/// Result of a successful spawn: the child's pid plus its stdout/stderr pipe
/// ends, present only when the matching `SpawnSpec::std{out,err}_piped` flag
/// was set.
#[derive(Debug)]
pub struct SpawnedProcess {
    pub pid: Pid,
    pub stdout: Option<std::process::ChildStdout>,
    pub stderr: Option<std::process::ChildStderr>,
}

/// How a child stopped, as observed by a non-blocking reap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitOutcome {
    #[default]
    StillRunning,
    Exited(i32),
    Signaled(i32),
}

#[async_trait]
pub trait ProcessAdapter: Send + Sync + 'static {
    /// Fork+exec one child per `spec`, returning its pid and, when
    /// requested, its stdout/stderr pipe ends.
    async fn spawn(&self, spec: &SpawnSpec) -> Result<SpawnedProcess, ProcessAdapterError>;

    /// Deliver `signal` to `pid`. `NoSuchProcess` if it's already gone.
    fn signal(&self, pid: Pid, signal: Signal) -> Result<(), ProcessAdapterError>;

    /// Non-blocking reap: `WaitOutcome::StillRunning` if the child hasn't
    /// exited yet, otherwise its terminal status. Idempotent once reaped.
    fn try_wait(&self, pid: Pid) -> Result<WaitOutcome, ProcessAdapterError>;

    /// Resource usage accumulated by `pid`, sampled from `/proc` while it's
    /// alive and best-effort after it has exited.
    fn rusage(&self, pid: Pid) -> Result<Rusage, ProcessAdapterError>;

    /// Pids of `pid`'s descendants, used for `stop_children`.
    fn descendants(&self, pid: Pid) -> Vec<Pid>;
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::SpawnCall;
