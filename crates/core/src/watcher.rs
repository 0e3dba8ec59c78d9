//! Watcher declaration: the static attributes of one process group.

use crate::id::WatcherName;
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Supported hook invocation points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookName {
    BeforeStart,
    AfterStart,
    BeforeSpawn,
    AfterSpawn,
    BeforeStop,
    AfterStop,
    BeforeSignal,
    AfterReap,
    ExtendedStats,
}

/// One hook entry: `(target, ignore_failure)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSpec {
    /// Reference to a user-provided callable, resolved by the engine's
    /// injected `HookInvoker` collaborator. Out of scope here: what a
    /// target string actually names (a plugin method, an external binary).
    pub target: String,
    #[serde(default)]
    pub ignore_failure: bool,
}

/// Destination for a redirected stdout/stderr stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamSink {
    /// Append to a file path. Rotation is triggered externally.
    File { path: PathBuf },
    /// Bounded in-memory ring of recent lines.
    Ring { capacity: usize },
    /// User-supplied callback, resolved the same way as hook targets.
    Callback { target: String },
}

/// Resource limit value; `-1` means "infinity".
pub type RLimits = HashMap<String, i64>;

pub const RLIMIT_INFINITY: i64 = -1;

/// Parameters for the per-watcher flap detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlapConfig {
    pub attempts: u32,
    pub window: Duration,
    pub retry_in: Duration,
    pub max_retry: u32,
}

impl Default for FlapConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            window: Duration::from_secs(1),
            retry_in: Duration::from_secs(7),
            max_retry: 5,
        }
    }
}

/// Full declaration of one Watcher. Immutable snapshot; Watchers replace
/// their slice whole on reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherConfig {
    pub name: WatcherName,
    pub cmd: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_numprocesses")]
    pub numprocesses: u32,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub gid: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub shell: bool,
    #[serde(default)]
    pub executable: Option<String>,
    #[serde(default)]
    pub stop_signal: Signal,
    #[serde(default)]
    pub stop_children: bool,
    #[serde(default = "default_graceful_timeout")]
    pub graceful_timeout: Duration,
    #[serde(default)]
    pub warmup_delay: Duration,
    #[serde(default)]
    pub max_retry: u32,
    #[serde(default = "default_true")]
    pub respawn: bool,
    #[serde(default = "default_true")]
    pub autostart: bool,
    #[serde(default)]
    pub singleton: bool,
    #[serde(default)]
    pub copy_env: bool,
    #[serde(default)]
    pub copy_path: bool,
    #[serde(default)]
    pub use_sockets: bool,
    #[serde(default)]
    pub rlimits: RLimits,
    #[serde(default)]
    pub hooks: HashMap<HookName, HookSpec>,
    #[serde(default)]
    pub stdout_stream: Option<StreamSink>,
    #[serde(default)]
    pub stderr_stream: Option<StreamSink>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub flap: FlapConfig,
}

fn default_numprocesses() -> u32 {
    1
}

fn default_graceful_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_true() -> bool {
    true
}

impl WatcherConfig {
    /// Resolve the executable path: explicit `executable`, else the head of `cmd`.
    pub fn resolved_executable(&self) -> &str {
        self.executable
            .as_deref()
            .unwrap_or_else(|| self.cmd.split_whitespace().next().unwrap_or(&self.cmd))
    }

    /// `numprocesses` clamped to at most 1 when `singleton` is set.
    pub fn effective_numprocesses(&self) -> u32 {
        if self.singleton {
            self.numprocesses.min(1)
        } else {
            self.numprocesses
        }
    }
}

/// Runtime status of a Watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatcherStatus {
    Stopped,
    Starting,
    Active,
    Stopping,
    Error,
}

/// Tagged option set accepted by `set_opt`/`get_opt` (design note: "dynamic
/// typing -> tagged options"). One variant per recognized typed field, plus
/// `Extra` for freeform keys the caller explicitly allows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "snake_case")]
pub enum WatcherOption {
    Cmd(String),
    Args(Vec<String>),
    Numprocesses(u32),
    WorkingDir(Option<PathBuf>),
    Uid(Option<String>),
    Gid(Option<String>),
    Env(HashMap<String, String>),
    Shell(bool),
    Executable(Option<String>),
    StopSignal(Signal),
    StopChildren(bool),
    GracefulTimeout(f64),
    WarmupDelay(f64),
    MaxRetry(u32),
    Respawn(bool),
    Autostart(bool),
    Singleton(bool),
    CopyEnv(bool),
    CopyPath(bool),
    UseSockets(bool),
    Rlimits(RLimits),
    Priority(i32),
    /// Freeform key, rejected unless the caller explicitly allows unknown keys.
    Extra { key: String, value: serde_json::Value },
}

impl WatcherOption {
    /// The option set that triggers a graceful sequential reload rather than
    /// a live apply when changed.
    pub fn requires_respawn(&self) -> bool {
        matches!(
            self,
            WatcherOption::Cmd(_)
                | WatcherOption::Args(_)
                | WatcherOption::Executable(_)
                | WatcherOption::Uid(_)
                | WatcherOption::Gid(_)
                | WatcherOption::Env(_)
                | WatcherOption::WorkingDir(_)
                | WatcherOption::Rlimits(_)
                | WatcherOption::StopSignal(_)
                | WatcherOption::Shell(_)
                | WatcherOption::CopyEnv(_)
                | WatcherOption::CopyPath(_)
        )
    }

    /// The wire `key` name, matching `#[serde(rename_all = "snake_case")]`.
    pub fn key(&self) -> &str {
        match self {
            WatcherOption::Cmd(_) => "cmd",
            WatcherOption::Args(_) => "args",
            WatcherOption::Numprocesses(_) => "numprocesses",
            WatcherOption::WorkingDir(_) => "working_dir",
            WatcherOption::Uid(_) => "uid",
            WatcherOption::Gid(_) => "gid",
            WatcherOption::Env(_) => "env",
            WatcherOption::Shell(_) => "shell",
            WatcherOption::Executable(_) => "executable",
            WatcherOption::StopSignal(_) => "stop_signal",
            WatcherOption::StopChildren(_) => "stop_children",
            WatcherOption::GracefulTimeout(_) => "graceful_timeout",
            WatcherOption::WarmupDelay(_) => "warmup_delay",
            WatcherOption::MaxRetry(_) => "max_retry",
            WatcherOption::Respawn(_) => "respawn",
            WatcherOption::Autostart(_) => "autostart",
            WatcherOption::Singleton(_) => "singleton",
            WatcherOption::CopyEnv(_) => "copy_env",
            WatcherOption::CopyPath(_) => "copy_path",
            WatcherOption::UseSockets(_) => "use_sockets",
            WatcherOption::Rlimits(_) => "rlimits",
            WatcherOption::Priority(_) => "priority",
            WatcherOption::Extra { key, .. } => key.as_str(),
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
