//! Process handle data model.

use crate::id::{Pid, Wid};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// Runtime status of one OS child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Running,
    Exited,
    Errored,
}

/// How a Process stopped running, distinguishing a normal exit from a
/// spawn-time failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExitCause {
    /// Exited with the given status code.
    Exited(i32),
    /// Killed by the given signal number.
    Signaled(i32),
    /// Failed to even start (exec error, permission denied, ...).
    SpawnError(String),
}

impl ExitCause {
    /// An exit is "expected" iff it's a zero exit, or a signal matching the
    /// watcher's configured `stop_signal`.
    pub fn is_unexpected(&self, stop_signal: crate::signal::Signal) -> bool {
        match self {
            ExitCause::Exited(0) => false,
            ExitCause::Exited(_) => true,
            ExitCause::Signaled(sig) => *sig != stop_signal.as_raw(),
            ExitCause::SpawnError(_) => true,
        }
    }
}

/// Resource usage sample for one Process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rusage {
    pub user_time: Duration,
    pub system_time: Duration,
    pub max_rss_kb: u64,
}

/// One OS child belonging to a Watcher.
///
/// `watcher` is a name, not an owning pointer: the Watcher exclusively owns
/// its Processes, a Process only looks its Watcher up by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub pid: Pid,
    pub wid: Wid,
    pub watcher: crate::id::WatcherName,
    pub started_at: SystemTime,
    pub cmdline: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub status: ProcessStatus,
    pub last_rusage: Option<Rusage>,
    pub exit_cause: Option<ExitCause>,
}

impl Process {
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.started_at).unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.status == ProcessStatus::Running
    }
}

/// Expand `$(NAME)` and `$(circus.WID)` occurrences in `input`. `NAME` is
/// resolved from `env`; missing variables substitute the empty string.
/// `circus.WID` resolves to the replica index. Socket placeholders
/// (`circus.sockets.NAME`) are left for the caller to expand once fd numbers
/// are known, via `extra`.
pub fn expand_vars(
    input: &str,
    env: &HashMap<String, String>,
    wid: Wid,
    extra: &HashMap<String, String>,
) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("$(") {
        out.push_str(&rest[..start]);
        let after_marker = &rest[start + 2..];
        match after_marker.find(')') {
            Some(end) => {
                let name = &after_marker[..end];
                let replacement = if name == "circus.WID" {
                    wid.to_string()
                } else if let Some(value) = extra.get(name) {
                    value.clone()
                } else {
                    env.get(name).cloned().unwrap_or_default()
                };
                out.push_str(&replacement);
                rest = &after_marker[end + 1..];
            }
            None => {
                // Unterminated `$(` — emit literally and stop scanning.
                out.push_str(&rest[start..]);
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
