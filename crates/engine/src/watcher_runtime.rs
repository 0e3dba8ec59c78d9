//! Runtime state for one Watcher: its live Processes, flap detector and
//! incarnation counter, layered on top of the immutable `WatcherConfig`.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::time::{Instant, SystemTime};
use warden_core::{
    ExitCause, FlapDetector, Pid, Process, ProcessStatus, Wid, WatcherConfig, WatcherStatus,
};

/// A replica mid-graceful-stop: signaled but not yet confirmed exited.
#[derive(Debug, Clone, Copy)]
pub struct StoppingReplica {
    pub pid: Pid,
    pub deadline: Instant,
}

pub struct WatcherRuntime {
    pub config: WatcherConfig,
    pub status: WatcherStatus,
    pub processes: IndexMap<Pid, Process>,
    next_wid: u64,
    pub flap: FlapDetector,
    pub stopping: HashMap<Pid, StoppingReplica>,
}

impl WatcherRuntime {
    pub fn new(config: WatcherConfig) -> Self {
        let flap = FlapDetector::new(config.flap);
        Self {
            config,
            status: WatcherStatus::Stopped,
            processes: IndexMap::new(),
            next_wid: 0,
            flap,
            stopping: HashMap::new(),
        }
    }

    pub fn next_wid(&mut self) -> Wid {
        let wid = Wid(self.next_wid);
        self.next_wid += 1;
        wid
    }

    /// How many more replicas need to be spawned to reach `numprocesses`.
    pub fn deficit(&self) -> u32 {
        let alive = self.processes.values().filter(|p| p.is_running()).count() as u32;
        self.config.effective_numprocesses().saturating_sub(alive)
    }

    pub fn register_spawn(&mut self, pid: Pid, wid: Wid, cmdline: Vec<String>, env: HashMap<String, String>) {
        self.processes.insert(
            pid,
            Process {
                pid,
                wid,
                watcher: self.config.name.clone(),
                started_at: SystemTime::now(),
                cmdline,
                env,
                working_dir: self.config.working_dir.clone(),
                status: ProcessStatus::Running,
                last_rusage: None,
                exit_cause: None,
            },
        );
    }

    /// Record that `pid` exited. Returns whether the exit was expected
    /// (explicit stop) and whether the Watcher should respawn.
    pub fn handle_exit(&mut self, pid: Pid, cause: ExitCause, now: Instant) -> ExitDisposition {
        self.stopping.remove(&pid);
        let Some(mut process) = self.processes.shift_remove(&pid) else {
            return ExitDisposition::Unknown;
        };
        let unexpected = cause.is_unexpected(self.config.stop_signal);
        let lifetime = process
            .started_at
            .elapsed()
            .unwrap_or(std::time::Duration::ZERO);
        process.status = ProcessStatus::Exited;
        process.exit_cause = Some(cause);

        if !unexpected || !self.config.respawn {
            if lifetime >= self.config.flap.window {
                self.flap.record_sustained_run();
            }
            return ExitDisposition::Expected;
        }

        match self.flap.record_exit(lifetime, now) {
            warden_core::FlapOutcome::Ok => ExitDisposition::ShouldRespawn,
            warden_core::FlapOutcome::Paused => ExitDisposition::Paused,
            warden_core::FlapOutcome::Errored => {
                self.status = WatcherStatus::Error;
                ExitDisposition::Flapping
            }
        }
    }

    pub fn mark_stopping(&mut self, pid: Pid, deadline: Instant) {
        self.stopping.insert(pid, StoppingReplica { pid, deadline });
    }

    pub fn is_idle(&self) -> bool {
        self.processes.is_empty() && self.stopping.is_empty()
    }
}

/// What the reconciler should do in response to one Process exiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    /// Not a tracked pid — ignore.
    Unknown,
    /// Stop-signal-triggered or respawn disabled; no further action.
    Expected,
    /// Flap detector allows an immediate respawn.
    ShouldRespawn,
    /// Flap window tripped; respawns paused until `retry_in` elapses.
    Paused,
    /// `max_retry` pause cycles exhausted; Watcher moved to `error`.
    Flapping,
}

#[cfg(test)]
#[path = "watcher_runtime_tests.rs"]
mod tests;
