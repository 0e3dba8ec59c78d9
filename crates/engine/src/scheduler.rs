//! Deadline tracking for warm-up, graceful-stop and flap-retry delays.
//!
//! The Arbiter's event loop is cooperative: instead of spawning a `sleep`
//! task per Watcher, it asks the Scheduler for the next deadline, waits (or
//! is woken early by an exit/command), and asks again which deadlines fired.

use std::collections::HashMap;
use std::time::Instant;
use warden_core::{Wid, WatcherName};

/// What a fired deadline means to the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeadlineKind {
    /// `warmup_delay` since the last Watcher in priority order was started.
    Warmup,
    /// `graceful_timeout` since a stop signal was sent to this replica
    /// without it exiting; past this the reconciler sends SIGKILL.
    GracefulTimeout(Wid),
    /// `retry_in` since the flap detector paused respawns for this Watcher.
    FlapRetry,
}

#[derive(Debug, Clone)]
struct Deadline {
    fires_at: Instant,
    kind: DeadlineKind,
}

/// Per-Watcher deadline set.
#[derive(Debug, Default)]
pub struct Scheduler {
    deadlines: HashMap<WatcherName, Vec<Deadline>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, watcher: &WatcherName, kind: DeadlineKind, now: Instant, delay: std::time::Duration) {
        self.deadlines
            .entry(watcher.clone())
            .or_default()
            .push(Deadline { fires_at: now + delay, kind });
    }

    /// Cancel a specific deadline kind for a watcher (e.g. a graceful
    /// timeout for a replica that exited before it elapsed).
    pub fn cancel(&mut self, watcher: &WatcherName, kind: DeadlineKind) {
        if let Some(list) = self.deadlines.get_mut(watcher) {
            list.retain(|d| d.kind != kind);
        }
    }

    pub fn cancel_all(&mut self, watcher: &WatcherName) {
        self.deadlines.remove(watcher);
    }

    /// Deadlines that have fired, removed from the schedule.
    pub fn fired(&mut self, now: Instant) -> Vec<(WatcherName, DeadlineKind)> {
        let mut fired = Vec::new();
        for (watcher, list) in self.deadlines.iter_mut() {
            let (due, pending): (Vec<_>, Vec<_>) =
                list.drain(..).partition(|d| d.fires_at <= now);
            fired.extend(due.into_iter().map(|d| (watcher.clone(), d.kind)));
            *list = pending;
        }
        self.deadlines.retain(|_, list| !list.is_empty());
        fired
    }

    /// The earliest deadline across all watchers, used to size the event
    /// loop's next wait.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines
            .values()
            .flatten()
            .map(|d| d.fires_at)
            .min()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
