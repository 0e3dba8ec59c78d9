//! Per-watcher flap detector.
//!
//! Pure sliding-window bookkeeping — no I/O, no sleeping. The engine drives
//! it with an injected `Instant` (via `warden_core::clock::Clock`) so tests
//! can exercise the window/pause/error transitions without real delays.

use crate::watcher::FlapConfig;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Outcome of feeding one unexpected exit into the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlapOutcome {
    /// Below the flap threshold; the Watcher may respawn immediately.
    Ok,
    /// `attempts`-th flap within `window` — pause respawns until the given instant.
    Paused,
    /// `max_retry` consecutive pause cycles exhausted without a sustained run.
    Errored,
}

#[derive(Debug, Clone)]
pub struct FlapDetector {
    config: FlapConfig,
    recent_exits: VecDeque<Instant>,
    pause_cycles: u32,
    paused_until: Option<Instant>,
}

impl FlapDetector {
    pub fn new(config: FlapConfig) -> Self {
        Self {
            config,
            recent_exits: VecDeque::new(),
            pause_cycles: 0,
            paused_until: None,
        }
    }

    /// Whether respawns are currently suppressed.
    pub fn is_paused(&self, now: Instant) -> bool {
        self.paused_until.is_some_and(|until| now < until)
    }

    /// Whether the flap limit has been exhausted — the Watcher should move
    /// to `error` and stop respawning until commanded.
    pub fn is_exhausted(&self) -> bool {
        self.pause_cycles >= self.config.max_retry
    }

    /// A respawned Process survived past the flap window: clear the pause
    /// cycle count, since it sustained a run.
    pub fn record_sustained_run(&mut self) {
        self.pause_cycles = 0;
        self.recent_exits.clear();
    }

    /// Feed an unexpected exit. `lifetime` is how long the Process ran;
    /// it counts as a flap iff it is shorter than `window`.
    pub fn record_exit(&mut self, lifetime: Duration, now: Instant) -> FlapOutcome {
        if lifetime >= self.config.window {
            // Not a flap — a process that ran past the window doesn't count,
            // even if it later exited unexpectedly.
            return FlapOutcome::Ok;
        }

        self.recent_exits.push_back(now);
        let cutoff = now.checked_sub(self.config.window).unwrap_or(now);
        while self
            .recent_exits
            .front()
            .is_some_and(|t| *t < cutoff)
        {
            self.recent_exits.pop_front();
        }

        if self.recent_exits.len() < self.config.attempts as usize {
            return FlapOutcome::Ok;
        }

        // attempts-th flap within window: pause.
        self.recent_exits.clear();
        self.pause_cycles += 1;
        self.paused_until = Some(now + self.config.retry_in);

        if self.is_exhausted() {
            FlapOutcome::Errored
        } else {
            FlapOutcome::Paused
        }
    }

    /// Explicit `start`/`restart` clears error/pause state (`error ->
    /// starting` on explicit command).
    pub fn reset(&mut self) {
        self.recent_exits.clear();
        self.pause_cycles = 0;
        self.paused_until = None;
    }
}

#[cfg(test)]
#[path = "flap_tests.rs"]
mod tests;
