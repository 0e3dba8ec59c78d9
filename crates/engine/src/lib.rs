// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![forbid(unsafe_code)]

//! warden-engine: the reconciliation loop. Owns Watchers, drives spawn/
//! signal/reap through `warden_adapters::ProcessAdapter`, and publishes
//! lifecycle events through an injected `EventSink`.

mod arbiter;
mod event_sink;
mod hooks;
mod scheduler;
mod streams;
mod watcher_runtime;

pub use arbiter::{Arbiter, GlobalConfig, RunState};
pub use event_sink::{EventSink, NullEventSink, RecordingEventSink};
pub use hooks::{run_hook, HookInvoker, HookOutcome, NoOpHookInvoker};
pub use scheduler::{DeadlineKind, Scheduler};
pub use streams::{build_redirector, CallbackRedirector, FileRedirector, Redirector, RingRedirector};
pub use watcher_runtime::{ExitDisposition, WatcherRuntime};
