// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![forbid(unsafe_code)]

//! warden-core: data model for the process supervision engine.
//!
//! This crate is intentionally inert: Watcher/Process are plain data plus
//! pure helpers (flap detection, option validation). Reconciliation, spawning
//! and I/O live in `warden-engine` and `warden-adapters`; this crate defines
//! the vocabulary they share.

pub mod clock;
pub mod error;
pub mod event;
pub mod id;
pub mod flap;
pub mod process;
pub mod signal;
pub mod watcher;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{ErrorKind, WardenError};
pub use event::{Envelope, EventKind, Topic};
pub use flap::{FlapDetector, FlapOutcome};
pub use id::{Pid, SocketName, Wid, WatcherName};
pub use process::{expand_vars, ExitCause, Process, ProcessStatus, Rusage};
pub use signal::Signal;
pub use watcher::{
    FlapConfig, HookName, HookSpec, RLimits, StreamSink, WatcherConfig, WatcherOption,
    WatcherStatus, RLIMIT_INFINITY,
};
