// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! OS-facing adapters: process control and socket registration.
//!
//! The only crate in the workspace allowed `unsafe` — it's confined to
//! `pre_exec` setup between fork and exec, and raw libc signal/wait calls.

pub mod process;
mod socket;

pub use process::{
    ProcessAdapter, ProcessAdapterError, SpawnSpec, SpawnedProcess, UnixProcessAdapter, WaitOutcome,
};
pub use socket::{SocketAdapterError, SocketFamily, SocketRegistrar, SocketSpec};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeProcessAdapter, SpawnCall};
