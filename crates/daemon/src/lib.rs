// SPDX-License-Identifier: MIT

//! Process supervisor daemon library: config snapshot shape, the wire
//! protocol shared with CLI clients, the in-memory event bus, and the
//! startup/shutdown and control-endpoint plumbing that wires them to an
//! `Arbiter`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod event_bus;
pub mod lifecycle;
pub mod listener;
pub mod protocol;
pub mod publish;

pub use config::{ConfigError, ConfigSnapshot, GlobalOptions};
pub use event_bus::EventBus;
pub use lifecycle::{DaemonState, LifecycleError, Paths, StartupResult};
pub use listener::{ListenCtx, Listener};
pub use publish::PublishListener;
pub use protocol::{
    error_response, ProtocolError, Request, Response, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE,
};
