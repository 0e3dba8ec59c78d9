//! Error kinds surfaced in Controller replies and published events.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stable, serializable error kind. This is what crosses the control-plane
/// wire in a `{"status":"error","reason":...}` reply, so its `Display`/serde
/// representation is the snake_case `reason` string clients match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("unknown_command")]
    UnknownCommand,
    #[error("invalid_json")]
    InvalidJson,
    #[error("bad_argument")]
    BadArgument,
    #[error("unknown_watcher")]
    UnknownWatcher,
    #[error("not_running")]
    NotRunning,
    #[error("already_running")]
    AlreadyRunning,
    #[error("spawn_failed")]
    SpawnFailed,
    #[error("signal_failed")]
    SignalFailed,
    #[error("flapping")]
    Flapping,
    #[error("hook_failed")]
    HookFailed,
    #[error("timeout")]
    Timeout,
    #[error("internal")]
    Internal,
}

impl ErrorKind {
    /// The `reason` string sent over the wire, matching `#[serde(rename_all = "snake_case")]`.
    pub fn reason(&self) -> &'static str {
        match self {
            ErrorKind::UnknownCommand => "unknown_command",
            ErrorKind::InvalidJson => "invalid_json",
            ErrorKind::BadArgument => "bad_argument",
            ErrorKind::UnknownWatcher => "unknown_watcher",
            ErrorKind::NotRunning => "not_running",
            ErrorKind::AlreadyRunning => "already_running",
            ErrorKind::SpawnFailed => "spawn_failed",
            ErrorKind::SignalFailed => "signal_failed",
            ErrorKind::Flapping => "flapping",
            ErrorKind::HookFailed => "hook_failed",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Internal => "internal",
        }
    }
}

/// A domain error paired with a human-readable message, returned along
/// reconciliation and dispatch paths instead of panicking (design note:
/// "exceptions as control flow -> result values").
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct WardenError {
    pub kind: ErrorKind,
    pub message: String,
}

impl WardenError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_watcher(name: &str) -> Self {
        Self::new(ErrorKind::UnknownWatcher, format!("no such watcher: {name}"))
    }

    pub fn bad_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadArgument, message)
    }
}
