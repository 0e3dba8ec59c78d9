// SPDX-License-Identifier: MIT
//! Lifecycle events published on the Event bus.

use crate::id::{Pid, SocketName, WatcherName, Wid};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A dotted topic string, e.g. `"web.spawn"` or `"circus.health"`.
///
/// Subscribers register a topic *prefix*; delivery is substring-prefix match
/// on the leading frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(pub String);

impl Topic {
    pub fn watcher(name: &WatcherName, event: &str) -> Self {
        Self(format!("{name}.{event}"))
    }

    pub fn global(event: &str) -> Self {
        Self(event.to_string())
    }

    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One lifecycle event kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    Start,
    Starting,
    Started,
    Stop,
    Stopping,
    Stopped,
    Spawn {
        pid: Pid,
        wid: Wid,
    },
    Reap {
        pid: Pid,
        exit_code: Option<i32>,
        signaled_by: Option<i32>,
    },
    Kill {
        pid: Pid,
        signal: i32,
    },
    Updated,
    PluginError {
        plugin: String,
        message: String,
    },
    /// A tick published every `check_delay` on `circus.health`.
    Health {
        watcher_count: usize,
    },
    /// Published when a socket is bound or torn down, for operational visibility.
    SocketBound {
        socket: SocketName,
        fd: i32,
    },
}

/// A fully-addressed event ready to cross the publish-endpoint frame boundary
/// as two frames: `(topic, json-payload)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: Topic,
    pub time: SystemTime,
    pub watcher: Option<WatcherName>,
    pub pid: Option<Pid>,
    pub kind: EventKind,
}

impl Envelope {
    pub fn new(topic: Topic, kind: EventKind) -> Self {
        Self {
            topic,
            time: SystemTime::now(),
            watcher: None,
            pid: None,
            kind,
        }
    }

    pub fn for_watcher(watcher: &WatcherName, event_name: &str, kind: EventKind) -> Self {
        Self {
            topic: Topic::watcher(watcher, event_name),
            time: SystemTime::now(),
            watcher: Some(watcher.clone()),
            pid: None,
            kind,
        }
    }

    pub fn with_pid(mut self, pid: Pid) -> Self {
        self.pid = Some(pid);
        self
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
