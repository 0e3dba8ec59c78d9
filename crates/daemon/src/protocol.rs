//! IPC protocol between the CLI and the daemon's control endpoint.
//!
//! Wire format: 4-byte big-endian length prefix + JSON payload, matching the
//! socket framing `warden_adapters::socket` binds but does not itself parse.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use warden_core::{Signal, WatcherConfig, WatcherName, WatcherOption, WatcherStatus};

/// Request from a CLI client to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check.
    Ping,
    /// Version handshake.
    Hello { version: String },
    /// Daemon-wide status.
    Status,
    /// Watcher names in priority order.
    WatcherList,
    /// Status of one watcher.
    WatcherStatus { name: WatcherName },
    /// Pids and ages of one watcher's replicas.
    WatcherPids { name: WatcherName },
    /// Start a declared-but-stopped watcher.
    WatcherStart { name: WatcherName },
    /// Stop a watcher's replicas, leaving the declaration in place.
    WatcherStop { name: WatcherName },
    /// Stop then start a watcher.
    WatcherRestart { name: WatcherName },
    /// Declare a new watcher.
    WatcherAdd { config: WatcherConfig, start: bool },
    /// Remove a stopped watcher's declaration.
    WatcherRemove { name: WatcherName },
    /// Raise `numprocesses` by `by` and reconcile up.
    WatcherIncr { name: WatcherName, by: u32 },
    /// Lower `numprocesses` by `by` and reconcile down.
    WatcherDecr { name: WatcherName, by: u32 },
    /// Apply one tagged option, possibly triggering a respawn.
    WatcherSetOption { name: WatcherName, option: WatcherOption },
    /// Send an arbitrary signal to every replica of a watcher.
    WatcherSignal { name: WatcherName, signal: Signal },
    /// Apply a full config snapshot, diffing against the running set.
    Reload { snapshot: crate::config::ConfigSnapshot },
    /// Request daemon shutdown.
    Quit {
        #[serde(default)]
        kill: bool,
    },
}

/// Response from the daemon to a CLI client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    Pong,
    Hello { version: String },
    ShuttingDown,
    Status {
        uptime_secs: u64,
        watcher_count: usize,
        run_state: String,
    },
    Watchers { names: Vec<WatcherName> },
    WatcherStatus { status: WatcherStatus },
    WatcherPids { pids: Vec<i32> },
    Numprocesses { numprocesses: u32 },
    OptionApplied { respawned: bool },
    Error { kind: String, message: String },
}

/// Protocol errors: framing and transport, not domain errors (those ride
/// inside `Response::Error`).
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
    #[error("connection closed")]
    ConnectionClosed,
    #[error("timeout")]
    Timeout,
}

/// Maximum message size (16 MB; config snapshots can be large, replies never are).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Default per-command IPC timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: json.len(), max: MAX_MESSAGE_SIZE });
    }
    Ok(json)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub async fn read_message<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(ProtocolError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: len, max: MAX_MESSAGE_SIZE });
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn write_message<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    let len = data.len();
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: len, max: MAX_MESSAGE_SIZE });
    }
    writer.write_all(&(len as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_request<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

pub async fn write_response<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

/// Map an engine error onto a wire response, matching the `{"status":"error",
/// "reason":...}` shape rather than failing the connection.
pub fn error_response(err: &warden_core::WardenError) -> Response {
    Response::Error { kind: err.kind.reason().to_string(), message: err.message.clone() }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
