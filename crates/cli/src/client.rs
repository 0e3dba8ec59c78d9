// SPDX-License-Identifier: MIT

//! Daemon client: connects to the control socket and issues one request per call.

use std::path::PathBuf;

use thiserror::Error;
use tokio::net::UnixStream;

use warden_core::{Signal, WatcherConfig, WatcherName, WatcherOption, WatcherStatus};
use warden_daemon::protocol::{self, ProtocolError};
use warden_daemon::{Request, Response};

use crate::env;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running (no socket at {0})")]
    DaemonNotRunning(PathBuf),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("unexpected response from daemon")]
    UnexpectedResponse,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not determine state directory (set WARDEN_STATE_DIR or HOME)")]
    NoStateDir,
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to the control socket under the resolved state directory.
    pub fn connect() -> Result<Self, ClientError> {
        let state_dir = env::state_dir()?;
        let socket_path = state_dir.join("control.sock");
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning(socket_path));
        }
        Ok(Self { socket_path })
    }

    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(env::timeout_ipc(), protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes = tokio::time::timeout(env::timeout_ipc(), protocol::read_message(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        Ok(protocol::decode(&response_bytes)?)
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Self::reject(other),
        }
    }

    pub async fn hello(&self, version: String) -> Result<String, ClientError> {
        match self.send(&Request::Hello { version }).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    pub async fn status(&self) -> Result<(u64, usize, String), ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status { uptime_secs, watcher_count, run_state } => {
                Ok((uptime_secs, watcher_count, run_state))
            }
            other => Self::reject(other),
        }
    }

    pub async fn watcher_list(&self) -> Result<Vec<WatcherName>, ClientError> {
        match self.send(&Request::WatcherList).await? {
            Response::Watchers { names } => Ok(names),
            other => Self::reject(other),
        }
    }

    pub async fn watcher_status(&self, name: WatcherName) -> Result<WatcherStatus, ClientError> {
        match self.send(&Request::WatcherStatus { name }).await? {
            Response::WatcherStatus { status } => Ok(status),
            other => Self::reject(other),
        }
    }

    pub async fn watcher_pids(&self, name: WatcherName) -> Result<Vec<i32>, ClientError> {
        match self.send(&Request::WatcherPids { name }).await? {
            Response::WatcherPids { pids } => Ok(pids),
            other => Self::reject(other),
        }
    }

    pub async fn watcher_start(&self, name: WatcherName) -> Result<(), ClientError> {
        self.expect_ok(&Request::WatcherStart { name }).await
    }

    pub async fn watcher_stop(&self, name: WatcherName) -> Result<(), ClientError> {
        self.expect_ok(&Request::WatcherStop { name }).await
    }

    pub async fn watcher_restart(&self, name: WatcherName) -> Result<(), ClientError> {
        self.expect_ok(&Request::WatcherRestart { name }).await
    }

    pub async fn watcher_add(&self, config: WatcherConfig, start: bool) -> Result<(), ClientError> {
        self.expect_ok(&Request::WatcherAdd { config, start }).await
    }

    pub async fn watcher_remove(&self, name: WatcherName) -> Result<(), ClientError> {
        self.expect_ok(&Request::WatcherRemove { name }).await
    }

    pub async fn watcher_incr(&self, name: WatcherName, by: u32) -> Result<u32, ClientError> {
        match self.send(&Request::WatcherIncr { name, by }).await? {
            Response::Numprocesses { numprocesses } => Ok(numprocesses),
            other => Self::reject(other),
        }
    }

    pub async fn watcher_decr(&self, name: WatcherName, by: u32) -> Result<u32, ClientError> {
        match self.send(&Request::WatcherDecr { name, by }).await? {
            Response::Numprocesses { numprocesses } => Ok(numprocesses),
            other => Self::reject(other),
        }
    }

    pub async fn watcher_set_option(
        &self,
        name: WatcherName,
        option: WatcherOption,
    ) -> Result<bool, ClientError> {
        match self.send(&Request::WatcherSetOption { name, option }).await? {
            Response::OptionApplied { respawned } => Ok(respawned),
            other => Self::reject(other),
        }
    }

    pub async fn watcher_signal(&self, name: WatcherName, signal: Signal) -> Result<(), ClientError> {
        self.expect_ok(&Request::WatcherSignal { name, signal }).await
    }

    pub async fn quit(&self, kill: bool) -> Result<(), ClientError> {
        match self.send(&Request::Quit { kill }).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }

    async fn expect_ok(&self, request: &Request) -> Result<(), ClientError> {
        match self.send(request).await? {
            Response::Ok => Ok(()),
            other => Self::reject(other),
        }
    }

    fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { message, .. } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}
