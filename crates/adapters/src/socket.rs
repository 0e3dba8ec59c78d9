//! Socket registrar: binds the listening sockets declared in the config
//! snapshot and exposes their raw fd numbers to spawned children.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::TcpListener;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use thiserror::Error;
use warden_core::SocketName;

#[derive(Debug, Error)]
pub enum SocketAdapterError {
    #[error("socket {0} already declared")]
    AlreadyBound(SocketName),
    #[error("socket {0} not found")]
    NotFound(SocketName),
    #[error("bind failed for {name}: {source}")]
    BindFailed {
        name: SocketName,
        #[source]
        source: std::io::Error,
    },
}

/// Declared listening socket, as carried in the config snapshot's `sockets` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketSpec {
    pub name: SocketName,
    pub family: SocketFamily,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_backlog")]
    pub backlog: u32,
    #[serde(default)]
    pub so_reuseport: bool,
    /// Close and rebind any pre-existing socket at the same address first.
    #[serde(default)]
    pub replace: bool,
}

fn default_backlog() -> u32 {
    128
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketFamily {
    Tcp,
    Unix,
}

enum BoundSocket {
    Tcp(TcpListener),
    Unix(UnixListener),
}

impl BoundSocket {
    fn fd(&self) -> RawFd {
        match self {
            BoundSocket::Tcp(l) => l.as_raw_fd(),
            BoundSocket::Unix(l) => l.as_raw_fd(),
        }
    }
}

/// Holds bound listening sockets for the Arbiter's lifetime. Creation order
/// is preserved so `close_all` can tear them down in reverse.
pub struct SocketRegistrar {
    sockets: Mutex<Vec<(SocketName, BoundSocket)>>,
}

impl Default for SocketRegistrar {
    fn default() -> Self {
        Self {
            sockets: Mutex::new(Vec::new()),
        }
    }
}

impl SocketRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, spec: &SocketSpec) -> Result<RawFd, SocketAdapterError> {
        let mut guard = self.sockets.lock();
        if guard.iter().any(|(n, _)| n == &spec.name) {
            if !spec.replace {
                return Err(SocketAdapterError::AlreadyBound(spec.name.clone()));
            }
            guard.retain(|(n, _)| n != &spec.name);
        }

        let bound = match spec.family {
            SocketFamily::Tcp => {
                let addr = format!("{}:{}", spec.host, spec.port);
                TcpListener::bind(&addr)
                    .map(BoundSocket::Tcp)
                    .map_err(|source| SocketAdapterError::BindFailed {
                        name: spec.name.clone(),
                        source,
                    })?
            }
            SocketFamily::Unix => {
                let path = spec.path.clone().unwrap_or_else(|| {
                    PathBuf::from(format!("/tmp/{}.sock", spec.name.as_str()))
                });
                if spec.replace {
                    let _ = std::fs::remove_file(&path);
                }
                UnixListener::bind(&path)
                    .map(BoundSocket::Unix)
                    .map_err(|source| SocketAdapterError::BindFailed {
                        name: spec.name.clone(),
                        source,
                    })?
            }
        };

        let fd = bound.fd();
        guard.push((spec.name.clone(), bound));
        Ok(fd)
    }

    pub fn get_fd(&self, name: &SocketName) -> Result<RawFd, SocketAdapterError> {
        self.sockets
            .lock()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.fd())
            .ok_or_else(|| SocketAdapterError::NotFound(name.clone()))
    }

    pub fn fds_by_name(&self) -> HashMap<String, RawFd> {
        self.sockets
            .lock()
            .iter()
            .map(|(name, s)| (name.as_str().to_string(), s.fd()))
            .collect()
    }

    /// Close every socket, in reverse creation order.
    pub fn close_all(&self) {
        let mut guard = self.sockets.lock();
        guard.reverse();
        guard.clear();
    }
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
