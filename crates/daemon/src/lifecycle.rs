//! Daemon startup and shutdown: pidfile locking, endpoint binding, wiring the
//! Arbiter up to real OS process control and the in-memory event bus.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

use warden_adapters::{SocketRegistrar, UnixProcessAdapter};
use warden_core::SystemClock;
use warden_engine::{Arbiter, GlobalConfig};

use crate::config::ConfigSnapshot;
use crate::event_bus::EventBus;

pub type DaemonArbiter = Arbiter<UnixProcessAdapter, SystemClock>;

/// Filesystem paths the daemon owns for the lifetime of one run.
#[derive(Debug, Clone)]
pub struct Paths {
    pub state_dir: PathBuf,
    pub pidfile: PathBuf,
    pub control_socket: PathBuf,
    pub publish_socket: PathBuf,
}

impl Paths {
    pub fn under(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            pidfile: state_dir.join("warden.pid"),
            control_socket: state_dir.join("control.sock"),
            publish_socket: state_dir.join("publish.sock"),
            state_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to acquire pidfile lock at {0}: daemon already running?")]
    LockFailed(PathBuf),
    #[error("failed to bind {kind} endpoint at {path}: {source}")]
    BindFailed { kind: &'static str, path: PathBuf, #[source] source: std::io::Error },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Daemon state during operation, returned by `startup`.
pub struct DaemonState {
    pub paths: Paths,
    #[allow(dead_code)]
    pidfile: File,
    pub arbiter: Arc<Mutex<DaemonArbiter>>,
    pub adapter: Arc<UnixProcessAdapter>,
    pub event_bus: EventBus,
    pub global: GlobalConfig,
    pub start_time: Instant,
}

pub struct StartupResult {
    pub daemon: DaemonState,
    pub control_listener: UnixListener,
    pub publish_listener: UnixListener,
}

/// Bind sockets and construct the Arbiter from a config snapshot. Does not
/// start any watcher — the caller invokes `Arbiter::start` once ready to
/// accept connections, matching the documented starting -> running lifecycle.
pub async fn startup(paths: Paths, snapshot: ConfigSnapshot) -> Result<StartupResult, LifecycleError> {
    match startup_inner(&paths, snapshot).await {
        Ok(result) => Ok(result),
        Err(e) => {
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&paths);
            }
            Err(e)
        }
    }
}

async fn startup_inner(paths: &Paths, snapshot: ConfigSnapshot) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&paths.state_dir)?;

    let pidfile = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.pidfile)?;
    pidfile
        .try_lock_exclusive()
        .map_err(|_| LifecycleError::LockFailed(paths.pidfile.clone()))?;

    use std::io::Write as _;
    pidfile.set_len(0)?;
    {
        let mut pidfile = &pidfile;
        writeln!(pidfile, "{}", std::process::id())?;
    }

    if paths.control_socket.exists() {
        std::fs::remove_file(&paths.control_socket)?;
    }
    let control_listener = UnixListener::bind(&paths.control_socket).map_err(|source| {
        LifecycleError::BindFailed { kind: "control", path: paths.control_socket.clone(), source }
    })?;

    if paths.publish_socket.exists() {
        std::fs::remove_file(&paths.publish_socket)?;
    }
    let publish_listener = UnixListener::bind(&paths.publish_socket).map_err(|source| {
        LifecycleError::BindFailed { kind: "publish", path: paths.publish_socket.clone(), source }
    })?;

    let event_bus = EventBus::new();
    let sockets = Arc::new(SocketRegistrar::new());
    let adapter = Arc::new(UnixProcessAdapter::new());
    let global = GlobalConfig {
        check_delay: std::time::Duration::from_secs_f64(snapshot.global.check_delay_secs),
        warmup_delay: std::time::Duration::from_secs_f64(snapshot.global.warmup_delay_secs),
        umask: snapshot.global.umask,
    };

    let mut arbiter = Arbiter::new(
        sockets,
        Arc::clone(&adapter),
        SystemClock,
        crate::event_bus::as_event_sink(event_bus.clone()),
        Arc::new(warden_engine::NoOpHookInvoker),
        global.clone(),
    );
    for watcher in snapshot.watchers {
        arbiter.declare_watcher(watcher);
    }

    info!(watchers = arbiter.watcher_names().len(), "daemon constructed");

    Ok(StartupResult {
        daemon: DaemonState {
            paths: paths.clone(),
            pidfile,
            arbiter: Arc::new(Mutex::new(arbiter)),
            adapter,
            event_bus,
            global,
            start_time: Instant::now(),
        },
        control_listener,
        publish_listener,
    })
}

impl DaemonState {
    /// Release sockets and the pidfile. The lock itself is released when
    /// `pidfile` is dropped.
    pub fn shutdown(&self) {
        info!("shutting down");
        if self.paths.control_socket.exists() {
            if let Err(e) = std::fs::remove_file(&self.paths.control_socket) {
                warn!("failed to remove control socket: {}", e);
            }
        }
        if self.paths.publish_socket.exists() {
            if let Err(e) = std::fs::remove_file(&self.paths.publish_socket) {
                warn!("failed to remove publish socket: {}", e);
            }
        }
        if self.paths.pidfile.exists() {
            if let Err(e) = std::fs::remove_file(&self.paths.pidfile) {
                warn!("failed to remove pidfile: {}", e);
            }
        }
        info!("shutdown complete");
    }
}

fn cleanup_on_failure(paths: &Paths) {
    let _ = std::fs::remove_file(&paths.control_socket);
    let _ = std::fs::remove_file(&paths.publish_socket);
    let _ = std::fs::remove_file(&paths.pidfile);
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
