//! Control endpoint: accepts connections, dispatches one request at a time
//! against the shared Arbiter, and writes back a response. Matches the
//! documented contract that the event loop serializes commands — the
//! Arbiter sits behind a single async mutex held for the duration of each
//! request, so two connections never mutate concurrently even though each
//! gets its own accept-loop task.

use std::sync::Arc;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, error, info, warn};

use crate::lifecycle::DaemonArbiter;
use crate::protocol::{self, error_response, Request, Response, DEFAULT_TIMEOUT};

pub struct ListenCtx {
    pub arbiter: Arc<Mutex<DaemonArbiter>>,
    pub start_time: std::time::Instant,
    pub shutdown: Arc<Notify>,
}

pub struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { socket, ctx }
    }

    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                protocol::ProtocolError::ConnectionClosed => debug!("client disconnected"),
                                protocol::ProtocolError::Timeout => warn!("connection timed out"),
                                other => error!("connection error: {}", other),
                            }
                        }
                    });
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, ctx: &ListenCtx) -> Result<(), protocol::ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();
    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;
    debug!(?request, "received request");
    let response = handle_request(request, ctx).await;
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await
}

async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello { version: env!("CARGO_PKG_VERSION").to_string() },

        Request::Status => {
            let arbiter = ctx.arbiter.lock().await;
            Response::Status {
                uptime_secs: ctx.start_time.elapsed().as_secs(),
                watcher_count: arbiter.watcher_names().len(),
                run_state: format!("{:?}", arbiter.run_state()),
            }
        }

        Request::WatcherList => Response::Watchers { names: ctx.arbiter.lock().await.watcher_names() },

        Request::WatcherStatus { name } => match ctx.arbiter.lock().await.status(&name) {
            Ok(status) => Response::WatcherStatus { status },
            Err(e) => error_response(&e),
        },

        Request::WatcherPids { name } => match ctx.arbiter.lock().await.pids_for(&name) {
            Ok(pids) => Response::WatcherPids { pids: pids.into_iter().map(|p| p.0).collect() },
            Err(e) => error_response(&e),
        },

        Request::WatcherStart { name } => match ctx.arbiter.lock().await.start_watcher(&name).await {
            Ok(()) => Response::Ok,
            Err(e) => error_response(&e),
        },

        Request::WatcherStop { name } => match ctx.arbiter.lock().await.stop_watcher(&name).await {
            Ok(()) => Response::Ok,
            Err(e) => error_response(&e),
        },

        Request::WatcherRestart { name } => match ctx.arbiter.lock().await.restart_watcher(&name).await {
            Ok(()) => Response::Ok,
            Err(e) => error_response(&e),
        },

        Request::WatcherAdd { config, start } => {
            let name = config.name.clone();
            {
                let mut arbiter = ctx.arbiter.lock().await;
                arbiter.declare_watcher(config);
            }
            if start {
                if let Err(e) = ctx.arbiter.lock().await.start_watcher(&name).await {
                    return error_response(&e);
                }
            }
            Response::Ok
        }

        Request::WatcherRemove { name } => match ctx.arbiter.lock().await.remove_watcher(&name) {
            Ok(()) => Response::Ok,
            Err(e) => error_response(&e),
        },

        Request::WatcherIncr { name, by } => match ctx.arbiter.lock().await.incr(&name, by) {
            Ok(numprocesses) => Response::Numprocesses { numprocesses },
            Err(e) => error_response(&e),
        },

        Request::WatcherDecr { name, by } => match ctx.arbiter.lock().await.decr(&name, by) {
            Ok(numprocesses) => Response::Numprocesses { numprocesses },
            Err(e) => error_response(&e),
        },

        Request::WatcherSetOption { name, option } => match ctx.arbiter.lock().await.set_opt(&name, option) {
            Ok(respawned) => Response::OptionApplied { respawned },
            Err(e) => error_response(&e),
        },

        Request::WatcherSignal { name, signal } => match ctx.arbiter.lock().await.signal_watcher(&name, signal) {
            Ok(count) => {
                info!(?name, ?signal, count, "sent manual signal to watcher replicas");
                Response::Ok
            }
            Err(e) => error_response(&e),
        },

        Request::Reload { snapshot } => {
            info!(watchers = snapshot.watchers.len(), "reload requested");
            match ctx.arbiter.lock().await.apply_snapshot(snapshot.watchers).await {
                Ok(()) => Response::Ok,
                Err(e) => error_response(&e),
            }
        }

        Request::Quit { kill: _ } => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
