// SPDX-License-Identifier: MIT

//! `wardend`: background process supervisor.
//!
//! Owns every declared Watcher's replicas, reconciles desired vs. actual
//! process counts on a `check_delay` tick, reaps exited children, and serves
//! the control and publish Unix sockets.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod env;
mod event_bus;
mod lifecycle;
mod listener;
mod protocol;
mod publish;

use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info, warn};
use warden_adapters::ProcessAdapter;

use crate::config::ConfigSnapshot;
use crate::lifecycle::{LifecycleError, Paths, StartupResult};
use crate::listener::{ListenCtx, Listener};
use crate::publish::PublishListener;

const REAP_INTERVAL: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("wardend {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: wardend [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let state_dir = env::state_dir().ok_or("could not resolve a state directory (set WARDEN_STATE_DIR or HOME)")?;
    let paths = Paths::under(state_dir);

    let snapshot = match env::config_path() {
        Some(path) => match config::load_snapshot(&path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(2);
            }
        },
        None => ConfigSnapshot::default(),
    };

    let _log_guard = setup_logging(&paths.state_dir)?;
    info!("starting wardend");

    let StartupResult { daemon, control_listener, publish_listener } = match lifecycle::startup(paths.clone(), snapshot).await
    {
        Ok(result) => result,
        Err(LifecycleError::LockFailed(path)) => {
            eprintln!("wardend is already running (pidfile locked: {})", path.display());
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to start daemon: {}", e);
            return Err(e.into());
        }
    };

    {
        let mut arbiter = daemon.arbiter.lock().await;
        arbiter.start().await?;
    }

    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        arbiter: Arc::clone(&daemon.arbiter),
        start_time: daemon.start_time,
        shutdown: Arc::clone(&shutdown),
    });
    tokio::spawn(Listener::new(control_listener, ctx).run());
    tokio::spawn(PublishListener::new(publish_listener, daemon.event_bus.clone()).run());

    spawn_reap_loop(Arc::clone(&daemon.arbiter), Arc::clone(&daemon.adapter));

    let mut tick_interval = tokio::time::interval(daemon.global.check_delay);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(control = %paths.control_socket.display(), "wardend ready");
    println!("READY");

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                if let Err(e) = daemon.arbiter.lock().await.tick().await {
                    warn!("tick error: {}", e);
                }
            }
            _ = shutdown.notified() => {
                info!("shutdown requested via control socket");
                break;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    if let Err(e) = daemon.arbiter.lock().await.stop().await {
        warn!("error stopping watchers during shutdown: {}", e);
    }
    daemon.shutdown();
    info!("wardend stopped");
    Ok(())
}

/// Poll every tracked pid at a fixed interval and route exits into the
/// Arbiter. A true SIGCHLD-driven wakeup would shave reap latency to
/// near-zero, but polling keeps this independent of the `signal-hook` crate
/// and is cheap at `REAP_INTERVAL`'s granularity.
fn spawn_reap_loop(arbiter: Arc<tokio::sync::Mutex<lifecycle::DaemonArbiter>>, adapter: Arc<warden_adapters::UnixProcessAdapter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REAP_INTERVAL);
        loop {
            interval.tick().await;
            let pids = arbiter.lock().await.running_pids();
            for pid in pids {
                match adapter.try_wait(pid) {
                    Ok(warden_adapters::WaitOutcome::StillRunning) => {}
                    Ok(outcome) => {
                        if let Err(e) = arbiter.lock().await.handle_child_exit(pid, outcome).await {
                            warn!(?pid, "error handling child exit: {}", e);
                        }
                    }
                    Err(_) => {}
                }
            }
        }
    });
}

fn print_usage() {
    println!("wardend {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Process supervisor daemon. Declares and reconciles Watchers, the");
    println!("OS process groups it supervises, against a config snapshot.");
    println!();
    println!("USAGE:");
    println!("    wardend");
    println!();
    println!("ENVIRONMENT:");
    println!("    WARDEN_STATE_DIR   overrides the pidfile/socket/log directory");
    println!("    WARDEN_CONFIG      path to a JSON config snapshot to load at startup");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}

fn setup_logging(state_dir: &std::path::Path) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(state_dir)?;
    let file_appender = tracing_appender::rolling::never(state_dir, "wardend.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();

    Ok(guard)
}
