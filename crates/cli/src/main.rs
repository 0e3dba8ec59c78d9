// SPDX-License-Identifier: MIT

//! `warden`: command-line client for the `wardend` process supervisor.

mod client;
mod env;

use std::collections::HashMap;

use clap::{Parser, Subcommand};
use warden_core::{Signal, WatcherConfig, WatcherName, WatcherOption};

use client::{ClientError, DaemonClient};

#[derive(Parser)]
#[command(name = "warden", version, about = "Control a wardend process supervisor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the daemon is reachable.
    Ping,
    /// Daemon-wide status: uptime, watcher count, run state.
    Status,
    /// List declared watcher names.
    List,
    /// Show one watcher's status.
    WatcherStatus { name: String },
    /// Show one watcher's replica pids.
    Pids { name: String },
    /// Declare a new watcher from a minimal command line.
    Add {
        name: String,
        cmd: String,
        args: Vec<String>,
        #[arg(long, default_value_t = 1)]
        numprocesses: u32,
        #[arg(long)]
        start: bool,
    },
    /// Remove a stopped watcher's declaration.
    Remove { name: String },
    /// Start a declared-but-stopped watcher.
    Start { name: String },
    /// Stop a watcher's replicas.
    Stop { name: String },
    /// Stop then start a watcher.
    Restart { name: String },
    /// Raise a watcher's replica count.
    Incr { name: String, #[arg(default_value_t = 1)] by: u32 },
    /// Lower a watcher's replica count.
    Decr { name: String, #[arg(default_value_t = 1)] by: u32 },
    /// Send a signal to every replica of a watcher.
    Signal { name: String, signal: String },
    /// Apply one option: `warden set-option web numprocesses=3`.
    SetOption { name: String, option: String },
    /// Ask the daemon to shut down.
    Quit {
        #[arg(long)]
        kill: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli.command).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), ClientError> {
    let client = DaemonClient::connect()?;

    match command {
        Command::Ping => {
            client.ping().await?;
            println!("pong");
        }
        Command::Status => {
            let (uptime_secs, watcher_count, run_state) = client.status().await?;
            println!("run_state:      {run_state}");
            println!("uptime_secs:    {uptime_secs}");
            println!("watcher_count:  {watcher_count}");
        }
        Command::List => {
            let names = client.watcher_list().await?;
            for name in names {
                println!("{name}");
            }
        }
        Command::WatcherStatus { name } => {
            let status = client.watcher_status(WatcherName::new(name)).await?;
            println!("{status:?}");
        }
        Command::Pids { name } => {
            let pids = client.watcher_pids(WatcherName::new(name)).await?;
            for pid in pids {
                println!("{pid}");
            }
        }
        Command::Add { name, cmd, args, numprocesses, start } => {
            let config = WatcherConfig {
                name: WatcherName::new(name),
                cmd,
                args,
                numprocesses,
                working_dir: None,
                uid: None,
                gid: None,
                env: HashMap::new(),
                shell: false,
                executable: None,
                stop_signal: Signal::default(),
                stop_children: false,
                graceful_timeout: std::time::Duration::from_secs(5),
                warmup_delay: std::time::Duration::default(),
                max_retry: 0,
                respawn: true,
                autostart: true,
                singleton: false,
                copy_env: false,
                copy_path: false,
                use_sockets: false,
                rlimits: HashMap::new(),
                hooks: HashMap::new(),
                stdout_stream: None,
                stderr_stream: None,
                priority: 0,
                flap: Default::default(),
            };
            client.watcher_add(config, start).await?;
            println!("ok");
        }
        Command::Remove { name } => {
            client.watcher_remove(WatcherName::new(name)).await?;
            println!("ok");
        }
        Command::Start { name } => {
            client.watcher_start(WatcherName::new(name)).await?;
            println!("ok");
        }
        Command::Stop { name } => {
            client.watcher_stop(WatcherName::new(name)).await?;
            println!("ok");
        }
        Command::Restart { name } => {
            client.watcher_restart(WatcherName::new(name)).await?;
            println!("ok");
        }
        Command::Incr { name, by } => {
            let numprocesses = client.watcher_incr(WatcherName::new(name), by).await?;
            println!("numprocesses: {numprocesses}");
        }
        Command::Decr { name, by } => {
            let numprocesses = client.watcher_decr(WatcherName::new(name), by).await?;
            println!("numprocesses: {numprocesses}");
        }
        Command::Signal { name, signal } => {
            let signal = parse_signal(&signal)?;
            client.watcher_signal(WatcherName::new(name), signal).await?;
            println!("ok");
        }
        Command::SetOption { name, option } => {
            let option = parse_option(&option)?;
            let respawned = client.watcher_set_option(WatcherName::new(name), option).await?;
            println!("respawned: {respawned}");
        }
        Command::Quit { kill } => {
            client.quit(kill).await?;
            println!("ok");
        }
    }
    Ok(())
}

/// Parse a `key=value` pair into the small set of options exposed from the
/// command line. Anything else (rlimits, hooks, stream sinks) requires a
/// full config snapshot via `reload`, not this shorthand.
fn parse_option(raw: &str) -> Result<WatcherOption, ClientError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| ClientError::Rejected(format!("expected key=value, got '{raw}'")))?;
    let bad = |field: &str| ClientError::Rejected(format!("invalid value for {field}: '{value}'"));
    Ok(match key {
        "cmd" => WatcherOption::Cmd(value.to_string()),
        "numprocesses" => WatcherOption::Numprocesses(value.parse().map_err(|_| bad("numprocesses"))?),
        "respawn" => WatcherOption::Respawn(value.parse().map_err(|_| bad("respawn"))?),
        "autostart" => WatcherOption::Autostart(value.parse().map_err(|_| bad("autostart"))?),
        "singleton" => WatcherOption::Singleton(value.parse().map_err(|_| bad("singleton"))?),
        "max_retry" => WatcherOption::MaxRetry(value.parse().map_err(|_| bad("max_retry"))?),
        "priority" => WatcherOption::Priority(value.parse().map_err(|_| bad("priority"))?),
        "graceful_timeout" => WatcherOption::GracefulTimeout(value.parse().map_err(|_| bad("graceful_timeout"))?),
        "warmup_delay" => WatcherOption::WarmupDelay(value.parse().map_err(|_| bad("warmup_delay"))?),
        "stop_signal" => WatcherOption::StopSignal(parse_signal(value)?),
        other => return Err(ClientError::Rejected(format!("unsupported option key '{other}'"))),
    })
}

fn parse_signal(raw: &str) -> Result<Signal, ClientError> {
    let named = match raw.to_ascii_uppercase().as_str() {
        "SIGHUP" | "HUP" => Some(Signal::SIGHUP),
        "SIGINT" | "INT" => Some(Signal::SIGINT),
        "SIGQUIT" | "QUIT" => Some(Signal::SIGQUIT),
        "SIGKILL" | "KILL" => Some(Signal::SIGKILL),
        "SIGUSR1" | "USR1" => Some(Signal::SIGUSR1),
        "SIGUSR2" | "USR2" => Some(Signal::SIGUSR2),
        "SIGTERM" | "TERM" => Some(Signal::SIGTERM),
        _ => None,
    };
    if let Some(signal) = named {
        return Ok(signal);
    }
    raw.parse::<i32>()
        .map(Signal)
        .map_err(|_| ClientError::Rejected(format!("unrecognized signal '{raw}'")))
}
