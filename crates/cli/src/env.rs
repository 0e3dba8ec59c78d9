// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::client::ClientError;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Resolve state directory: `WARDEN_STATE_DIR` > `XDG_STATE_HOME`/warden > `~/.local/state/warden`.
pub fn state_dir() -> Result<PathBuf, ClientError> {
    if let Ok(dir) = std::env::var("WARDEN_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("warden"));
    }
    let home = std::env::var("HOME").map_err(|_| ClientError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/warden"))
}

/// Timeout for a single IPC round trip, overridable via `WARDEN_TIMEOUT_MS`.
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("WARDEN_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
