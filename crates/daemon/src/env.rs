// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// Resolve state directory: `WARDEN_STATE_DIR` > `XDG_STATE_HOME`/warden > `~/.local/state/warden`.
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("WARDEN_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("warden"));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".local/state/warden"))
}

/// Path to the config snapshot, overridable via `WARDEN_CONFIG`.
pub fn config_path() -> Option<PathBuf> {
    std::env::var("WARDEN_CONFIG").ok().map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
