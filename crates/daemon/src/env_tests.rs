use super::*;
use std::sync::Mutex;

/// Serialize tests that mutate shared env vars to avoid races.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn state_dir_prefers_warden_state_dir() {
    let _lock = ENV_LOCK.lock().unwrap();
    std::env::set_var("WARDEN_STATE_DIR", "/tmp/warden-explicit");
    assert_eq!(state_dir(), Some(PathBuf::from("/tmp/warden-explicit")));
    std::env::remove_var("WARDEN_STATE_DIR");
}

#[test]
fn state_dir_falls_back_to_xdg_state_home() {
    let _lock = ENV_LOCK.lock().unwrap();
    std::env::remove_var("WARDEN_STATE_DIR");
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg-state");
    assert_eq!(state_dir(), Some(PathBuf::from("/tmp/xdg-state/warden")));
    std::env::remove_var("XDG_STATE_HOME");
}

#[test]
fn config_path_is_none_when_unset() {
    let _lock = ENV_LOCK.lock().unwrap();
    std::env::remove_var("WARDEN_CONFIG");
    assert_eq!(config_path(), None);
}

#[test]
fn config_path_reads_warden_config() {
    let _lock = ENV_LOCK.lock().unwrap();
    std::env::set_var("WARDEN_CONFIG", "/etc/warden/snapshot.json");
    assert_eq!(config_path(), Some(PathBuf::from("/etc/warden/snapshot.json")));
    std::env::remove_var("WARDEN_CONFIG");
}
