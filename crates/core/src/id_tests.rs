use super::*;

#[test]
fn watcher_name_compares_equal_to_str() {
    let name = WatcherName::new("web");
    assert_eq!(name, "web");
    assert_eq!(name.as_str(), "web");
}

#[test]
fn watcher_name_displays_as_inner_string() {
    let name = WatcherName::from("worker-1");
    assert_eq!(name.to_string(), "worker-1");
}

#[test]
fn pid_roundtrips_through_i32() {
    let pid: Pid = 4242.into();
    assert_eq!(pid.0, 4242);
    assert_eq!(pid.to_string(), "4242");
}

#[test]
fn wid_orders_numerically() {
    assert!(Wid(1) < Wid(2));
    assert!(Wid(10) > Wid(2));
}
