use super::*;
use std::time::Duration;

#[test]
fn fired_returns_due_deadlines_only() {
    let mut sched = Scheduler::new();
    let now = Instant::now();
    let web = WatcherName::new("web");
    sched.set(&web, DeadlineKind::Warmup, now, Duration::from_secs(1));
    sched.set(&web, DeadlineKind::FlapRetry, now, Duration::from_secs(10));

    assert!(sched.fired(now).is_empty());
    let fired = sched.fired(now + Duration::from_secs(2));
    assert_eq!(fired, vec![(web.clone(), DeadlineKind::Warmup)]);
    assert!(sched.fired(now + Duration::from_secs(2)).is_empty());
}

#[test]
fn cancel_removes_only_the_matching_kind() {
    let mut sched = Scheduler::new();
    let now = Instant::now();
    let web = WatcherName::new("web");
    sched.set(&web, DeadlineKind::GracefulTimeout(Wid(1)), now, Duration::from_secs(1));
    sched.set(&web, DeadlineKind::GracefulTimeout(Wid(2)), now, Duration::from_secs(1));

    sched.cancel(&web, DeadlineKind::GracefulTimeout(Wid(1)));
    let fired = sched.fired(now + Duration::from_secs(2));
    assert_eq!(fired, vec![(web, DeadlineKind::GracefulTimeout(Wid(2)))]);
}

#[test]
fn cancel_all_clears_every_deadline_for_a_watcher() {
    let mut sched = Scheduler::new();
    let now = Instant::now();
    let web = WatcherName::new("web");
    sched.set(&web, DeadlineKind::Warmup, now, Duration::from_secs(1));
    sched.cancel_all(&web);
    assert_eq!(sched.next_deadline(), None);
}

#[test]
fn next_deadline_is_the_earliest_across_watchers() {
    let mut sched = Scheduler::new();
    let now = Instant::now();
    sched.set(&WatcherName::new("a"), DeadlineKind::Warmup, now, Duration::from_secs(5));
    sched.set(&WatcherName::new("b"), DeadlineKind::Warmup, now, Duration::from_secs(1));
    assert_eq!(sched.next_deadline(), Some(now + Duration::from_secs(1)));
}
