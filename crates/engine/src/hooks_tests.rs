use super::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

struct RecordingInvoker {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl HookInvoker for RecordingInvoker {
    async fn invoke(&self, _target: &str, _watcher: &WatcherName, _pid: Option<Pid>) -> Result<(), String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err("boom".to_string())
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn missing_hook_is_a_continue() {
    let invoker = RecordingInvoker { calls: AtomicUsize::new(0), fail: false };
    let hooks = HashMap::new();
    let outcome = run_hook(&invoker, &hooks, HookName::BeforeStart, &WatcherName::new("web"), None).await;
    assert_eq!(outcome, HookOutcome::Continue);
    assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failing_hook_with_ignore_failure_continues() {
    let invoker = RecordingInvoker { calls: AtomicUsize::new(0), fail: true };
    let mut hooks = HashMap::new();
    hooks.insert(HookName::AfterStop, HookSpec { target: "notify".into(), ignore_failure: true });
    let outcome = run_hook(&invoker, &hooks, HookName::AfterStop, &WatcherName::new("web"), None).await;
    assert_eq!(outcome, HookOutcome::Continue);
}

#[tokio::test]
async fn failing_hook_without_ignore_failure_aborts() {
    let invoker = RecordingInvoker { calls: AtomicUsize::new(0), fail: true };
    let mut hooks = HashMap::new();
    hooks.insert(HookName::BeforeSpawn, HookSpec { target: "gate".into(), ignore_failure: false });
    let outcome = run_hook(&invoker, &hooks, HookName::BeforeSpawn, &WatcherName::new("web"), None).await;
    assert!(matches!(outcome, HookOutcome::Abort { .. }));
}
