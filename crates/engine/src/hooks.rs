//! Hook invocation: `before_start`, `after_spawn`, etc. fire against an
//! injected collaborator, never a hardcoded mechanism — what a `target`
//! string actually names (a plugin method, an external binary) is the
//! caller's business.

use async_trait::async_trait;
use warden_core::{HookName, HookSpec, Pid, WatcherName};

#[async_trait]
pub trait HookInvoker: Send + Sync + 'static {
    /// Run `target`, returning `Err` if the hook itself failed (nonzero
    /// exit, plugin error, ...). Timeout handling is the invoker's job.
    async fn invoke(&self, target: &str, watcher: &WatcherName, pid: Option<Pid>) -> Result<(), String>;
}

/// A `HookInvoker` that always succeeds, for tests and for watchers with no
/// hooks configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHookInvoker;

#[async_trait]
impl HookInvoker for NoOpHookInvoker {
    async fn invoke(&self, _target: &str, _watcher: &WatcherName, _pid: Option<Pid>) -> Result<(), String> {
        Ok(())
    }
}

/// Outcome of running one hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Hook absent, succeeded, or failed with `ignore_failure = true`.
    Continue,
    /// Hook failed and `ignore_failure = false`: the caller must abort the
    /// transition that triggered it.
    Abort { message: String },
}

/// Run the hook registered for `name`, if any, applying `ignore_failure`.
pub async fn run_hook(
    invoker: &dyn HookInvoker,
    hooks: &std::collections::HashMap<HookName, HookSpec>,
    name: HookName,
    watcher: &WatcherName,
    pid: Option<Pid>,
) -> HookOutcome {
    let Some(spec) = hooks.get(&name) else {
        return HookOutcome::Continue;
    };
    match invoker.invoke(&spec.target, watcher, pid).await {
        Ok(()) => HookOutcome::Continue,
        Err(message) if spec.ignore_failure => {
            tracing::warn!(%watcher, hook = ?name, %message, "hook failed, ignoring");
            HookOutcome::Continue
        }
        Err(message) => HookOutcome::Abort { message },
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
