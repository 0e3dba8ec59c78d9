#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ProcessAdapter, ProcessAdapterError, SpawnSpec, SpawnedProcess, WaitOutcome};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use warden_core::{Pid, Rusage, Signal};

/// One recorded adapter call, for assertions in engine tests.
#[derive(Debug, Clone)]
pub enum SpawnCall {
    Spawn { cmdline: Vec<String> },
    Signal { pid: Pid, signal: Signal },
}

#[derive(Debug, Clone, Default)]
struct FakeChild {
    outcome: WaitOutcome,
    rusage: Rusage,
    descendants: Vec<Pid>,
}

struct FakeState {
    children: HashMap<i32, FakeChild>,
    calls: Vec<SpawnCall>,
    next_pid: i32,
}

/// In-memory stand-in for `UnixProcessAdapter`: `spawn` allocates a fake pid
/// instead of forking, and tests drive its lifecycle with `complete_exit`/
/// `set_rusage` rather than real signals.
#[derive(Clone)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                children: HashMap::new(),
                calls: Vec::new(),
                next_pid: 1000,
            })),
        }
    }
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SpawnCall> {
        self.inner.lock().calls.clone()
    }

    /// Mark a previously spawned pid as exited, to be observed on the next `try_wait`.
    pub fn complete_exit(&self, pid: Pid, outcome: WaitOutcome) {
        if let Some(child) = self.inner.lock().children.get_mut(&pid.0) {
            child.outcome = outcome;
        }
    }

    pub fn set_rusage(&self, pid: Pid, rusage: Rusage) {
        if let Some(child) = self.inner.lock().children.get_mut(&pid.0) {
            child.rusage = rusage;
        }
    }

    pub fn set_descendants(&self, pid: Pid, descendants: Vec<Pid>) {
        if let Some(child) = self.inner.lock().children.get_mut(&pid.0) {
            child.descendants = descendants;
        }
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn spawn(&self, spec: &SpawnSpec) -> Result<SpawnedProcess, ProcessAdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SpawnCall::Spawn {
            cmdline: spec.cmdline.clone(),
        });
        let pid = Pid(inner.next_pid);
        inner.next_pid += 1;
        inner.children.insert(pid.0, FakeChild::default());
        Ok(SpawnedProcess { pid, stdout: None, stderr: None })
    }

    fn signal(&self, pid: Pid, signal: Signal) -> Result<(), ProcessAdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SpawnCall::Signal { pid, signal });
        if !inner.children.contains_key(&pid.0) {
            return Err(ProcessAdapterError::NoSuchProcess(pid.0));
        }
        Ok(())
    }

    fn try_wait(&self, pid: Pid) -> Result<WaitOutcome, ProcessAdapterError> {
        let inner = self.inner.lock();
        match inner.children.get(&pid.0) {
            Some(child) => Ok(child.outcome),
            None => Err(ProcessAdapterError::NoSuchProcess(pid.0)),
        }
    }

    fn rusage(&self, pid: Pid) -> Result<Rusage, ProcessAdapterError> {
        let inner = self.inner.lock();
        inner
            .children
            .get(&pid.0)
            .map(|c| c.rusage)
            .ok_or(ProcessAdapterError::NoSuchProcess(pid.0))
    }

    fn descendants(&self, pid: Pid) -> Vec<Pid> {
        self.inner
            .lock()
            .children
            .get(&pid.0)
            .map(|c| c.descendants.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
