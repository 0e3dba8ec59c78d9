//! The Arbiter: top-level coordinator owning every Watcher, the socket
//! registrar and the reconciliation loop.

use crate::event_sink::EventSink;
use crate::hooks::{run_hook, HookInvoker};
use crate::scheduler::{DeadlineKind, Scheduler};
use crate::watcher_runtime::{ExitDisposition, WatcherRuntime};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use crate::streams::Redirector;
use warden_adapters::{ProcessAdapter, SocketRegistrar, SpawnSpec, SpawnedProcess, WaitOutcome};
use warden_core::{
    process::expand_vars, Clock, Envelope, ErrorKind, EventKind, HookName, Pid, Signal,
    WardenError, WatcherConfig, WatcherName, WatcherOption, WatcherStatus, Wid,
};

/// Global options carried in the config snapshot alongside the watcher/socket/
/// plugin lists (the parts the Arbiter itself consumes).
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub check_delay: Duration,
    pub warmup_delay: Duration,
    pub umask: Option<u32>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            check_delay: Duration::from_secs(1),
            warmup_delay: Duration::ZERO,
            umask: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
}

pub struct Arbiter<A: ProcessAdapter, C: Clock> {
    watchers: IndexMap<WatcherName, WatcherRuntime>,
    pid_owner: HashMap<Pid, WatcherName>,
    sockets: Arc<SocketRegistrar>,
    adapter: Arc<A>,
    clock: C,
    scheduler: Scheduler,
    events: Arc<dyn EventSink>,
    hooks: Arc<dyn HookInvoker>,
    global: GlobalConfig,
    run_state: RunState,
}

impl<A: ProcessAdapter, C: Clock> Arbiter<A, C> {
    pub fn new(
        sockets: Arc<SocketRegistrar>,
        adapter: Arc<A>,
        clock: C,
        events: Arc<dyn EventSink>,
        hooks: Arc<dyn HookInvoker>,
        global: GlobalConfig,
    ) -> Self {
        Self {
            watchers: IndexMap::new(),
            pid_owner: HashMap::new(),
            sockets,
            adapter,
            clock,
            scheduler: Scheduler::new(),
            events,
            hooks,
            global,
            run_state: RunState::Idle,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn declare_watcher(&mut self, config: WatcherConfig) {
        self.watchers
            .insert(config.name.clone(), WatcherRuntime::new(config));
    }

    pub fn remove_watcher(&mut self, name: &WatcherName) -> Result<(), WardenError> {
        let runtime = self
            .watchers
            .get(name)
            .ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?;
        if runtime.status != WatcherStatus::Stopped {
            return Err(WardenError::new(
                ErrorKind::BadArgument,
                format!("watcher {name} must be stopped before removal"),
            ));
        }
        self.watchers.shift_remove(name);
        Ok(())
    }

    pub fn watcher_names(&self) -> Vec<WatcherName> {
        self.iter_by_priority().map(|(name, _)| name.clone()).collect()
    }

    pub fn status(&self, name: &WatcherName) -> Result<WatcherStatus, WardenError> {
        self.watchers
            .get(name)
            .map(|w| w.status)
            .ok_or_else(|| WardenError::unknown_watcher(name.as_str()))
    }

    /// Every pid currently tracked across all watchers, for a caller-driven
    /// reap loop (SIGCHLD handler + non-blocking waitpid over this set).
    pub fn running_pids(&self) -> Vec<Pid> {
        self.pid_owner.keys().copied().collect()
    }

    /// Pids of one watcher's replicas, in stable insertion order.
    pub fn pids_for(&self, name: &WatcherName) -> Result<Vec<Pid>, WardenError> {
        self.watchers
            .get(name)
            .map(|w| w.processes.keys().copied().collect())
            .ok_or_else(|| WardenError::unknown_watcher(name.as_str()))
    }

    /// Stable iteration by `priority` descending, then insertion order.
    fn iter_by_priority(&self) -> impl Iterator<Item = (&WatcherName, &WatcherRuntime)> {
        let mut entries: Vec<_> = self.watchers.iter().collect();
        entries.sort_by(|(_, a), (_, b)| b.config.priority.cmp(&a.config.priority));
        entries.into_iter()
    }

    /// Bind declared sockets, then start every `autostart` watcher in
    /// priority order, gated by the global warm-up delay between each.
    pub async fn start(&mut self) -> Result<(), WardenError> {
        self.run_state = RunState::Starting;
        let autostart: Vec<WatcherName> = self
            .iter_by_priority()
            .filter(|(_, w)| w.config.autostart)
            .map(|(name, _)| name.clone())
            .collect();
        for name in autostart {
            self.start_watcher(&name).await?;
            if !self.global.warmup_delay.is_zero() {
                tokio::time::sleep(self.global.warmup_delay).await;
            }
        }
        self.run_state = RunState::Running;
        self.events.publish(Envelope::new(
            warden_core::Topic::global("circus.start"),
            EventKind::Started,
        ));
        Ok(())
    }

    /// Stop every watcher in reverse priority order.
    pub async fn stop(&mut self) -> Result<(), WardenError> {
        self.run_state = RunState::Stopping;
        let names: Vec<WatcherName> = {
            let mut v = self.watcher_names();
            v.reverse();
            v
        };
        for name in names {
            self.stop_watcher(&name).await?;
        }
        self.sockets.close_all();
        self.run_state = RunState::Stopped;
        self.events.publish(Envelope::new(
            warden_core::Topic::global("circus.stop"),
            EventKind::Stopped,
        ));
        Ok(())
    }

    /// No-op if `name` is already `Active` — starting a running watcher is
    /// idempotent, not an error.
    pub async fn start_watcher(&mut self, name: &WatcherName) -> Result<(), WardenError> {
        {
            let runtime = self
                .watchers
                .get_mut(name)
                .ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?;
            if runtime.status == WatcherStatus::Active {
                return Ok(());
            }
            runtime.status = WatcherStatus::Starting;
        }
        self.events.publish(Envelope::for_watcher(name, "starting", EventKind::Starting));

        if run_hook(self.hooks.as_ref(), &self.watchers[name].config.hooks, HookName::BeforeStart, name, None)
            .await
            == crate::hooks::HookOutcome::Continue
        {
            self.reconcile_watcher(name).await?;
            let runtime = self.watchers.get_mut(name).ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?;
            runtime.status = WatcherStatus::Active;
            self.events.publish(Envelope::for_watcher(name, "started", EventKind::Started));
            if let crate::hooks::HookOutcome::Abort { message } =
                run_hook(self.hooks.as_ref(), &self.watchers[name].config.hooks, HookName::AfterStart, name, None)
                    .await
            {
                tracing::warn!(%name, %message, "after_start hook failed");
            }
        }
        Ok(())
    }

    pub async fn stop_watcher(&mut self, name: &WatcherName) -> Result<(), WardenError> {
        let hooks = self
            .watchers
            .get(name)
            .ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?
            .config
            .hooks
            .clone();
        if let crate::hooks::HookOutcome::Abort { message } =
            run_hook(self.hooks.as_ref(), &hooks, HookName::BeforeStop, name, None).await
        {
            return Err(WardenError::new(ErrorKind::HookFailed, message));
        }

        let (pids, graceful_timeout, stop_signal, stop_children) = {
            let runtime = self
                .watchers
                .get_mut(name)
                .ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?;
            runtime.status = WatcherStatus::Stopping;
            let pids: Vec<(Pid, Wid)> = runtime.processes.values().map(|p| (p.pid, p.wid)).collect();
            (pids, runtime.config.graceful_timeout, runtime.config.stop_signal, runtime.config.stop_children)
        };
        self.events.publish(Envelope::for_watcher(name, "stopping", EventKind::Stopping));

        for (pid, wid) in &pids {
            self.send_signal_to_replica(name, *pid, stop_signal, stop_children).await?;
            let deadline = self.clock.now() + graceful_timeout;
            if let Some(runtime) = self.watchers.get_mut(name) {
                runtime.mark_stopping(*pid, deadline);
            }
            self.scheduler.set(name, DeadlineKind::GracefulTimeout(*wid), self.clock.now(), graceful_timeout);
        }

        // Wait for graceful exit or escalate to SIGKILL past the deadline.
        let deadline = self.clock.now() + graceful_timeout + Duration::from_millis(50);
        while self.clock.now() < deadline {
            if self.watchers.get(name).map(|w| w.is_idle()).unwrap_or(true) {
                break;
            }
            for (pid, _) in pids.clone() {
                if let Some(outcome) = self.poll_exit(name, pid).await? {
                    self.record_exit(name, pid, outcome).await?;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        // Escalate anything still alive.
        if let Some(runtime) = self.watchers.get(name) {
            let still_alive: Vec<Pid> = runtime.processes.keys().copied().collect();
            for pid in still_alive {
                let _ = self.adapter.signal(pid, Signal::SIGKILL);
            }
        }

        if let Some(runtime) = self.watchers.get_mut(name) {
            runtime.status = WatcherStatus::Stopped;
        }
        self.events.publish(Envelope::for_watcher(name, "stopped", EventKind::Stopped));
        if let Some(spec) = self.watchers.get(name).map(|w| w.config.hooks.clone()) {
            if let crate::hooks::HookOutcome::Abort { message } =
                run_hook(self.hooks.as_ref(), &spec, HookName::AfterStop, name, None).await
            {
                tracing::warn!(%name, %message, "after_stop hook failed");
            }
        }
        Ok(())
    }

    pub async fn restart_watcher(&mut self, name: &WatcherName) -> Result<(), WardenError> {
        self.stop_watcher(name).await?;
        self.start_watcher(name).await
    }

    /// Spawn replicas until `numprocesses` is met.
    pub async fn reconcile_watcher(&mut self, name: &WatcherName) -> Result<(), WardenError> {
        let deficit = self
            .watchers
            .get(name)
            .ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?
            .deficit();
        for _ in 0..deficit {
            self.spawn_replica(name).await?;
        }
        Ok(())
    }

    async fn spawn_replica(&mut self, name: &WatcherName) -> Result<Pid, WardenError> {
        let wid = {
            let runtime = self.watchers.get_mut(name).ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?;
            runtime.next_wid()
        };
        let config = self.watchers[name].config.clone();

        let socket_fds = self.sockets.fds_by_name();
        let socket_env: HashMap<String, String> = socket_fds
            .iter()
            .map(|(k, v)| (format!("circus.sockets.{k}"), v.to_string()))
            .collect();

        let mut env = config.env.clone();
        if config.copy_env {
            for (k, v) in std::env::vars() {
                env.entry(k).or_insert(v);
            }
        }
        for (key, value) in env.clone() {
            env.insert(key, expand_vars(&value, &config.env, wid, &socket_env));
        }

        let mut cmdline = vec![config.resolved_executable().to_string()];
        cmdline.extend(config.args.iter().map(|a| expand_vars(a, &config.env, wid, &socket_env)));

        let spec = SpawnSpec {
            cmdline,
            working_dir: config.working_dir.clone(),
            env: env.clone(),
            uid: config.uid.clone(),
            gid: config.gid.clone(),
            rlimits: config.rlimits.clone(),
            umask: self.global.umask,
            inherited_fds: if config.use_sockets { socket_fds.values().copied().collect() } else { Vec::new() },
            new_session: config.stop_children,
            stdout_piped: config.stdout_stream.is_some(),
            stderr_piped: config.stderr_stream.is_some(),
        };

        if let crate::hooks::HookOutcome::Abort { message } =
            run_hook(self.hooks.as_ref(), &config.hooks, HookName::BeforeSpawn, name, None).await
        {
            return Err(WardenError::new(ErrorKind::HookFailed, message));
        }

        let SpawnedProcess { pid, stdout, stderr } = self
            .adapter
            .spawn(&spec)
            .await
            .map_err(|e| WardenError::new(ErrorKind::SpawnFailed, e.to_string()))?;

        if let (Some(sink), Some(out)) = (&config.stdout_stream, stdout) {
            if let Ok(redirector) = crate::streams::build_redirector(sink, &resolve_stream_callback) {
                spawn_line_pump(out, redirector);
            }
        }
        if let (Some(sink), Some(err)) = (&config.stderr_stream, stderr) {
            if let Ok(redirector) = crate::streams::build_redirector(sink, &resolve_stream_callback) {
                spawn_line_pump(err, redirector);
            }
        }

        let runtime = self.watchers.get_mut(name).ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?;
        runtime.register_spawn(pid, wid, spec.cmdline.clone(), env);
        self.pid_owner.insert(pid, name.clone());

        self.events.publish(
            Envelope::for_watcher(name, "spawn", EventKind::Spawn { pid, wid }).with_pid(pid),
        );
        if let crate::hooks::HookOutcome::Abort { message } =
            run_hook(self.hooks.as_ref(), &config.hooks, HookName::AfterSpawn, name, Some(pid)).await
        {
            tracing::warn!(%name, %message, "after_spawn hook failed");
        }
        Ok(pid)
    }

    async fn send_signal_to_replica(
        &self,
        name: &WatcherName,
        pid: Pid,
        signal: Signal,
        stop_children: bool,
    ) -> Result<(), WardenError> {
        if let Some(hooks) = self.watchers.get(name).map(|w| w.config.hooks.clone()) {
            if let crate::hooks::HookOutcome::Abort { message } =
                run_hook(self.hooks.as_ref(), &hooks, HookName::BeforeSignal, name, Some(pid)).await
            {
                return Err(WardenError::new(ErrorKind::HookFailed, message));
            }
        }
        self.adapter
            .signal(pid, signal)
            .map_err(|e| WardenError::new(ErrorKind::SignalFailed, e.to_string()))?;
        if stop_children {
            for child in self.adapter.descendants(pid) {
                let _ = self.adapter.signal(child, signal);
            }
        }
        self.events.publish(
            Envelope::for_watcher(name, "kill", EventKind::Kill { pid, signal: signal.as_raw() }).with_pid(pid),
        );
        Ok(())
    }

    async fn poll_exit(&self, _name: &WatcherName, pid: Pid) -> Result<Option<WaitOutcome>, WardenError> {
        match self.adapter.try_wait(pid) {
            Ok(WaitOutcome::StillRunning) => Ok(None),
            Ok(outcome) => Ok(Some(outcome)),
            Err(_) => Ok(None),
        }
    }

    /// Apply one reaped exit, running the Watcher's flap/respawn logic and
    /// publishing the `reap` event.
    async fn record_exit(&mut self, name: &WatcherName, pid: Pid, outcome: WaitOutcome) -> Result<(), WardenError> {
        let cause = match outcome {
            WaitOutcome::Exited(code) => warden_core::ExitCause::Exited(code),
            WaitOutcome::Signaled(sig) => warden_core::ExitCause::Signaled(sig),
            WaitOutcome::StillRunning => return Ok(()),
        };
        self.pid_owner.remove(&pid);
        let now = self.clock.now();
        if let Some(wid) = self.watchers.get(name).and_then(|w| w.processes.get(&pid)).map(|p| p.wid) {
            self.scheduler.cancel(name, DeadlineKind::GracefulTimeout(wid));
        }

        let disposition = {
            let runtime = self.watchers.get_mut(name).ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?;
            runtime.handle_exit(pid, cause.clone(), now)
        };

        let (exit_code, signaled_by) = match &cause {
            warden_core::ExitCause::Exited(code) => (Some(*code), None),
            warden_core::ExitCause::Signaled(sig) => (None, Some(*sig)),
            warden_core::ExitCause::SpawnError(_) => (None, None),
        };
        self.events.publish(
            Envelope::for_watcher(name, "reap", EventKind::Reap { pid, exit_code, signaled_by }).with_pid(pid),
        );
        if let crate::hooks::HookOutcome::Abort { message } =
            run_hook(self.hooks.as_ref(), &self.watchers[name].config.hooks, HookName::AfterReap, name, Some(pid))
                .await
        {
            tracing::warn!(%name, %message, "after_reap hook failed");
        }

        match disposition {
            ExitDisposition::ShouldRespawn => {
                if self.watchers.get(name).map(|w| w.status) == Some(WatcherStatus::Active) {
                    self.spawn_replica(name).await?;
                }
            }
            ExitDisposition::Paused => {
                let retry_in = self.watchers[name].config.flap.retry_in;
                self.scheduler.set(name, DeadlineKind::FlapRetry, now, retry_in);
            }
            ExitDisposition::Flapping | ExitDisposition::Expected | ExitDisposition::Unknown => {}
        }
        Ok(())
    }

    /// Route a reported child exit to its owning watcher, wherever it came
    /// from in the reaping loop (SIGCHLD wakeup or poll tick).
    pub async fn handle_child_exit(&mut self, pid: Pid, outcome: WaitOutcome) -> Result<(), WardenError> {
        let Some(name) = self.pid_owner.get(&pid).cloned() else {
            return Ok(());
        };
        self.record_exit(&name, pid, outcome).await
    }

    /// Periodic tick: fire due deadlines (warm-up already handled inline in
    /// `start`; graceful timeouts escalate to SIGKILL; flap retries clear
    /// the pause and reconcile back up to `numprocesses`).
    pub async fn tick(&mut self) -> Result<(), WardenError> {
        let now = self.clock.now();
        for (name, kind) in self.scheduler.fired(now) {
            match kind {
                DeadlineKind::GracefulTimeout(wid) => {
                    if let Some(runtime) = self.watchers.get(&name) {
                        if let Some(pid) = runtime.processes.values().find(|p| p.wid == wid).map(|p| p.pid) {
                            let _ = self.adapter.signal(pid, Signal::SIGKILL);
                        }
                    }
                }
                DeadlineKind::FlapRetry => {
                    if let Some(runtime) = self.watchers.get_mut(&name) {
                        if runtime.status != WatcherStatus::Error {
                            runtime.flap.reset();
                        }
                    }
                    if self.watchers.get(&name).map(|w| w.status) == Some(WatcherStatus::Active) {
                        self.reconcile_watcher(&name).await?;
                    }
                }
                DeadlineKind::Warmup => {}
            }
        }
        for name in self.watcher_names() {
            if self.watchers.get(&name).map(|w| w.status) == Some(WatcherStatus::Active) {
                self.reconcile_watcher(&name).await?;
            }
        }
        self.events.publish(Envelope::new(
            warden_core::Topic::global("circus.health"),
            EventKind::Health { watcher_count: self.watchers.len() },
        ));
        Ok(())
    }

    /// Send an arbitrary signal to every running replica of a watcher,
    /// bypassing `stop_signal`/`graceful_timeout` escalation. Returns the
    /// number of replicas signaled.
    pub fn signal_watcher(&mut self, name: &WatcherName, signal: Signal) -> Result<usize, WardenError> {
        let pids = self.pids_for(name)?;
        let mut sent = 0;
        for pid in pids {
            if self.adapter.signal(pid, signal).is_ok() {
                sent += 1;
            }
        }
        Ok(sent)
    }

    pub fn incr(&mut self, name: &WatcherName, by: u32) -> Result<u32, WardenError> {
        let runtime = self.watchers.get_mut(name).ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?;
        if runtime.config.singleton && by > 0 {
            return Err(WardenError::bad_argument(format!("{name} is a singleton watcher, cannot incr")));
        }
        runtime.config.numprocesses += by;
        Ok(runtime.config.effective_numprocesses())
    }

    pub fn decr(&mut self, name: &WatcherName, by: u32) -> Result<u32, WardenError> {
        let runtime = self.watchers.get_mut(name).ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?;
        runtime.config.numprocesses = runtime.config.numprocesses.saturating_sub(by);
        Ok(runtime.config.effective_numprocesses())
    }

    pub fn set_opt(&mut self, name: &WatcherName, opt: WatcherOption) -> Result<bool, WardenError> {
        let runtime = self.watchers.get_mut(name).ok_or_else(|| WardenError::unknown_watcher(name.as_str()))?;
        let requires_respawn = opt.requires_respawn();
        apply_option(&mut runtime.config, opt);
        Ok(requires_respawn)
    }

    /// Diff a freshly loaded watcher list against what's currently declared:
    /// watchers absent from `desired` are stopped and dropped, watchers not
    /// yet known are declared (and started if `autostart`), and watchers
    /// present in both have their config replaced, restarting only if a
    /// field that actually requires a respawn changed.
    pub async fn apply_snapshot(&mut self, desired: Vec<WatcherConfig>) -> Result<(), WardenError> {
        let desired_names: std::collections::HashSet<WatcherName> =
            desired.iter().map(|c| c.name.clone()).collect();
        let removed: Vec<WatcherName> =
            self.watcher_names().into_iter().filter(|n| !desired_names.contains(n)).collect();
        for name in removed {
            if self.status(&name)? != WatcherStatus::Stopped {
                self.stop_watcher(&name).await?;
            }
            self.remove_watcher(&name)?;
        }

        for config in desired {
            let name = config.name.clone();
            match self.watchers.get(&name) {
                Some(runtime) => {
                    let needs_respawn = config_requires_respawn(&runtime.config, &config);
                    let was_active = runtime.status == WatcherStatus::Active;
                    self.watchers.get_mut(&name).expect("just checked").config = config;
                    if needs_respawn && was_active {
                        self.restart_watcher(&name).await?;
                    }
                }
                None => {
                    let autostart = config.autostart;
                    self.declare_watcher(config);
                    if autostart {
                        self.start_watcher(&name).await?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Whether any field `WatcherOption::requires_respawn` would flag differs
/// between `old` and `new`, for the wholesale-replace reload path where there
/// is no single `WatcherOption` to ask.
fn config_requires_respawn(old: &WatcherConfig, new: &WatcherConfig) -> bool {
    old.cmd != new.cmd
        || old.args != new.args
        || old.executable != new.executable
        || old.uid != new.uid
        || old.gid != new.gid
        || old.env != new.env
        || old.working_dir != new.working_dir
        || old.rlimits != new.rlimits
        || old.stop_signal != new.stop_signal
        || old.shell != new.shell
        || old.copy_env != new.copy_env
        || old.copy_path != new.copy_path
}

fn apply_option(config: &mut WatcherConfig, opt: WatcherOption) {
    match opt {
        WatcherOption::Cmd(v) => config.cmd = v,
        WatcherOption::Args(v) => config.args = v,
        WatcherOption::Numprocesses(v) => config.numprocesses = v,
        WatcherOption::WorkingDir(v) => config.working_dir = v,
        WatcherOption::Uid(v) => config.uid = v,
        WatcherOption::Gid(v) => config.gid = v,
        WatcherOption::Env(v) => config.env = v,
        WatcherOption::Shell(v) => config.shell = v,
        WatcherOption::Executable(v) => config.executable = v,
        WatcherOption::StopSignal(v) => config.stop_signal = v,
        WatcherOption::StopChildren(v) => config.stop_children = v,
        WatcherOption::GracefulTimeout(v) => config.graceful_timeout = Duration::from_secs_f64(v),
        WatcherOption::WarmupDelay(v) => config.warmup_delay = Duration::from_secs_f64(v),
        WatcherOption::MaxRetry(v) => config.max_retry = v,
        WatcherOption::Respawn(v) => config.respawn = v,
        WatcherOption::Autostart(v) => config.autostart = v,
        WatcherOption::Singleton(v) => config.singleton = v,
        WatcherOption::CopyEnv(v) => config.copy_env = v,
        WatcherOption::CopyPath(v) => config.copy_path = v,
        WatcherOption::UseSockets(v) => config.use_sockets = v,
        WatcherOption::Rlimits(v) => config.rlimits = v,
        WatcherOption::Priority(v) => config.priority = v,
        WatcherOption::Extra { .. } => {}
    }
}

/// `StreamSink::Callback` names a plugin method, not a mechanism this crate
/// understands (same non-goal as per-plugin business logic dispatch) — fall
/// back to an in-memory ring rather than drop the lines or fail the spawn.
fn resolve_stream_callback(_target: &str) -> Arc<dyn Redirector> {
    Arc::new(crate::streams::RingRedirector::new(256))
}

/// Pump `reader` line-by-line into `redirector` until the pipe closes
/// (the child exited or closed the stream), on a blocking task since
/// `Redirector::write_line` isn't async.
fn spawn_line_pump<R>(reader: R, redirector: Arc<dyn Redirector>)
where
    R: std::io::Read + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        use std::io::BufRead;
        for line in std::io::BufReader::new(reader).lines().map_while(Result::ok) {
            redirector.write_line(&line);
        }
    });
}

#[cfg(test)]
#[path = "arbiter_tests.rs"]
mod tests;
