use super::{ProcessAdapterError, ProcessAdapter, SpawnSpec, SpawnedProcess, WaitOutcome};
use async_trait::async_trait;
use nix::sys::signal::{self, Signal as NixSignal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid as NixPid;
use std::os::unix::process::CommandExt;
use std::process::Command;
use std::time::Duration;
use warden_core::{Pid, Rusage, Signal};

/// Real OS process control: fork+exec via `std::process::Command`, signals
/// via `libc::kill`, non-blocking reap via `libc::wait4`, resource usage and
/// descendant enumeration via `/proc` (through the `procfs` crate).
#[derive(Debug, Default)]
pub struct UnixProcessAdapter;

impl UnixProcessAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessAdapter for UnixProcessAdapter {
    async fn spawn(&self, spec: &SpawnSpec) -> Result<SpawnedProcess, ProcessAdapterError> {
        let (program, args) = spec
            .cmdline
            .split_first()
            .ok_or_else(|| ProcessAdapterError::SpawnFailed("empty cmdline".into()))?;

        let mut command = Command::new(program);
        command.args(args);
        command.env_clear();
        command.envs(&spec.env);
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        let uid = resolve_uid(spec.uid.as_deref())?;
        let gid = resolve_gid(spec.gid.as_deref())?;
        let rlimits = spec.rlimits.clone();
        let umask = spec.umask;
        let new_session = spec.new_session;
        let inherited_fds = spec.inherited_fds.clone();

        // SAFETY: the closure only calls async-signal-safe libc functions
        // (setsid, dup2/fcntl, setuid/setgid, setrlimit, umask) between fork
        // and exec, as required by `pre_exec`'s contract.
        unsafe {
            command.pre_exec(move || {
                if new_session && libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                // Hand the socket registrar's listening fds to the child on
                // sequential fds starting at 3, clearing close-on-exec so
                // they survive into the new image.
                for (i, fd) in inherited_fds.iter().enumerate() {
                    let target = 3 + i as i32;
                    if *fd != target && libc::dup2(*fd, target) == -1 {
                        return Err(std::io::Error::last_os_error());
                    }
                    let flags = libc::fcntl(target, libc::F_GETFD);
                    if flags == -1 {
                        return Err(std::io::Error::last_os_error());
                    }
                    if libc::fcntl(target, libc::F_SETFD, flags & !libc::FD_CLOEXEC) == -1 {
                        return Err(std::io::Error::last_os_error());
                    }
                }
                for (name, limit) in rlimits.iter() {
                    apply_rlimit(name, *limit)?;
                }
                if let Some(mask) = umask {
                    libc::umask(mask as libc::mode_t);
                }
                // Group before user: dropping uid first would forfeit the
                // permission needed to change gid.
                if let Some(gid) = gid {
                    if libc::setgid(gid) != 0 {
                        return Err(std::io::Error::last_os_error());
                    }
                }
                if let Some(uid) = uid {
                    if libc::setuid(uid) != 0 {
                        return Err(std::io::Error::last_os_error());
                    }
                }
                Ok(())
            });
        }

        command.stdin(std::process::Stdio::null());
        command.stdout(if spec.stdout_piped { std::process::Stdio::piped() } else { std::process::Stdio::inherit() });
        command.stderr(if spec.stderr_piped { std::process::Stdio::piped() } else { std::process::Stdio::inherit() });

        let mut child = command
            .spawn()
            .map_err(|e| ProcessAdapterError::SpawnFailed(e.to_string()))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        // We take over reaping ourselves via `try_wait`, so leak the
        // tokio/std Child handle rather than let its Drop impl race us.
        let pid = child.id() as i32;
        std::mem::forget(child);
        Ok(SpawnedProcess { pid: Pid(pid), stdout, stderr })
    }

    fn signal(&self, pid: Pid, signal: Signal) -> Result<(), ProcessAdapterError> {
        let nix_signal =
            NixSignal::try_from(signal.as_raw()).map_err(|e| {
                ProcessAdapterError::SignalFailed(format!("unsupported signal: {e}"))
            })?;
        match signal::kill(NixPid::from_raw(pid.0), nix_signal) {
            Ok(()) => Ok(()),
            Err(nix::errno::Errno::ESRCH) => Err(ProcessAdapterError::NoSuchProcess(pid.0)),
            Err(e) => Err(ProcessAdapterError::SignalFailed(e.to_string())),
        }
    }

    fn try_wait(&self, pid: Pid) -> Result<WaitOutcome, ProcessAdapterError> {
        match waitpid(NixPid::from_raw(pid.0), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => Ok(WaitOutcome::StillRunning),
            Ok(WaitStatus::Exited(_, code)) => Ok(WaitOutcome::Exited(code)),
            Ok(WaitStatus::Signaled(_, sig, _)) => Ok(WaitOutcome::Signaled(sig as i32)),
            Ok(_) => Ok(WaitOutcome::StillRunning),
            Err(nix::errno::Errno::ECHILD) => {
                // Already reaped elsewhere, or not our child — treat as gone.
                Ok(WaitOutcome::Exited(0))
            }
            Err(e) => Err(ProcessAdapterError::SignalFailed(e.to_string())),
        }
    }

    fn rusage(&self, pid: Pid) -> Result<Rusage, ProcessAdapterError> {
        let proc = procfs::process::Process::new(pid.0)
            .map_err(|_| ProcessAdapterError::NoSuchProcess(pid.0))?;
        let stat = proc
            .stat()
            .map_err(|e| ProcessAdapterError::SignalFailed(e.to_string()))?;
        let ticks_per_sec = procfs::ticks_per_second();
        let to_duration = |ticks: u64| Duration::from_secs_f64(ticks as f64 / ticks_per_sec as f64);
        Ok(Rusage {
            user_time: to_duration(stat.utime),
            system_time: to_duration(stat.stime),
            max_rss_kb: stat.rss_bytes().map(|b| b / 1024).unwrap_or(0),
        })
    }

    fn descendants(&self, pid: Pid) -> Vec<Pid> {
        let Ok(all) = procfs::process::all_processes() else {
            return Vec::new();
        };
        let mut children = Vec::new();
        for proc in all.flatten() {
            if let Ok(stat) = proc.stat() {
                if stat.ppid == pid.0 {
                    children.push(Pid(stat.pid));
                }
            }
        }
        children
    }
}

fn resolve_uid(name: Option<&str>) -> Result<Option<u32>, ProcessAdapterError> {
    let Some(name) = name else { return Ok(None) };
    if let Ok(uid) = name.parse::<u32>() {
        return Ok(Some(uid));
    }
    users::get_user_by_name(name)
        .map(|u| Some(u.uid()))
        .ok_or_else(|| ProcessAdapterError::UnknownUser(name.to_string()))
}

fn resolve_gid(name: Option<&str>) -> Result<Option<u32>, ProcessAdapterError> {
    let Some(name) = name else { return Ok(None) };
    if let Ok(gid) = name.parse::<u32>() {
        return Ok(Some(gid));
    }
    users::get_group_by_name(name)
        .map(|g| Some(g.gid()))
        .ok_or_else(|| ProcessAdapterError::UnknownGroup(name.to_string()))
}

/// Map a watcher's named rlimit (e.g. `"nofile"`, `"nproc"`) to the matching
/// `RLIMIT_*` constant and apply it via `setrlimit`. Unknown names are
/// rejected before spawn, not here, so this only sees valid names.
fn apply_rlimit(name: &str, value: i64) -> std::io::Result<()> {
    let resource = match name {
        "core" => libc::RLIMIT_CORE,
        "cpu" => libc::RLIMIT_CPU,
        "data" => libc::RLIMIT_DATA,
        "fsize" => libc::RLIMIT_FSIZE,
        "memlock" => libc::RLIMIT_MEMLOCK,
        "nofile" => libc::RLIMIT_NOFILE,
        "nproc" => libc::RLIMIT_NPROC,
        "rss" => libc::RLIMIT_RSS,
        "stack" => libc::RLIMIT_STACK,
        _ => return Ok(()),
    };
    let raw = if value == warden_core::RLIMIT_INFINITY {
        libc::RLIM_INFINITY
    } else {
        value as libc::rlim_t
    };
    let limit = libc::rlimit {
        rlim_cur: raw,
        rlim_max: raw,
    };
    let ret = unsafe { libc::setrlimit(resource, &limit) };
    if ret == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(test)]
#[path = "unix_tests.rs"]
mod tests;
