//! Redirecting a replica's stdout/stderr to its configured `StreamSink`.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use warden_core::StreamSink;

/// A line-based sink a child's output stream is redirected into.
pub trait Redirector: Send + Sync + 'static {
    fn write_line(&self, line: &str);
}

pub struct FileRedirector {
    file: Mutex<std::fs::File>,
}

impl FileRedirector {
    pub fn open(path: &std::path::Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Mutex::new(file) })
    }
}

impl Redirector for FileRedirector {
    fn write_line(&self, line: &str) {
        let mut file = self.file.lock();
        let _ = writeln!(file, "{line}");
    }
}

/// Bounded in-memory ring of recent lines, readable by Controller clients
/// via a future `tail` command.
#[derive(Clone, Default)]
pub struct RingRedirector {
    inner: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl RingRedirector {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().iter().cloned().collect()
    }
}

impl Redirector for RingRedirector {
    fn write_line(&self, line: &str) {
        let mut buf = self.inner.lock();
        if buf.len() >= self.capacity {
            buf.pop_front();
        }
        buf.push_back(line.to_string());
    }
}

pub struct CallbackRedirector<F: Fn(&str) + Send + Sync + 'static> {
    callback: F,
}

impl<F: Fn(&str) + Send + Sync + 'static> CallbackRedirector<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: Fn(&str) + Send + Sync + 'static> Redirector for CallbackRedirector<F> {
    fn write_line(&self, line: &str) {
        (self.callback)(line)
    }
}

/// Build the `Redirector` a `StreamSink` describes. `Callback` sinks resolve
/// through a user-supplied lookup since their target names a plugin method,
/// not a mechanism this crate understands.
pub fn build_redirector(
    sink: &StreamSink,
    resolve_callback: &dyn Fn(&str) -> Arc<dyn Redirector>,
) -> std::io::Result<Arc<dyn Redirector>> {
    match sink {
        StreamSink::File { path } => Ok(Arc::new(FileRedirector::open(path)?)),
        StreamSink::Ring { capacity } => Ok(Arc::new(RingRedirector::new(*capacity))),
        StreamSink::Callback { target } => Ok(resolve_callback(target)),
    }
}

#[cfg(test)]
#[path = "streams_tests.rs"]
mod tests;
