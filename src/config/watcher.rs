//! Configuration file watcher for hot reload.
//!
//! Polls the config file's modification time on an interval rather than
//! relying on platform notification APIs; a changed mtime fires the reload
//! callback. The callback runs on the watcher task and handles its own
//! failures; the watcher keeps polling regardless.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Default interval between mtime polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Watches one file and invokes a callback when its mtime changes.
///
/// `start` and `stop` are idempotent; `stop` wakes the task out of its
/// inter-poll sleep and joins it. The remembered mtime is kept across
/// stop/start cycles.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    /// Nanoseconds since the epoch; 0 means the file has not been seen.
    last_mtime: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl ConfigWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_mtime = Arc::new(AtomicU64::new(file_mtime(&path)));
        Self {
            path,
            poll_interval: DEFAULT_POLL_INTERVAL,
            last_mtime,
            running: Arc::new(AtomicBool::new(false)),
            stop_signal: Arc::new(Notify::new()),
            task: None,
        }
    }

    /// Override the poll interval (default 1000 ms).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the poll task. A second call while running is a no-op.
    pub fn start<F>(&mut self, on_change: F)
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("config watcher already running");
            return;
        }

        let path = self.path.clone();
        let interval = self.poll_interval;
        let running = self.running.clone();
        let stop_signal = self.stop_signal.clone();
        let last_mtime = self.last_mtime.clone();

        self.task = Some(tokio::spawn(async move {
            tracing::debug!(path = %path.display(), "config watcher started");
            while running.load(Ordering::SeqCst) {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop_signal.notified() => break,
                }

                let mtime = file_mtime(&path);
                if mtime != 0 && mtime != last_mtime.load(Ordering::SeqCst) {
                    tracing::info!(path = %path.display(), "config file changed");
                    last_mtime.store(mtime, Ordering::SeqCst);
                    on_change(&path);
                }
            }
            tracing::debug!("config watcher stopped");
        }));
    }

    /// Flag cancellation, wake the sleep and join the task. Idempotent.
    pub async fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.stop_signal.notify_one();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Last-modified time in nanoseconds since the epoch; 0 when the file
/// cannot be stat'ed.
fn file_mtime(path: &Path) -> u64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
