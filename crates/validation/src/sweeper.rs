// Path: crates/validation/src/sweeper.rs
//! Periodic eviction tasks with explicit shutdown.
//!
//! Ledgers evict lazily on access; the sweeper bounds memory between
//! accesses. It is a plain tokio task holding a shutdown receiver, never a
//! detached forever-loop: dropping the handle aborts, and
//! [`SweeperHandle::shutdown`] terminates it cleanly.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Signals the task and waits for it to exit.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Whether the task has already exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        // Last-resort cancellation when the owner forgets to shut down.
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Spawns a sweeper that invokes `sweep` every `interval` until shut down.
///
/// `sweep` returns the number of evicted entries, logged at debug level.
pub fn spawn(
    name: &'static str,
    interval: Duration,
    sweep: impl Fn() -> usize + Send + Sync + 'static,
) -> SweeperHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh component
        // is not swept at startup.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = sweep();
                    if evicted > 0 {
                        log::debug!("[{name}] swept {evicted} expired entries");
                    }
                }
                _ = shutdown_rx.changed() => {
                    log::debug!("[{name}] sweeper shutting down");
                    break;
                }
            }
        }
    });
    SweeperHandle {
        shutdown_tx,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn sweeps_periodically_and_stops_on_shutdown() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let handle = spawn("test", Duration::from_millis(10), move || {
            c.fetch_add(1, Ordering::SeqCst);
            1
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown().await;

        let after_shutdown = count.load(Ordering::SeqCst);
        assert!(after_shutdown >= 2);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_shutdown);
    }
}
