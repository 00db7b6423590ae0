//! Document file monitor — watches the previewed file and reports changes.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use notify::{RecursiveMode, Watcher};

/// Watches the previewed file's parent directory and calls `on_change` with
/// the file path whenever it is modified. Bursts of filesystem events are
/// drained within the debounce window so one save reports one change.
pub struct FileMonitor {
    shutdown_tx: mpsc::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl FileMonitor {
    /// Start watching `path` for changes. `on_change` returns `false` when
    /// the receiving event loop is gone, which stops the watcher thread.
    /// Returns `None` if the parent directory doesn't exist or the watcher
    /// can't be created.
    pub fn new<F>(path: &Path, debounce: Duration, on_change: F) -> Option<Self>
    where
        F: FnMut(PathBuf) -> bool + Send + 'static,
    {
        let file = path.to_path_buf();
        let parent = file.parent()?.to_path_buf();
        let parent = if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent
        };

        if !parent.exists() {
            log::warn!(
                "file_monitor: parent dir {} does not exist, skipping watch",
                parent.display()
            );
            return None;
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (notify_tx, notify_rx) = mpsc::channel();

        let mut watcher = match notify::recommended_watcher(notify_tx) {
            Ok(w) => w,
            Err(e) => {
                log::warn!("file_monitor: failed to create watcher: {e}");
                return None;
            }
        };

        if let Err(e) = watcher.watch(&parent, RecursiveMode::NonRecursive) {
            log::warn!("file_monitor: failed to watch {}: {e}", parent.display());
            return None;
        }

        log::info!("file_monitor: watching {}", file.display());

        let thread = std::thread::Builder::new()
            .name("doc-watcher".into())
            .spawn(move || {
                // Keep the watcher alive for the lifetime of this thread.
                let _watcher = watcher;
                Self::watch_loop(&file, debounce, on_change, &notify_rx, &shutdown_rx);
            })
            .ok()?;

        Some(Self {
            shutdown_tx,
            thread: Some(thread),
        })
    }

    fn watch_loop<F>(
        file: &Path,
        debounce: Duration,
        mut on_change: F,
        notify_rx: &mpsc::Receiver<Result<notify::Event, notify::Error>>,
        shutdown_rx: &mpsc::Receiver<()>,
    ) where
        F: FnMut(PathBuf) -> bool,
    {
        // Wake periodically so shutdown is honored even when the file
        // never changes.
        const POLL: Duration = Duration::from_millis(500);

        loop {
            if shutdown_rx.try_recv().is_ok() {
                return;
            }
            let event = match notify_rx.recv_timeout(POLL) {
                Ok(event) => event,
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => return,
            };

            // Check if the event concerns our file.
            let is_doc_event = match &event {
                Ok(ev) => ev.paths.iter().any(|p| p == file),
                Err(_) => false,
            };

            if !is_doc_event {
                continue;
            }

            // Debounce: drain any further events within the window.
            while notify_rx.recv_timeout(debounce).is_ok() {
                // Drain
            }

            // Check for shutdown after debounce.
            if shutdown_rx.try_recv().is_ok() {
                return;
            }

            log::debug!("file_monitor: {} changed", file.display());
            if !on_change(file.to_path_buf()) {
                // Receiving event loop closed.
                return;
            }
        }
    }

    /// Shut down the watcher thread.
    pub fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
