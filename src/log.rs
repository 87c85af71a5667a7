//! In-page entry log backing the debug panel. Append-only: entries are
//! never reordered, deduplicated or capped.

use std::sync::{Arc, Mutex, OnceLock};

use crate::error::OverlayError;
use crate::render::{PanelSink, RenderedEntry};

static ENTRY_LOG: OnceLock<Arc<EntryLog>> = OnceLock::new();

/// The page-wide log the panel renders from.
pub fn entry_log() -> Arc<EntryLog> {
    Arc::clone(ENTRY_LOG.get_or_init(|| Arc::new(EntryLog::default())))
}

type ReadyCallback = Box<dyn FnOnce() + Send>;
type Watcher = Box<dyn Fn(usize) + Send + Sync>;

enum Readiness {
    Pending(Vec<ReadyCallback>),
    Ready,
}

impl Default for Readiness {
    fn default() -> Self {
        Readiness::Pending(Vec::new())
    }
}

#[derive(Default)]
pub struct EntryLog {
    entries: Mutex<Vec<RenderedEntry>>,
    readiness: Mutex<Readiness>,
    watcher: Mutex<Option<Watcher>>,
}

impl EntryLog {
    /// Snapshot of current entries for display.
    pub fn snapshot(&self) -> Vec<RenderedEntry> {
        self.entries.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// User-initiated reset from the panel toolbar.
    pub fn clear(&self) {
        if let Ok(mut v) = self.entries.lock() {
            v.clear();
        }
        self.notify();
    }

    /// Called with the entry count after every change.
    pub fn watch(&self, watcher: impl Fn(usize) + Send + Sync + 'static) {
        if let Ok(mut slot) = self.watcher.lock() {
            *slot = Some(Box::new(watcher));
        }
    }

    /// Signals that the entry surface exists. Only the first call runs the
    /// pending callbacks.
    pub fn mark_ready(&self) {
        let callbacks = {
            let Ok(mut readiness) = self.readiness.lock() else {
                return;
            };
            match std::mem::replace(&mut *readiness, Readiness::Ready) {
                Readiness::Pending(callbacks) => callbacks,
                Readiness::Ready => return,
            }
        };
        for ready in callbacks {
            ready();
        }
    }

    pub fn is_ready(&self) -> bool {
        self.readiness
            .lock()
            .map(|r| matches!(*r, Readiness::Ready))
            .unwrap_or(false)
    }

    pub fn export_json(&self) -> Result<String, OverlayError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    fn notify(&self) {
        let count = self.len();
        if let Ok(watcher) = self.watcher.lock() {
            if let Some(watcher) = watcher.as_ref() {
                watcher(count);
            }
        }
    }
}

impl PanelSink for EntryLog {
    fn append_entry(&self, entry: RenderedEntry) {
        if let Ok(mut v) = self.entries.lock() {
            v.push(entry);
        }
        self.notify();
    }

    fn on_ready(&self, ready: Box<dyn FnOnce() + Send>) {
        let run_now = match self.readiness.lock() {
            Ok(mut readiness) => match &mut *readiness {
                Readiness::Pending(callbacks) => {
                    callbacks.push(ready);
                    None
                }
                Readiness::Ready => Some(ready),
            },
            Err(_) => None,
        };
        if let Some(ready) = run_now {
            ready();
        }
    }
}
