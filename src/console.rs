//! Console entry points and the host registry that owns them.
//!
//! Host code logs through a [`HostConsole`] instead of a global object; the
//! overlay installs itself by replacing the registry's slots.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use crate::error::OverlayError;
use crate::model::{ConsoleArg, LogKind};

/// One implementation of the four console entry points.
pub trait Console: Send + Sync {
    fn log(&self, kind: LogKind, args: &[ConsoleArg]);

    fn info(&self, args: &[ConsoleArg]) {
        self.log(LogKind::Info, args);
    }

    fn warn(&self, args: &[ConsoleArg]) {
        self.log(LogKind::Warn, args);
    }

    fn error(&self, args: &[ConsoleArg]) {
        self.log(LogKind::Error, args);
    }

    fn debug(&self, args: &[ConsoleArg]) {
        self.log(LogKind::Debug, args);
    }
}

/// Native "original" console: every call becomes a `tracing` event on the
/// `console` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl Console for TracingConsole {
    fn log(&self, kind: LogKind, args: &[ConsoleArg]) {
        let message = join_args(args);
        match kind {
            LogKind::Info => tracing::info!(target: "console", "{message}"),
            LogKind::Warn => tracing::warn!(target: "console", "{message}"),
            LogKind::Error => tracing::error!(target: "console", "{message}"),
            LogKind::Debug => tracing::debug!(target: "console", "{message}"),
        }
    }
}

pub(crate) fn join_args(args: &[ConsoleArg]) -> String {
    args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

struct Slot {
    entry: Arc<dyn Console>,
    sealed: bool,
}

/// The page's console: one replaceable entry per log kind.
pub struct HostConsole {
    slots: RwLock<HashMap<LogKind, Slot>>,
}

impl HostConsole {
    /// Every slot starts out pointing at `native`.
    pub fn new(native: Arc<dyn Console>) -> Self {
        let slots = LogKind::ALL
            .into_iter()
            .map(|kind| {
                let slot = Slot {
                    entry: Arc::clone(&native),
                    sealed: false,
                };
                (kind, slot)
            })
            .collect();
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Makes `kind` non-reassignable; later [`HostConsole::replace`] calls fail.
    pub fn seal(&self, kind: LogKind) {
        if let Ok(mut slots) = self.slots.write() {
            if let Some(slot) = slots.get_mut(&kind) {
                slot.sealed = true;
            }
        }
    }

    /// Current entry for `kind`.
    pub fn entry(&self, kind: LogKind) -> Option<Arc<dyn Console>> {
        let slots = self.slots.read().ok()?;
        slots.get(&kind).map(|slot| Arc::clone(&slot.entry))
    }

    /// Installs `entry` for `kind` and returns the one it replaced.
    pub fn replace(&self, kind: LogKind, entry: Arc<dyn Console>) -> Result<Arc<dyn Console>, OverlayError> {
        let mut slots = self.slots.write().map_err(|_| OverlayError::Setup {
            kind,
            reason: "console registry is poisoned".to_string(),
        })?;
        let slot = slots.get_mut(&kind).ok_or_else(|| OverlayError::Setup {
            kind,
            reason: "no such entry point".to_string(),
        })?;
        if slot.sealed {
            return Err(OverlayError::Setup {
                kind,
                reason: "entry point is not reassignable".to_string(),
            });
        }
        Ok(std::mem::replace(&mut slot.entry, entry))
    }

    pub fn call(&self, kind: LogKind, args: &[ConsoleArg]) {
        // Entry runs outside the lock so it may log again.
        if let Some(entry) = self.entry(kind) {
            entry.log(kind, args);
        }
    }

    pub fn info(&self, args: &[ConsoleArg]) {
        self.call(LogKind::Info, args);
    }

    pub fn warn(&self, args: &[ConsoleArg]) {
        self.call(LogKind::Warn, args);
    }

    pub fn error(&self, args: &[ConsoleArg]) {
        self.call(LogKind::Error, args);
    }

    pub fn debug(&self, args: &[ConsoleArg]) {
        self.call(LogKind::Debug, args);
    }
}

static HOST: LazyLock<HostConsole> = LazyLock::new(|| HostConsole::new(native_console()));

/// Process-wide console for applications that do not build their own.
pub fn host() -> &'static HostConsole {
    &HOST
}

/// The platform's own console implementation.
pub fn native_console() -> Arc<dyn Console> {
    #[cfg(all(feature = "web", target_arch = "wasm32"))]
    {
        Arc::new(crate::browser::WebConsole)
    }
    #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
    {
        Arc::new(TracingConsole)
    }
}
