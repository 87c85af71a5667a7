//! Wraps the host's console entry points so each call is both passed
//! through unchanged and recorded.

use std::sync::Arc;

use crate::console::{Console, HostConsole};
use crate::dispatch::Dispatcher;
use crate::error::OverlayError;
use crate::model::{ConsoleArg, LogKind, LogRecord};

/// Installed in place of one entry point.
struct InterceptedEntry {
    original: Arc<dyn Console>,
    dispatcher: Arc<Dispatcher>,
}

impl Console for InterceptedEntry {
    fn log(&self, kind: LogKind, args: &[ConsoleArg]) {
        self.original.log(kind, args);
        self.dispatcher.dispatch(LogRecord::from_call(kind, args));
    }
}

/// Outcome of [`install`].
pub struct Interception {
    /// The error entry point as it was before installation.
    pub original_error: Arc<dyn Console>,
    pub installed: Vec<LogKind>,
    pub failures: Vec<OverlayError>,
}

/// Wraps every entry point of `host`. A slot that refuses replacement is
/// recorded in `failures` and the remaining slots are still wrapped.
pub fn install(host: &HostConsole, dispatcher: &Arc<Dispatcher>) -> Interception {
    let original_error = host
        .entry(LogKind::Error)
        .unwrap_or_else(crate::console::native_console);
    let mut installed = Vec::new();
    let mut failures = Vec::new();

    for kind in LogKind::ALL {
        let Some(original) = host.entry(kind) else {
            failures.push(OverlayError::Setup {
                kind,
                reason: "no such entry point".to_string(),
            });
            continue;
        };
        let wrapper = Arc::new(InterceptedEntry {
            original,
            dispatcher: Arc::clone(dispatcher),
        });
        match host.replace(kind, wrapper) {
            Ok(_) => installed.push(kind),
            Err(err) => failures.push(err),
        }
    }

    tracing::debug!(?installed, failed = failures.len(), "console interception installed");
    Interception {
        original_error,
        installed,
        failures,
    }
}
