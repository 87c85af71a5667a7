//! Puts the pieces together: gate, interception, buffering, rendering and
//! the source viewer.

use std::sync::Arc;

use crate::config::{ActivationConfig, PageLocation};
use crate::console::{Console, HostConsole};
use crate::dispatch::Dispatcher;
use crate::error::OverlayError;
use crate::intercept;
use crate::model::{ErrorObject, LogKind, LogRecord};
use crate::render::{PanelSink, Renderer, SourceLink};
use crate::viewer::{SourceViewer, ViewOpener};

/// A global uncaught-error report, as delivered by the page's error event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UncaughtError {
    pub message: String,
    pub source: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub error: Option<Arc<ErrorObject>>,
}

pub struct DebugOverlay {
    config: ActivationConfig,
    dispatcher: Arc<Dispatcher>,
    viewer: SourceViewer,
    original_error: Arc<dyn Console>,
}

impl DebugOverlay {
    /// Installs the overlay when `config` is active and returns `None`
    /// (leaving `host` and `panel` untouched) otherwise.
    ///
    /// Interception is wired immediately; records are buffered until
    /// `panel` reports ready. Entry points that refuse wrapping are
    /// reported once each and do not stop the rest of the install.
    pub fn install(
        config: ActivationConfig,
        location: &PageLocation,
        host: &HostConsole,
        panel: Arc<dyn PanelSink>,
        opener: Arc<dyn ViewOpener>,
    ) -> Option<Self> {
        if !config.active {
            return None;
        }
        Some(Self::install_with_viewer(
            config,
            location,
            host,
            panel,
            SourceViewer::new(opener),
        ))
    }

    pub(crate) fn install_with_viewer(
        config: ActivationConfig,
        location: &PageLocation,
        host: &HostConsole,
        panel: Arc<dyn PanelSink>,
        viewer: SourceViewer,
    ) -> Self {
        let renderer = Arc::new(Renderer::new(&config, location.origin.clone(), Arc::clone(&panel)));
        let dispatcher = Arc::new(Dispatcher::new(renderer));

        let interception = intercept::install(host, &dispatcher);
        let overlay = Self {
            config,
            dispatcher: Arc::clone(&dispatcher),
            viewer,
            original_error: interception.original_error,
        };
        for failure in &interception.failures {
            overlay.report_failure(failure);
        }

        panel.on_ready(Box::new(move || dispatcher.mark_ready()));
        tracing::info!(
            origin = %location.origin,
            native_links = config.open_links_natively,
            errors_only = config.errors_only,
            "debug overlay installed"
        );
        overlay
    }

    pub fn config(&self) -> &ActivationConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.dispatcher.is_ready()
    }

    /// Opens a frame link. Failures are reported, never returned.
    pub async fn follow_link(&self, link: &SourceLink) {
        if let Err(err) = self.viewer.open(link).await {
            self.report_failure(&err);
        }
    }

    /// Reports through the untouched error channel and as a panel entry.
    pub fn report_failure(&self, err: &OverlayError) {
        let message = err.to_string();
        tracing::warn!(error = %message, "debug overlay failure");
        self.original_error.error(&[message.clone().into()]);
        self.dispatcher.dispatch(LogRecord::error_text(message));
    }

    /// Records an uncaught error. Without an error object one is built
    /// from the report's fields so its location still yields a frame.
    pub fn record_uncaught(&self, report: UncaughtError) {
        let error = report.error.unwrap_or_else(|| {
            Arc::new(ErrorObject {
                name: "Uncaught".to_string(),
                message: report.message.clone(),
                stack: None,
                file_name: report.source.clone(),
                line_number: report.line,
                column_number: report.column,
            })
        });
        self.dispatcher
            .dispatch(LogRecord::from_call(LogKind::Error, &[error.into()]));
    }
}
