//! Turns records into panel entries.

use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::config::ActivationConfig;
use crate::dispatch::RecordSink;
use crate::model::{LogKind, LogRecord, Payload};
use crate::stack::{self, StackFrame};

/// The presentation layer the core talks to.
pub trait PanelSink: Send + Sync {
    fn append_entry(&self, entry: RenderedEntry);
    /// Runs `ready` once the entry surface exists (immediately if it does).
    fn on_ready(&self, ready: Box<dyn FnOnce() + Send>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Navigate straight to the file.
    Native,
    /// Fetch the file and open a rendered view of it.
    Fetch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLink {
    pub url: String,
    pub line: u32,
    pub column: u32,
    pub mode: LinkMode,
}

impl SourceLink {
    pub fn anchor(&self) -> String {
        format!("L{}", self.line)
    }

    pub fn href(&self) -> String {
        format!("{}#{}", self.url, self.anchor())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameRow {
    pub function: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub link: SourceLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntryBody {
    Line { marker: &'static str, text: String },
    Failure { title: String, frames: Vec<FrameRow> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEntry {
    pub kind: LogKind,
    pub time: String,
    pub body: EntryBody,
}

pub struct Renderer {
    origin: Url,
    link_mode: LinkMode,
    errors_only: bool,
    panel: Arc<dyn PanelSink>,
}

impl Renderer {
    pub fn new(config: &ActivationConfig, origin: Url, panel: Arc<dyn PanelSink>) -> Self {
        let link_mode = if config.open_links_natively {
            LinkMode::Native
        } else {
            LinkMode::Fetch
        };
        Self {
            origin,
            link_mode,
            errors_only: config.errors_only,
            panel,
        }
    }

    pub fn render(&self, record: &LogRecord) -> RenderedEntry {
        let body = match &record.payload {
            Payload::Error(error) => EntryBody::Failure {
                title: error.to_string(),
                frames: stack::parse_error(error, &self.origin)
                    .iter()
                    .map(|frame| self.frame_row(frame))
                    .collect(),
            },
            Payload::Text(text) => EntryBody::Line {
                marker: record.kind.marker(),
                text: text.clone(),
            },
        };
        RenderedEntry {
            kind: record.kind,
            time: chrono::Utc::now().format("%H:%M:%S%.3f").to_string(),
            body,
        }
    }

    fn frame_row(&self, frame: &StackFrame) -> FrameRow {
        FrameRow {
            function: frame.function_name.clone(),
            file: frame.display_file.clone(),
            line: frame.line,
            column: frame.column,
            link: SourceLink {
                url: frame.full_file_url.clone(),
                line: frame.line,
                column: frame.column,
                mode: self.link_mode,
            },
        }
    }
}

impl RecordSink for Renderer {
    fn accept(&self, record: LogRecord) {
        if self.errors_only && is_chatter(record.kind) {
            return;
        }
        self.panel.append_entry(self.render(&record));
    }
}

/// Kinds hidden by the errors-only view; debug and error always show.
fn is_chatter(kind: LogKind) -> bool {
    matches!(kind, LogKind::Info | LogKind::Warn)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::ErrorObject;
    use std::sync::Mutex;

    /// Panel stand-in that keeps entries and fires ready on demand.
    #[derive(Default)]
    pub(crate) struct FakePanel {
        pub entries: Mutex<Vec<RenderedEntry>>,
        ready: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
    }

    impl FakePanel {
        pub fn entries(&self) -> Vec<RenderedEntry> {
            self.entries.lock().unwrap().clone()
        }

        pub fn fire_ready(&self) {
            let callbacks = std::mem::take(&mut *self.ready.lock().unwrap());
            for ready in callbacks {
                ready();
            }
        }
    }

    impl PanelSink for FakePanel {
        fn append_entry(&self, entry: RenderedEntry) {
            self.entries.lock().unwrap().push(entry);
        }

        fn on_ready(&self, ready: Box<dyn FnOnce() + Send>) {
            self.ready.lock().unwrap().push(ready);
        }
    }

    fn renderer(query: &str) -> (Arc<FakePanel>, Renderer) {
        let panel = Arc::new(FakePanel::default());
        let config = ActivationConfig::from_query(query);
        let origin = Url::parse("https://app.test").unwrap();
        (panel.clone(), Renderer::new(&config, origin, panel))
    }

    fn boom() -> LogRecord {
        let error = ErrorObject::new("Error", "boom").with_stack("Error: boom\n    at foo (/app/script:10:5)");
        LogRecord::from_call(LogKind::Error, &[error.into()])
    }

    #[test]
    fn error_payload_renders_title_and_frame_rows() {
        let (_, renderer) = renderer("?debug=true");
        let entry = renderer.render(&boom());
        let EntryBody::Failure { title, frames } = entry.body else {
            panic!("expected failure entry");
        };
        assert_eq!(title, "Error: boom");
        assert_eq!(frames.len(), 1);
        let row = &frames[0];
        assert_eq!((row.function.as_str(), row.file.as_str(), row.line, row.column), ("foo", "script", 10, 5));
        assert_eq!(row.link.mode, LinkMode::Fetch);
        assert_eq!(row.link.href(), "https://app.test/app/script#L10");
    }

    #[test]
    fn link_flag_selects_native_mode() {
        let (_, renderer) = renderer("?debug=true&link=true");
        let EntryBody::Failure { frames, .. } = renderer.render(&boom()).body else {
            panic!("expected failure entry");
        };
        assert_eq!(frames[0].link.mode, LinkMode::Native);
    }

    #[test]
    fn text_payload_gets_kind_marker() {
        let (_, renderer) = renderer("?debug=true");
        let entry = renderer.render(&LogRecord::from_call(LogKind::Warn, &["careful".into()]));
        assert_eq!(
            entry.body,
            EntryBody::Line {
                marker: LogKind::Warn.marker(),
                text: "careful".to_string()
            }
        );
    }

    #[test]
    fn malformed_error_renders_empty_fields() {
        let (_, renderer) = renderer("?debug=true");
        let record = LogRecord::from_call(LogKind::Error, &[ErrorObject::default().with_stack("garbage").into()]);
        assert_eq!(
            renderer.render(&record).body,
            EntryBody::Failure {
                title: String::new(),
                frames: Vec::new()
            }
        );
    }

    #[test]
    fn errors_only_hides_info_and_warn() {
        let (panel, renderer) = renderer("?debug=true&errorsOnly=true");
        renderer.accept(LogRecord::from_call(LogKind::Info, &["hidden".into()]));
        renderer.accept(LogRecord::from_call(LogKind::Warn, &["hidden too".into()]));
        renderer.accept(LogRecord::from_call(LogKind::Debug, &["state dump".into()]));
        renderer.accept(LogRecord::error_text("shown"));
        let kinds: Vec<LogKind> = panel.entries().iter().map(|entry| entry.kind).collect();
        assert_eq!(kinds, [LogKind::Debug, LogKind::Error]);
    }
}
