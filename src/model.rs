//! Shared record types (used by the interception layer, the dispatcher and
//! the renderer).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The four intercepted console entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogKind {
    pub const ALL: [LogKind; 4] = [LogKind::Info, LogKind::Warn, LogKind::Error, LogKind::Debug];

    pub fn name(self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Warn => "warn",
            LogKind::Error => "error",
            LogKind::Debug => "debug",
        }
    }

    /// Glyph prefixed to plain-text entries in the panel.
    pub fn marker(self) -> &'static str {
        match self {
            LogKind::Info => "ℹ️",
            LogKind::Warn => "⚠️",
            LogKind::Error => "❌",
            LogKind::Debug => "🐛",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raised error as the page sees it: engine stack text plus the optional
/// positional fields some engines expose instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
    pub file_name: Option<String>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
}

impl ErrorObject {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_location(mut self, file_name: impl Into<String>, line: u32, column: u32) -> Self {
        self.file_name = Some(file_name.into());
        self.line_number = Some(line);
        self.column_number = Some(column);
        self
    }
}

/// `Name: message`, or whichever half is present.
impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.message.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.name, self.message),
            (false, true) => f.write_str(&self.name),
            (true, _) => f.write_str(&self.message),
        }
    }
}

/// One argument of a console call.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleArg {
    Text(String),
    Error(Arc<ErrorObject>),
    Value(serde_json::Value),
}

impl fmt::Display for ConsoleArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleArg::Text(text) => f.write_str(text),
            ConsoleArg::Error(err) => fmt::Display::fmt(err.as_ref(), f),
            ConsoleArg::Value(serde_json::Value::String(s)) => f.write_str(s),
            ConsoleArg::Value(value) => fmt::Display::fmt(value, f),
        }
    }
}

impl From<&str> for ConsoleArg {
    fn from(text: &str) -> Self {
        ConsoleArg::Text(text.to_string())
    }
}

impl From<String> for ConsoleArg {
    fn from(text: String) -> Self {
        ConsoleArg::Text(text)
    }
}

impl From<ErrorObject> for ConsoleArg {
    fn from(err: ErrorObject) -> Self {
        ConsoleArg::Error(Arc::new(err))
    }
}

impl From<Arc<ErrorObject>> for ConsoleArg {
    fn from(err: Arc<ErrorObject>) -> Self {
        ConsoleArg::Error(err)
    }
}

impl From<serde_json::Value> for ConsoleArg {
    fn from(value: serde_json::Value) -> Self {
        ConsoleArg::Value(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    /// Shared with the caller, so stack access always sees the original.
    Error(Arc<ErrorObject>),
}

/// A normalized console call.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub kind: LogKind,
    pub payload: Payload,
}

impl LogRecord {
    /// Error calls keep a leading error object by reference and otherwise
    /// take the first argument as text; the other kinds join every argument
    /// with a single space.
    pub fn from_call(kind: LogKind, args: &[ConsoleArg]) -> Self {
        let payload = match kind {
            LogKind::Error => match args.first() {
                Some(ConsoleArg::Error(err)) => Payload::Error(Arc::clone(err)),
                Some(arg) => Payload::Text(arg.to_string()),
                None => Payload::Text(String::new()),
            },
            _ => Payload::Text(
                args.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        };
        Self { kind, payload }
    }

    pub fn error_text(message: impl Into<String>) -> Self {
        Self {
            kind: LogKind::Error,
            payload: Payload::Text(message.into()),
        }
    }
}
