//! Failures raised inside the overlay. None of these ever reach host code:
//! [`crate::overlay::DebugOverlay`] turns them into reports instead.

use thiserror::Error;

use crate::model::LogKind;

#[derive(Debug, Error)]
pub enum OverlayError {
    /// An entry point could not be wrapped (e.g. the host sealed it).
    #[error("failed to intercept console.{kind}: {reason}")]
    Setup { kind: LogKind, reason: String },
    /// The source request completed with a non-success status.
    #[error("failed to fetch {url}: {status}")]
    Fetch { url: String, status: String },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to open source view: {0}")]
    Open(String),
    #[error("failed to export entries: {0}")]
    Export(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
