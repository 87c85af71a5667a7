//! Remote source viewer: fetches a frame's file and opens a standalone,
//! line-numbered view of it positioned at the failing line.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::header::CONTENT_TYPE;

use crate::error::OverlayError;
use crate::render::{LinkMode, SourceLink};

/// A fetched body after content-type dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceBody {
    /// HTML, CSS, scripts and other text, verbatim.
    Text(String),
    /// JSON re-indented with two spaces.
    Json(String),
    /// Images as a self-contained `data:` URL.
    Image { data_url: String },
    /// Anything else; never rendered as text.
    Opaque { content_type: String, len: usize },
}

impl SourceBody {
    pub fn decode(content_type: Option<&str>, bytes: &[u8]) -> Self {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if matches!(mime.as_str(), "application/json" | "text/json") || mime.ends_with("+json") {
            return match serde_json::from_slice::<serde_json::Value>(bytes)
                .and_then(|value| serde_json::to_string_pretty(&value))
            {
                Ok(pretty) => SourceBody::Json(pretty),
                Err(_) => SourceBody::Text(String::from_utf8_lossy(bytes).into_owned()),
            };
        }
        if mime.starts_with("image/") {
            return SourceBody::Image {
                data_url: format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
            };
        }
        if is_text(&mime) {
            return SourceBody::Text(String::from_utf8_lossy(bytes).into_owned());
        }
        SourceBody::Opaque {
            content_type: mime,
            len: bytes.len(),
        }
    }
}

fn is_text(mime: &str) -> bool {
    mime.starts_with("text/")
        || mime.ends_with("+xml")
        || matches!(
            mime,
            "application/javascript"
                | "application/x-javascript"
                | "application/ecmascript"
                | "application/xml"
                | "application/xhtml+xml"
        )
}

fn escape(text: &str) -> String {
    v_htmlescape::escape(text).to_string()
}

const VIEW_STYLE: &str = "\
:root { color-scheme: light dark; --bg: #ffffff; --fg: #1f2328; --muted: #8c959f; --hit: #fff8c5; --mark: #ffd33d; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #0d1117; --fg: #e6edf3; --muted: #6e7681; --hit: #3b2e00; --mark: #9e6a03; }
}
body { margin: 0; background: var(--bg); color: var(--fg); font: 13px/1.5 ui-monospace, monospace; }
header { padding: 8px 12px; border-bottom: 1px solid var(--muted); word-break: break-all; }
.line { display: flex; white-space: pre; }
.line .ln { min-width: 4em; padding-right: 1em; text-align: right; color: var(--muted); user-select: none; }
.line.hit { background: var(--hit); }
.line.hit mark { background: var(--mark); color: inherit; }
.opaque { padding: 12px; color: var(--muted); }
";

/// Builds the standalone view document. Every piece of fetched text is
/// HTML-escaped; each source line gets an `L<n>` anchor and the target
/// line is highlighted with its column marked.
pub fn render_source_view(url: &str, body: &SourceBody, line: u32, column: u32) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"color-scheme\" content=\"light dark\">\n");
    html.push_str(&format!("<title>{}:{}</title>\n", escape(url), line));
    html.push_str(&format!("<style>\n{VIEW_STYLE}</style>\n</head>\n<body>\n"));
    html.push_str(&format!("<header>{}:{}:{}</header>\n<main>\n", escape(url), line, column));

    match body {
        SourceBody::Text(text) | SourceBody::Json(text) => {
            for (index, source) in text.lines().enumerate() {
                let n = index + 1;
                let hit = n == line as usize;
                let code = if hit { mark_column(source, column) } else { escape(source) };
                html.push_str(&format!(
                    "<div class=\"line{}\" id=\"L{n}\"><span class=\"ln\">{n}</span><code>{code}</code></div>\n",
                    if hit { " hit" } else { "" },
                ));
            }
        }
        SourceBody::Image { data_url } => {
            html.push_str(&format!(
                "<div class=\"line hit\" id=\"L{line}\"><img src=\"{}\" alt=\"{}\"></div>\n",
                escape(data_url),
                escape(url)
            ));
        }
        SourceBody::Opaque { content_type, len } => {
            let content_type = if content_type.is_empty() { "unknown content type" } else { content_type.as_str() };
            html.push_str(&format!(
                "<p class=\"opaque\" id=\"L{line}\">{} ({len} bytes) is not viewable as text</p>\n",
                escape(content_type)
            ));
        }
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn mark_column(source: &str, column: u32) -> String {
    let index = (column as usize).saturating_sub(1);
    match source.char_indices().nth(index) {
        Some((start, ch)) => {
            let end = start + ch.len_utf8();
            format!(
                "{}<mark>{}</mark>{}",
                escape(&source[..start]),
                escape(&source[start..end]),
                escape(&source[end..])
            )
        }
        None => escape(source),
    }
}

/// Opens results in a new top-level view.
pub trait ViewOpener: Send + Sync {
    /// Navigates to `href` without fetching anything.
    fn open_url(&self, href: &str) -> Result<(), OverlayError>;
    /// Shows a synthesized document scrolled to `#anchor`.
    fn open_document(&self, html: &str, anchor: &str) -> Result<(), OverlayError>;
}

/// Native opener: documents are written as HTML files and their location
/// logged.
#[cfg(not(target_arch = "wasm32"))]
pub struct FileOpener {
    dir: std::path::PathBuf,
    written: std::sync::atomic::AtomicUsize,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileOpener {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// User cache directory, or the temp dir when there is none.
    pub fn in_cache_dir() -> Self {
        let dir = directories::ProjectDirs::from("dev", "PageDebug", "page-debug")
            .map(|dirs| dirs.cache_dir().join("views"))
            .unwrap_or_else(|| std::env::temp_dir().join("page-debug-views"));
        Self::new(dir)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ViewOpener for FileOpener {
    fn open_url(&self, href: &str) -> Result<(), OverlayError> {
        tracing::info!(%href, "open source link");
        Ok(())
    }

    fn open_document(&self, html: &str, anchor: &str) -> Result<(), OverlayError> {
        std::fs::create_dir_all(&self.dir)?;
        let n = self.written.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S%.3f");
        let path = self.dir.join(format!("source-{stamp}-{n}.html"));
        std::fs::write(&path, html)?;
        tracing::info!(location = %format!("file://{}#{anchor}", path.display()), "source view written");
        Ok(())
    }
}

/// The opener for the current platform.
pub fn default_opener() -> Arc<dyn ViewOpener> {
    #[cfg(all(feature = "web", target_arch = "wasm32"))]
    {
        Arc::new(crate::browser::BrowserOpener)
    }
    #[cfg(all(not(feature = "web"), target_arch = "wasm32"))]
    {
        Arc::new(NullOpener)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Arc::new(FileOpener::in_cache_dir())
    }
}

#[cfg(all(not(feature = "web"), target_arch = "wasm32"))]
struct NullOpener;

#[cfg(all(not(feature = "web"), target_arch = "wasm32"))]
impl ViewOpener for NullOpener {
    fn open_url(&self, _href: &str) -> Result<(), OverlayError> {
        Err(OverlayError::Open("no browser bindings in this build".to_string()))
    }

    fn open_document(&self, _html: &str, _anchor: &str) -> Result<(), OverlayError> {
        Err(OverlayError::Open("no browser bindings in this build".to_string()))
    }
}

pub struct SourceViewer {
    client: reqwest::Client,
    opener: Arc<dyn ViewOpener>,
}

impl SourceViewer {
    pub fn new(opener: Arc<dyn ViewOpener>) -> Self {
        Self::with_client(reqwest::Client::new(), opener)
    }

    pub fn with_client(client: reqwest::Client, opener: Arc<dyn ViewOpener>) -> Self {
        Self { client, opener }
    }

    /// Follows a frame link: native links navigate directly; fetch links
    /// issue one request and open the rendered view. Nothing is opened when
    /// the request fails or returns a non-success status.
    pub async fn open(&self, link: &SourceLink) -> Result<(), OverlayError> {
        if link.mode == LinkMode::Native {
            return self.opener.open_url(&link.href());
        }

        let response = self
            .client
            .get(&link.url)
            .send()
            .await
            .map_err(|source| OverlayError::Request {
                url: link.url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(OverlayError::Fetch {
                url: link.url.clone(),
                status: status.to_string(),
            });
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|source| OverlayError::Request {
            url: link.url.clone(),
            source,
        })?;
        tracing::debug!(url = %link.url, %status, ?content_type, len = bytes.len(), "fetched source");

        let body = SourceBody::decode(content_type.as_deref(), &bytes);
        let html = render_source_view(&link.url, &body, link.line, link.column);
        self.opener.open_document(&html, &link.anchor())
    }
}
