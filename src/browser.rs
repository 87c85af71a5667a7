//! Browser bindings for wasm32 builds with the `web` feature: page location,
//! the native console, new-window views and the global error event.

use std::sync::Arc;

use js_sys::{Array, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, ErrorEvent, Url};

use crate::config::PageLocation;
use crate::console::Console;
use crate::error::OverlayError;
use crate::model::{ConsoleArg, ErrorObject, LogKind};
use crate::overlay::{DebugOverlay, UncaughtError};
use crate::viewer::ViewOpener;

fn js_error(err: JsValue) -> OverlayError {
    OverlayError::Open(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

pub fn page_location() -> PageLocation {
    let location = web_sys::window().map(|w| w.location());
    let query = location
        .as_ref()
        .and_then(|l| l.search().ok())
        .unwrap_or_default();
    let origin = location
        .as_ref()
        .and_then(|l| l.origin().ok())
        .unwrap_or_default();
    PageLocation::new(query, &origin)
}

/// `window.console`, called with the original arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebConsole;

impl Console for WebConsole {
    fn log(&self, kind: LogKind, args: &[ConsoleArg]) {
        let values: Array = args.iter().map(|arg| JsValue::from_str(&arg.to_string())).collect();
        match kind {
            LogKind::Info => web_sys::console::info(&values),
            LogKind::Warn => web_sys::console::warn(&values),
            LogKind::Error => web_sys::console::error(&values),
            LogKind::Debug => web_sys::console::debug(&values),
        }
    }
}

/// Opens links and synthesized documents in a new window.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserOpener;

impl ViewOpener for BrowserOpener {
    fn open_url(&self, href: &str) -> Result<(), OverlayError> {
        let window = web_sys::window().ok_or_else(|| OverlayError::Open("no window".to_string()))?;
        window.open_with_url_and_target(href, "_blank").map_err(js_error)?;
        Ok(())
    }

    fn open_document(&self, html: &str, anchor: &str) -> Result<(), OverlayError> {
        let window = web_sys::window().ok_or_else(|| OverlayError::Open("no window".to_string()))?;
        let parts = Array::of1(&JsValue::from_str(html));
        let options = BlobPropertyBag::new();
        options.set_type("text/html;charset=utf-8");
        let blob = Blob::new_with_str_sequence_and_options(&parts, &options).map_err(js_error)?;
        let url = Url::create_object_url_with_blob(&blob).map_err(js_error)?;
        window
            .open_with_url_and_target(&format!("{url}#{anchor}"), "_blank")
            .map_err(js_error)?;
        Ok(())
    }
}

/// Reads the fields of a JS error value; `None` for non-objects.
pub fn error_from_js(value: &JsValue) -> Option<ErrorObject> {
    if !value.is_object() {
        return None;
    }
    let text = |key: &str| Reflect::get(value, &JsValue::from_str(key)).ok().and_then(|v| v.as_string());
    let number = |key: &str| {
        Reflect::get(value, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_f64())
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u32)
    };
    Some(ErrorObject {
        name: text("name").unwrap_or_default(),
        message: text("message").unwrap_or_default(),
        stack: text("stack"),
        file_name: text("fileName"),
        line_number: number("lineNumber"),
        column_number: number("columnNumber"),
    })
}

/// Routes `window` error events into `overlay`. The listener lives for the
/// rest of the page.
pub fn listen_for_uncaught(overlay: Arc<DebugOverlay>) -> Result<(), OverlayError> {
    let window = web_sys::window().ok_or_else(|| OverlayError::Open("no window".to_string()))?;
    let listener = Closure::<dyn FnMut(ErrorEvent)>::new(move |event: ErrorEvent| {
        let position = |n: u32| Some(n).filter(|n| *n >= 1);
        let filename = event.filename();
        overlay.record_uncaught(UncaughtError {
            message: event.message(),
            source: Some(filename).filter(|f| !f.is_empty()),
            line: position(event.lineno()),
            column: position(event.colno()),
            error: error_from_js(&event.error()).map(Arc::new),
        });
    });
    window
        .add_event_listener_with_callback("error", listener.as_ref().unchecked_ref())
        .map_err(js_error)?;
    listener.forget();
    Ok(())
}
