//! Panel shell: the resizable on-page panel listing rendered entries.

use std::sync::Arc;

use dioxus::prelude::*;

use crate::log::EntryLog;
use crate::overlay::DebugOverlay;
use crate::render::{EntryBody, FrameRow, RenderedEntry};

const MIN_HEIGHT: f64 = 80.0;
const DEFAULT_HEIGHT: f64 = 240.0;

/// What the panel needs from the page: the overlay and the log it feeds.
#[derive(Clone)]
pub struct PanelHandle {
    pub overlay: Arc<DebugOverlay>,
    pub log: Arc<EntryLog>,
}

impl PartialEq for PanelHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.overlay, &other.overlay) && Arc::ptr_eq(&self.log, &other.log)
    }
}

#[component]
pub fn DebugPanel(handle: PanelHandle) -> Element {
    // Bumped by the log's watcher so appends re-render the panel.
    let generation = use_signal_sync(|| 0usize);
    let mut height = use_signal(|| DEFAULT_HEIGHT);
    // (pointer y, height) at drag start
    let mut drag = use_signal(|| None::<(f64, f64)>);
    let mut copied = use_signal(|| None::<String>);

    let log = Arc::clone(&handle.log);
    use_hook(move || {
        log.watch(move |_| {
            let mut generation = generation;
            let next = *generation.peek() + 1;
            generation.set(next);
        });
    });

    let log = Arc::clone(&handle.log);
    use_effect(move || log.mark_ready());

    let _ = generation();
    let entries = handle.log.snapshot();
    let count = entries.len();
    let log_for_clear = Arc::clone(&handle.log);
    let log_for_export = Arc::clone(&handle.log);

    rsx! {
        document::Stylesheet { href: asset!("/assets/panel.css") }

        div {
            class: "debug-panel",
            style: "height: {height}px;",
            onmousemove: move |evt| {
                if let Some((start_y, start_height)) = drag() {
                    let dy = start_y - evt.client_coordinates().y;
                    height.set((start_height + dy).max(MIN_HEIGHT));
                }
            },
            onmouseup: move |_| drag.set(None),
            onmouseleave: move |_| drag.set(None),

            div {
                class: "debug-panel-handle",
                onmousedown: move |evt| {
                    evt.prevent_default();
                    drag.set(Some((evt.client_coordinates().y, height())));
                },
            }
            div { class: "debug-panel-toolbar",
                span { class: "debug-panel-title", "Console ({count})" }
                button {
                    class: "debug-panel-button",
                    onclick: move |_| {
                        log_for_clear.clear();
                        copied.set(None);
                    },
                    "Clear"
                }
                button {
                    class: "debug-panel-button",
                    onclick: move |_| {
                        match log_for_export.export_json() {
                            Ok(json) => copied.set(Some(json)),
                            Err(err) => handle_export_error(&err),
                        }
                    },
                    "Copy JSON"
                }
            }
            {if let Some(json) = copied.read().as_ref() {
                rsx! {
                    textarea {
                        class: "debug-panel-export",
                        readonly: true,
                        value: "{json}",
                    }
                }
            } else {
                rsx! { }
            }}
            div { class: "debug-panel-entries",
                for (index, entry) in entries.into_iter().enumerate() {
                    EntryView { key: "{index}", entry, overlay: OverlayRef(Arc::clone(&handle.overlay)) }
                }
            }
        }
    }
}

fn handle_export_error(err: &crate::error::OverlayError) {
    tracing::warn!(%err, "entry export failed");
}

/// Overlay reference usable as a prop.
#[derive(Clone)]
pub struct OverlayRef(pub Arc<DebugOverlay>);

impl PartialEq for OverlayRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[component]
fn EntryView(entry: RenderedEntry, overlay: OverlayRef) -> Element {
    let kind_class = format!("debug-entry debug-entry-{}", entry.kind);
    match entry.body {
        EntryBody::Line { marker, text } => rsx! {
            div { class: "{kind_class}",
                span { class: "debug-entry-time", "{entry.time}" }
                span { class: "debug-entry-marker", "{marker}" }
                span { class: "debug-entry-text", "{text}" }
            }
        },
        EntryBody::Failure { title, frames } => rsx! {
            div { class: "{kind_class}",
                div {
                    span { class: "debug-entry-time", "{entry.time}" }
                    strong { class: "debug-entry-title", "{title}" }
                }
                table { class: "debug-frames",
                    for (index, frame) in frames.into_iter().enumerate() {
                        FrameLink { key: "{index}", frame, overlay: overlay.clone() }
                    }
                }
            }
        },
    }
}

#[component]
fn FrameLink(frame: FrameRow, overlay: OverlayRef) -> Element {
    let href = frame.link.href();
    let link = frame.link.clone();
    rsx! {
        tr {
            td { class: "debug-frame-fn", "{frame.function}" }
            td {
                a {
                    href: "{href}",
                    onclick: move |evt| {
                        evt.prevent_default();
                        let overlay = Arc::clone(&overlay.0);
                        let link = link.clone();
                        spawn(async move {
                            overlay.follow_link(&link).await;
                        });
                    },
                    "{frame.file}"
                }
            }
            td { class: "debug-frame-pos", "{frame.line}" }
            td { class: "debug-frame-pos", "{frame.column}" }
        }
    }
}
