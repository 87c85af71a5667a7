#![allow(non_snake_case)]

use std::sync::{Arc, OnceLock};

use dioxus::prelude::*;
use page_debug::console;
use page_debug::log::entry_log;
use page_debug::panel::{DebugPanel, PanelHandle};
use page_debug::viewer::default_opener;
use page_debug::{ActivationConfig, ConsoleArg, DebugOverlay, ErrorObject, PageLocation};

/// Set once before launch; `None` when the page was loaded without `debug=true`.
static PANEL: OnceLock<Option<PanelHandle>> = OnceLock::new();

// ============================================================================
// Entry & root component
// ============================================================================

fn main() {
    init_tracing();

    let location = PageLocation::current();
    let config = ActivationConfig::from_location(&location);
    let log = entry_log();
    let handle = DebugOverlay::install(config, &location, console::host(), log.clone(), default_opener())
        .map(|overlay| PanelHandle {
            overlay: Arc::new(overlay),
            log,
        });
    if let Some(handle) = &handle {
        listen_for_uncaught(handle);
    }
    let _ = PANEL.set(handle);

    dioxus::launch(App);
}

#[cfg(not(target_arch = "wasm32"))]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(target_arch = "wasm32")]
fn init_tracing() {}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
fn listen_for_uncaught(handle: &PanelHandle) {
    if let Err(err) = page_debug::browser::listen_for_uncaught(Arc::clone(&handle.overlay)) {
        handle.overlay.report_failure(&err);
    }
}

#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
fn listen_for_uncaught(_handle: &PanelHandle) {}

#[component]
fn App() -> Element {
    let mut clicks = use_signal(|| 0u32);
    let panel = PANEL.get().cloned().flatten();

    rsx! {
        div { class: "demo-page",
            h1 { "Debug overlay demo" }
            p { "Load with ?debug=true to mount the panel; add &link=true to open frame links natively." }
            p { "The console.error button's frames point at this page's own /index.html." }
            div { class: "demo-actions",
                button {
                    onclick: move |_| {
                        clicks += 1;
                        console::host().info(&["info click".into(), ConsoleArg::from(serde_json::json!(clicks()))]);
                    },
                    "console.info"
                }
                button {
                    onclick: move |_| console::host().warn(&["disk quota at".into(), "91%".into()]),
                    "console.warn"
                }
                button {
                    onclick: move |_| console::host().debug(&[serde_json::json!({ "route": "/orders", "cached": true }).into()]),
                    "console.debug"
                }
                button {
                    onclick: move |_| {
                        let error = ErrorObject::new("Error", "boom").with_stack(
                            "Error: boom\n    at handleClick (/index.html:10:5)\n    at dispatch (/index.html:2:1)",
                        );
                        console::host().error(&[error.into()]);
                    },
                    "console.error"
                }
            }
            {if let Some(handle) = panel {
                rsx! { DebugPanel { handle } }
            } else {
                rsx! { }
            }}
        }
    }
}
