//! Opt-in diagnostic overlay: console interception with ordered buffering,
//! stack-trace parsing, and a line-highlighted remote source viewer.

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod browser;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod intercept;
pub mod log;
pub mod model;
pub mod overlay;
pub mod panel;
pub mod render;
pub mod stack;
pub mod viewer;

pub use config::{ActivationConfig, PageLocation};
pub use console::{Console, HostConsole};
pub use error::OverlayError;
pub use model::{ConsoleArg, ErrorObject, LogKind, LogRecord, Payload};
pub use overlay::{DebugOverlay, UncaughtError};
pub use stack::StackFrame;
