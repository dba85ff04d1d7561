#![forbid(unsafe_code)]

//! Tracing layer that writes events to the browser console.
//!
//! Each event becomes one line routed to `console.error`, `console.warn`,
//! `console.info`, or `console.debug` by level, so the browser's level
//! filter applies to pagekit output.
//!
//! ```no_run
//! use pagekit_web::console::{BrowserConsoleLayer, ConsoleSink};
//! use tracing_subscriber::prelude::*;
//!
//! let layer = BrowserConsoleLayer::new(ConsoleSink::Browser);
//! tracing_subscriber::registry().with(layer).init();
//! ```

use std::fmt::{self, Write as FmtWrite};
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;

// ============================================================================
// Sink
// ============================================================================

/// Browser console method an event is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMethod {
    Error,
    Warn,
    Info,
    Debug,
}

impl ConsoleMethod {
    /// `TRACE` shares `console.debug`; the console has no finer level.
    #[must_use]
    pub fn for_level(level: Level) -> Self {
        match level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Info,
            Level::DEBUG | Level::TRACE => Self::Debug,
        }
    }
}

/// One formatted console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub method: ConsoleMethod,
    pub text: String,
}

/// Where formatted lines go.
#[derive(Debug, Clone)]
pub enum ConsoleSink {
    /// The page's `console` object. Native builds write to stderr instead.
    Browser,
    /// In-memory buffer for tests.
    Capture(Arc<Mutex<Vec<ConsoleLine>>>),
}

impl ConsoleSink {
    #[must_use]
    pub fn capture() -> Self {
        Self::Capture(Arc::default())
    }

    /// Lines captured so far; empty for [`ConsoleSink::Browser`].
    #[must_use]
    pub fn captured(&self) -> Vec<ConsoleLine> {
        match self {
            Self::Browser => Vec::new(),
            Self::Capture(lines) => match lines.lock() {
                Ok(lines) => lines.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            },
        }
    }

    fn write(&self, line: ConsoleLine) {
        match self {
            Self::Browser => write_browser(&line),
            Self::Capture(lines) => {
                let mut lines = match lines.lock() {
                    Ok(lines) => lines,
                    Err(poisoned) => poisoned.into_inner(),
                };
                lines.push(line);
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn write_browser(line: &ConsoleLine) {
    let text = wasm_bindgen::JsValue::from_str(&line.text);
    match line.method {
        ConsoleMethod::Error => web_sys::console::error_1(&text),
        ConsoleMethod::Warn => web_sys::console::warn_1(&text),
        ConsoleMethod::Info => web_sys::console::info_1(&text),
        ConsoleMethod::Debug => web_sys::console::debug_1(&text),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn write_browser(line: &ConsoleLine) {
    eprintln!("{}", line.text);
}

// ============================================================================
// Event Visitor
// ============================================================================

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.fields.push((field.name(), rendered));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.fields.push((field.name(), value.to_owned()));
        }
    }
}

// ============================================================================
// BrowserConsoleLayer
// ============================================================================

/// A `tracing_subscriber::Layer` writing one console line per event.
#[derive(Debug, Clone)]
pub struct BrowserConsoleLayer {
    sink: ConsoleSink,
    show_target: bool,
    show_fields: bool,
}

impl BrowserConsoleLayer {
    #[must_use]
    pub fn new(sink: ConsoleSink) -> Self {
        Self {
            sink,
            show_target: true,
            show_fields: true,
        }
    }

    /// Builder: set whether to show the target module.
    #[must_use]
    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    /// Builder: set whether to show structured fields.
    #[must_use]
    pub fn show_fields(mut self, show: bool) -> Self {
        self.show_fields = show;
        self
    }

    fn format(&self, event: &Event<'_>) -> String {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut line = String::from("[pagekit] ");
        if self.show_target {
            let _ = write!(line, "{}: ", metadata.target());
        }
        line.push_str(visitor.message.as_deref().unwrap_or_default());
        if self.show_fields {
            for (name, value) in &visitor.fields {
                let _ = write!(line, " {name}={value}");
            }
        }
        line
    }
}

impl<S> Layer<S> for BrowserConsoleLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let method = ConsoleMethod::for_level(*event.metadata().level());
        self.sink.write(ConsoleLine {
            method,
            text: self.format(event),
        });
    }
}

/// Install a global subscriber writing to the browser console at `level`.
///
/// Returns `false` if a global subscriber was already set, which happens
/// when more than one `PageKit` is constructed on a page.
pub fn install(level: LevelFilter) -> bool {
    tracing_subscriber::registry()
        .with(BrowserConsoleLayer::new(ConsoleSink::Browser).with_filter(level))
        .try_init()
        .is_ok()
}
