use std::fmt::{self, Write as _};

use map_switcher_shared::config::LOG_PREFIX;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;
use wasm_bindgen::JsValue;

/// Route `tracing` events to the browser console.
///
/// Debug output is only shown when `debug_output` is set; warnings and errors
/// always are.
pub fn init(debug_output: bool) {
    let level = if debug_output {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let subscriber = Registry::default().with(level).with(ConsoleLayer);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        web_sys::console::warn_1(&format!("{LOG_PREFIX} logger already initialized").into());
    }
}

struct ConsoleLayer;

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let line = JsValue::from_str(&format_line(&visitor.message, &visitor.fields));
        match *event.metadata().level() {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::log_1(&line),
        }
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: Vec<(&'static str, String)>,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.fields.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            self.fields.push((field.name(), format!("{value:?}")));
        }
    }
}

fn format_line(message: &str, fields: &[(&'static str, String)]) -> String {
    let mut line = format!("{LOG_PREFIX} {message}");
    for (name, value) in fields {
        let _ = write!(line, " {name}={value}");
    }
    line
}
