//! Tracing subscriber setup and console formatting.
//!
//! Everything goes to stderr; stdout is reserved for the JSON result record.
//! Events on the [`STAGE`] target render as `==>` headings and events on the
//! [`DRY_RUN`] target carry a `[DRY RUN]` marker.

use std::io::IsTerminal as _;

/// Target for top-level progress headings.
pub const STAGE: &str = "firefox_profiles::stage";

/// Target for actions that were skipped because of `--dry-run`.
pub const DRY_RUN: &str = "firefox_profiles::dry_run";

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that renders one line per event.
#[derive(Debug, Clone, Copy)]
struct ConsoleFormatter {
    ansi: bool,
}

impl ConsoleFormatter {
    fn paint(self, code: &str, text: &str) -> String {
        if self.ansi {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = &extractor.message;

        match level {
            tracing::Level::ERROR => writeln!(writer, "{} {msg}", self.paint("31", "ERROR")),
            tracing::Level::WARN => writeln!(writer, "{}  {msg}", self.paint("33", "WARN")),
            tracing::Level::INFO if target == STAGE => {
                writeln!(writer, "{} {}", self.paint("1;34", "==>"), self.paint("1", msg))
            }
            tracing::Level::INFO if target == DRY_RUN => {
                writeln!(writer, "  {} {msg}", self.paint("33", "[DRY RUN]"))
            }
            tracing::Level::INFO => writeln!(writer, "  {msg}"),
            _ => writeln!(writer, "  {}", self.paint("2", msg)),
        }
    }
}

/// Build the filter: `RUST_LOG` when set, otherwise `debug` or `info`.
fn env_filter(verbose: bool) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if verbose { "debug" } else { "info" })
    })
}

/// Initialise the global [`tracing`] subscriber.
///
/// Must be called once at program startup, before any logging.
pub fn init_subscriber(verbose: bool) {
    use tracing_subscriber::{Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter {
            ansi: std::io::stderr().is_terminal(),
        })
        .with_writer(std::io::stderr)
        .with_filter(env_filter(verbose));

    tracing_subscriber::registry().with(console_layer).init();
}
