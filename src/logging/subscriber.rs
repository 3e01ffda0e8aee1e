//! Tracing integration: console formatter, channel layer, and initialisation.
use std::fmt::Write as _;

use super::format::{Origin, Payload};
use super::logger::Logger;
use crate::config::{DEBUG_CHANNEL, ERROR_CHANNEL, WARNING_CHANNEL};

/// Channel that receives `INFO` events unless configured otherwise.
pub const DEFAULT_INFO_CHANNEL: &str = "info";

/// Target prefix of this crate's own diagnostics.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Extracts the `message` field and renders the remaining fields as
/// `key=value` pairs.
#[derive(Default)]
struct MessageExtractor {
    message: String,
    fields: String,
}

impl MessageExtractor {
    fn push_field(&mut self, name: &str, value: &dyn std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        write!(self.fields, "{name}={value}").ok();
    }

    /// Message followed by its fields, if any.
    fn into_text(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), &format_args!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), &value);
        }
    }
}

/// Return `true` for targets emitted by this crate.
fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// A [`tracing_subscriber::Layer`] that forwards events into a [`Logger`].
///
/// Levels map onto the built-in channels: `ERROR` to `error`, `WARN` to
/// `warning`, `DEBUG` and `TRACE` to `debug`.  `INFO` events go to the
/// channel named by [`info_channel`](Self::info_channel) and are dropped if
/// that channel is not open.  Events from this crate are never forwarded.
#[derive(Debug, Clone)]
pub struct ChannelLayer {
    logger: Logger,
    info_channel: String,
}

impl ChannelLayer {
    /// Forward events into `logger`, sending `INFO` to [`DEFAULT_INFO_CHANNEL`].
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            info_channel: DEFAULT_INFO_CHANNEL.to_string(),
        }
    }

    /// Send `INFO` events to `channel` instead.
    #[must_use]
    pub fn info_channel(mut self, channel: impl Into<String>) -> Self {
        self.info_channel = channel.into();
        self
    }

    fn channel_for(&self, level: tracing::Level) -> &str {
        match level {
            tracing::Level::ERROR => ERROR_CHANNEL,
            tracing::Level::WARN => WARNING_CHANNEL,
            tracing::Level::INFO => &self.info_channel,
            _ => DEBUG_CHANNEL,
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for ChannelLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        if is_own_target(metadata.target()) || !self.logger.is_active() {
            return;
        }

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        self.logger.emit(
            self.channel_for(*metadata.level()),
            &Payload::Text(extractor.into_text()),
            Origin::from_metadata(metadata),
        );
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] for the binary's own
/// diagnostics.
struct DaylogFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for DaylogFormatter
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
        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = extractor.into_text();

        match *event.metadata().level() {
            tracing::Level::ERROR => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            tracing::Level::INFO => writeln!(writer, "\x1b[34mINFO\x1b[0m  {msg}"),
            _ => writeln!(writer, "\x1b[2mDEBUG {msg}\x1b[0m"),
        }
    }
}

/// Initialise the global [`tracing`] subscriber for the command-line tool.
///
/// Diagnostics go to stderr so that stdout carries only mirrored log
/// records.  The level is `warn`, or `debug` when `verbose` is set; a
/// `DAYLOG_LOG` filter directive in the environment overrides both.
/// Must be called once at program startup, before any logging.
pub fn init_subscriber(verbose: bool) {
    use tracing_subscriber::{
        EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
    };

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("DAYLOG_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer()
        .event_format(DaylogFormatter)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(console_layer).init();
}
