//! Record rendering: payloads, file records, and colorized console lines.
use std::error::Error as StdError;
use std::fmt;
use std::io::Write as _;
use std::panic::Location;

use serde::Serialize;

use crate::config::{DEBUG_CHANNEL, ERROR_CHANNEL, WARNING_CHANNEL};

/// Separator between the frames of a normalized error; the console renderer
/// puts each frame on its own line.
const FRAME_SEPARATOR: &str = "; ";

/// Message accepted by [`Logger::write`](super::Logger::write).
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Plain text, written unchanged.
    Text(String),
    /// A normalized error: the error and its causes joined by `"; "`.
    Error(String),
    /// A structured value, pretty-printed as JSON.
    Value(serde_json::Value),
}

impl Payload {
    /// Normalize an error and its [`source`](StdError::source) chain.
    #[must_use]
    pub fn error(err: &(dyn StdError + 'static)) -> Self {
        let mut parts = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            parts.push(cause.to_string());
            source = cause.source();
        }
        Self::Error(parts.join(FRAME_SEPARATOR))
    }

    /// Capture any serializable value.
    ///
    /// Values that fail to serialize degrade to a text description of the
    /// failure instead of being dropped.
    #[must_use]
    pub fn value<T: Serialize + ?Sized>(value: &T) -> Self {
        serde_json::to_value(value).map_or_else(
            |e| Self::Text(format!("<unserializable value: {e}>")),
            Self::Value,
        )
    }

    /// Render the payload as record text.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) | Self::Error(text) => text.clone(),
            Self::Value(serde_json::Value::String(text)) => text.clone(),
            Self::Value(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for Payload {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<&anyhow::Error> for Payload {
    fn from(err: &anyhow::Error) -> Self {
        let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
        Self::Error(chain.join(FRAME_SEPARATOR))
    }
}

impl From<anyhow::Error> for Payload {
    fn from(err: anyhow::Error) -> Self {
        Self::from(&err)
    }
}

impl From<std::io::Error> for Payload {
    fn from(err: std::io::Error) -> Self {
        Self::error(&err)
    }
}

/// Render one file record: `<timestamp>[\t[<pid>]]\t<message>\n`.
pub(super) fn render_record(timestamp: &str, pid: Option<u32>, message: &str) -> String {
    pid.map_or_else(
        || format!("{timestamp}\t{message}\n"),
        |pid| format!("{timestamp}\t[{pid}]\t{message}\n"),
    )
}

/// Source position shown under console `debug` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Origin<'a> {
    file: &'a str,
    line: u32,
    column: Option<u32>,
}

impl<'a> Origin<'a> {
    /// Take the position recorded in a tracing event's metadata, if any.
    pub(super) fn from_metadata(metadata: &'a tracing::Metadata<'a>) -> Option<Self> {
        Some(Self {
            file: metadata.file()?,
            line: metadata.line()?,
            column: None,
        })
    }
}

impl<'a> From<&'a Location<'a>> for Origin<'a> {
    fn from(location: &'a Location<'a>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: Some(location.column()),
        }
    }
}

impl fmt::Display for Origin<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)?;
        if let Some(column) = self.column {
            write!(f, ":{column}")?;
        }
        Ok(())
    }
}

/// ANSI SGR prefix for the built-in channels; custom channels are uncolored.
fn channel_color(channel: &str) -> Option<&'static str> {
    match channel {
        ERROR_CHANNEL => Some("\x1b[1;31m"),
        DEBUG_CHANNEL => Some("\x1b[1;32m"),
        WARNING_CHANNEL => Some("\x1b[1;33m"),
        _ => None,
    }
}

/// Render the console variant of a record.
///
/// The line terminator is dropped, frame separators become indented line
/// breaks, and the `debug` channel gains an `at <file>:<line>:<col>` line
/// pointing at the code that logged it.
pub(super) fn render_console(channel: &str, record: &str, origin: Option<Origin<'_>>) -> String {
    let line = record.strip_suffix('\n').unwrap_or(record);
    let mut text = line.replace(';', "\n ");
    if channel == DEBUG_CHANNEL
        && let Some(origin) = origin
    {
        text = format!("{text}\n  at {origin}");
    }
    if let Some(color) = channel_color(channel) {
        text = format!("{color}{text}\x1b[0m");
    }
    text
}

/// Echo a rendered console line to stdout.
pub(super) fn write_console(text: &str) {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{text}").ok();
}

/// Report a failure that prevents the logger from activating.
pub(super) fn report_failure(text: &str) {
    let mut err = std::io::stderr().lock();
    writeln!(err, "\x1b[1;31m{text}\x1b[0m").ok();
}
