//! Event Rendering
//!
//! Formats each log event into one output line: optional group, stream,
//! timestamp and ingestion-time columns, then the message. When a field
//! query is configured, JSON-formatted messages are parsed and the extracted
//! field substitutes for the raw message.
//!
//! Stdout is written synchronously with a per-line flush. A broken pipe is
//! reported as its own error variant so the watch loop can shut down cleanly
//! instead of surfacing it as a failure.

#![warn(clippy::all, rust_2018_idioms)]

use std::io::{self, Write};

use chrono::{TimeZone, Utc};
use owo_colors::OwoColorize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::app::cloudwatch_logs::LogEvent;
use crate::app::errors::Error as AppError;

#[derive(Debug, Error)]
pub enum PrintError {
    /// The downstream consumer closed the output pipe. Clean shutdown, not
    /// a failure.
    #[error("output pipe closed")]
    ClosedPipe,

    #[error("failed to write log event: {0}")]
    Io(#[from] io::Error),

    #[error("field extraction failed: {reason}")]
    Extract { reason: String },
}

/// What to do when field extraction cannot produce a value for a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractPolicy {
    /// Fail the run.
    Strict,
    /// Print the raw message and keep going.
    #[default]
    Lenient,
}

/// Column and color toggles for the renderer.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub show_group: bool,
    pub show_stream: bool,
    pub show_timestamp: bool,
    pub show_ingestion_time: bool,
    pub color_enabled: bool,
    pub extract_policy: ExtractPolicy,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_group: true,
            show_stream: true,
            show_timestamp: false,
            show_ingestion_time: false,
            color_enabled: true,
            extract_policy: ExtractPolicy::default(),
        }
    }
}

/// A compiled field-extraction expression: dot-separated keys with optional
/// `[index]` array access, e.g. `log.records[0].message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldQuery {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

impl FieldQuery {
    pub fn compile(expression: &str) -> Result<Self, AppError> {
        let invalid = || AppError::InvalidFieldQuery(expression.to_string());

        if expression.trim().is_empty() {
            return Err(invalid());
        }

        let mut segments = Vec::new();
        for part in expression.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };

            if key.is_empty() {
                return Err(invalid());
            }
            segments.push(Segment::Key(key.to_string()));

            while !rest.is_empty() {
                let close = match rest.find(']') {
                    Some(pos) if rest.starts_with('[') => pos,
                    _ => return Err(invalid()),
                };
                let index: usize = rest[1..close].parse().map_err(|_| invalid())?;
                segments.push(Segment::Index(index));
                rest = &rest[close + 1..];
            }
        }

        Ok(Self { segments })
    }

    /// Walks the expression through `value`; `None` when any step misses.
    pub fn search<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for segment in &self.segments {
            current = match segment {
                Segment::Key(key) => current.get(key)?,
                Segment::Index(index) => current.get(index)?,
            };
        }
        Some(current)
    }
}

/// Formats events into output lines and writes them to stdout.
pub struct LogPrinter {
    group_name: String,
    max_stream_length: usize,
    options: RenderOptions,
    query: Option<FieldQuery>,
}

enum ColumnColor {
    Green,
    Cyan,
    Yellow,
    Blue,
}

impl LogPrinter {
    pub fn new(
        group_name: impl Into<String>,
        max_stream_length: usize,
        options: RenderOptions,
    ) -> Self {
        Self {
            group_name: group_name.into(),
            max_stream_length,
            options,
            query: None,
        }
    }

    pub fn with_query(mut self, query: FieldQuery) -> Self {
        self.query = Some(query);
        self
    }

    /// Assembles the output line for one event.
    pub fn format_event(&self, event: &LogEvent) -> Result<String, PrintError> {
        let mut columns = Vec::new();

        if self.options.show_group {
            columns.push(self.paint(&self.group_name, ColumnColor::Green));
        }

        if self.options.show_stream {
            // Pad before painting so ANSI codes don't count against width.
            let padded = format!(
                "{:<width$}",
                event.stream_name,
                width = self.max_stream_length
            );
            columns.push(self.paint(&padded, ColumnColor::Cyan));
        }

        if self.options.show_timestamp {
            columns.push(self.paint(&millis_to_iso(event.timestamp), ColumnColor::Yellow));
        }

        if self.options.show_ingestion_time {
            columns.push(self.paint(&millis_to_iso(event.ingestion_time), ColumnColor::Blue));
        }

        let message = self.render_message(event)?;
        columns.push(message.trim_end().to_string());

        Ok(columns.join(" "))
    }

    /// Formats and writes one event, flushing per line.
    pub fn print_event(&self, event: &LogEvent) -> Result<(), PrintError> {
        let line = self.format_event(event)?;

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", line)
            .and_then(|_| handle.flush())
            .map_err(|err| {
                if err.kind() == io::ErrorKind::BrokenPipe {
                    PrintError::ClosedPipe
                } else {
                    PrintError::Io(err)
                }
            })
    }

    fn render_message(&self, event: &LogEvent) -> Result<String, PrintError> {
        let Some(query) = &self.query else {
            return Ok(event.message.clone());
        };

        // Heuristic from the message body itself: only JSON objects qualify.
        if !event.message.starts_with('{') {
            return Ok(event.message.clone());
        }

        match serde_json::from_str::<Value>(&event.message) {
            Ok(parsed) => match query.search(&parsed) {
                Some(Value::String(text)) => Ok(text.clone()),
                Some(value) => Ok(value.to_string()),
                None => self.extraction_failed(event, "expression matched nothing"),
            },
            Err(err) => self.extraction_failed(event, &format!("message is not valid JSON: {}", err)),
        }
    }

    fn extraction_failed(&self, event: &LogEvent, reason: &str) -> Result<String, PrintError> {
        match self.options.extract_policy {
            ExtractPolicy::Strict => Err(PrintError::Extract {
                reason: reason.to_string(),
            }),
            ExtractPolicy::Lenient => {
                debug!(
                    event_id = %event.event_id,
                    reason,
                    "field extraction failed, printing raw message"
                );
                Ok(event.message.clone())
            }
        }
    }

    fn paint(&self, text: &str, color: ColumnColor) -> String {
        if !self.options.color_enabled {
            return text.to_string();
        }

        match color {
            ColumnColor::Green => text.green().to_string(),
            ColumnColor::Cyan => text.cyan().to_string(),
            ColumnColor::Yellow => text.yellow().to_string(),
            ColumnColor::Blue => text.blue().to_string(),
        }
    }
}

/// Epoch milliseconds to `YYYY-MM-DDTHH:MM:SS.mmmZ`.
fn millis_to_iso(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis) {
        chrono::LocalResult::Single(datetime) => {
            datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
        }
        _ => millis.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain_options() -> RenderOptions {
        RenderOptions {
            color_enabled: false,
            ..RenderOptions::default()
        }
    }

    fn event(message: &str) -> LogEvent {
        LogEvent::new("e-1", "web-1", 1_704_103_200_000, message)
    }

    #[test]
    fn test_default_columns_group_stream_message() {
        let printer = LogPrinter::new("app", 8, plain_options());

        let line = printer.format_event(&event("hello")).unwrap();
        assert_eq!(line, "app web-1    hello");
    }

    #[test]
    fn test_stream_padded_to_widest_selected_stream() {
        let printer = LogPrinter::new("app", 10, plain_options());

        let line = printer.format_event(&event("x")).unwrap();
        assert_eq!(line, "app web-1      x");
    }

    #[test]
    fn test_timestamp_column_iso_millis() {
        let options = RenderOptions {
            show_group: false,
            show_stream: false,
            show_timestamp: true,
            ..plain_options()
        };
        let printer = LogPrinter::new("app", 8, options);

        let line = printer.format_event(&event("hello")).unwrap();
        assert_eq!(line, "2024-01-01T10:00:00.000Z hello");
    }

    #[test]
    fn test_ingestion_time_column() {
        let options = RenderOptions {
            show_group: false,
            show_stream: false,
            show_ingestion_time: true,
            ..plain_options()
        };
        let printer = LogPrinter::new("app", 8, options);

        let event = event("hello").with_ingestion_time(1_704_103_201_500);
        let line = printer.format_event(&event).unwrap();
        assert_eq!(line, "2024-01-01T10:00:01.500Z hello");
    }

    #[test]
    fn test_message_trailing_whitespace_stripped() {
        let options = RenderOptions {
            show_group: false,
            show_stream: false,
            ..plain_options()
        };
        let printer = LogPrinter::new("app", 8, options);

        let line = printer.format_event(&event("hello\n")).unwrap();
        assert_eq!(line, "hello");
    }

    #[test]
    fn test_extraction_substitutes_string_field() {
        let options = RenderOptions {
            show_group: false,
            show_stream: false,
            ..plain_options()
        };
        let printer = LogPrinter::new("app", 8, options)
            .with_query(FieldQuery::compile("log.message").unwrap());

        let line = printer
            .format_event(&event(r#"{"log":{"message":"it broke"}}"#))
            .unwrap();
        assert_eq!(line, "it broke");
    }

    #[test]
    fn test_extraction_serializes_structured_result() {
        let options = RenderOptions {
            show_group: false,
            show_stream: false,
            ..plain_options()
        };
        let printer =
            LogPrinter::new("app", 8, options).with_query(FieldQuery::compile("log").unwrap());

        let line = printer
            .format_event(&event(r#"{"log":{"level":"error"}}"#))
            .unwrap();
        assert_eq!(line, r#"{"level":"error"}"#);
    }

    #[test]
    fn test_non_json_message_passes_through_untouched() {
        let options = RenderOptions {
            show_group: false,
            show_stream: false,
            ..plain_options()
        };
        let printer = LogPrinter::new("app", 8, options)
            .with_query(FieldQuery::compile("log.message").unwrap());

        let line = printer.format_event(&event("plain text line")).unwrap();
        assert_eq!(line, "plain text line");
    }

    #[test]
    fn test_lenient_policy_prints_raw_on_malformed_json() {
        let options = RenderOptions {
            show_group: false,
            show_stream: false,
            extract_policy: ExtractPolicy::Lenient,
            ..plain_options()
        };
        let printer = LogPrinter::new("app", 8, options)
            .with_query(FieldQuery::compile("log.message").unwrap());

        let line = printer.format_event(&event("{not json")).unwrap();
        assert_eq!(line, "{not json");
    }

    #[test]
    fn test_strict_policy_fails_on_malformed_json() {
        let options = RenderOptions {
            show_group: false,
            show_stream: false,
            extract_policy: ExtractPolicy::Strict,
            ..plain_options()
        };
        let printer = LogPrinter::new("app", 8, options)
            .with_query(FieldQuery::compile("log.message").unwrap());

        let err = printer.format_event(&event("{not json")).unwrap_err();
        assert!(matches!(err, PrintError::Extract { .. }));
    }

    #[test]
    fn test_field_query_index_access() {
        let query = FieldQuery::compile("records[1].id").unwrap();
        let value: Value =
            serde_json::from_str(r#"{"records":[{"id":"a"},{"id":"b"}]}"#).unwrap();

        assert_eq!(query.search(&value), Some(&Value::String("b".to_string())));
    }

    #[test]
    fn test_field_query_miss_returns_none() {
        let query = FieldQuery::compile("missing.path").unwrap();
        let value: Value = serde_json::from_str(r#"{"log":{}}"#).unwrap();

        assert_eq!(query.search(&value), None);
    }

    #[test]
    fn test_field_query_rejects_malformed_expressions() {
        assert!(FieldQuery::compile("").is_err());
        assert!(FieldQuery::compile("a..b").is_err());
        assert!(FieldQuery::compile("a[x]").is_err());
        assert!(FieldQuery::compile("a[1").is_err());
    }
}
