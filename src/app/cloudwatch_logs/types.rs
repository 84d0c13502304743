//! Data types shared across the log retrieval core.

#![warn(clippy::all, rust_2018_idioms)]

use serde::{Deserialize, Serialize};

/// Inclusive query window in epoch milliseconds; an absent bound leaves that
/// side unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl QueryWindow {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }
}

/// A single filtered log event.
///
/// `event_id` is unique per distinct event, but the service may surface the
/// same event on adjacent pages when interleaving streams; dedup keys on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub event_id: String,
    pub stream_name: String,
    /// Event timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Time the service ingested the event (Unix milliseconds)
    pub ingestion_time: i64,
    pub message: String,
}

impl LogEvent {
    pub fn new(
        event_id: impl Into<String>,
        stream_name: impl Into<String>,
        timestamp: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            stream_name: stream_name.into(),
            timestamp,
            ingestion_time: timestamp,
            message: message.into(),
        }
    }

    /// Sets an ingestion time distinct from the event timestamp.
    pub fn with_ingestion_time(mut self, ingestion_time: i64) -> Self {
        self.ingestion_time = ingestion_time;
        self
    }
}

/// One page of filter results: a bounded batch of events plus a continuation
/// token when more pages exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub events: Vec<LogEvent>,
    pub next_token: Option<String>,
}

/// Immutable parameters of one filter query, shared by every page fetch of a
/// single invocation.
#[derive(Debug, Clone)]
pub struct FilterRequest {
    pub group_name: String,
    /// Streams to interleave, in selection order; empty queries the whole group.
    pub stream_names: Vec<String>,
    pub window: QueryWindow,
    /// CloudWatch Logs filter pattern applied server-side.
    pub filter_pattern: Option<String>,
}

impl FilterRequest {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            stream_names: Vec::new(),
            window: QueryWindow::default(),
            filter_pattern: None,
        }
    }

    pub fn with_streams(mut self, streams: Vec<String>) -> Self {
        self.stream_names = streams;
        self
    }

    pub fn with_window(mut self, window: QueryWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_filter_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.filter_pattern = Some(pattern.into());
        self
    }
}

/// Stream metadata as `DescribeLogStreams` reports it. Event-time bounds are
/// absent on streams that never received an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    pub stream_name: String,
    pub first_event_time: Option<i64>,
    pub last_event_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_request_builder() {
        let request = FilterRequest::new("app")
            .with_streams(vec!["web-1".to_string()])
            .with_window(QueryWindow::new(Some(1), None))
            .with_filter_pattern("ERROR");

        assert_eq!(request.group_name, "app");
        assert_eq!(request.stream_names, vec!["web-1"]);
        assert_eq!(request.window.start, Some(1));
        assert_eq!(request.window.end, None);
        assert_eq!(request.filter_pattern.as_deref(), Some("ERROR"));
    }

    #[test]
    fn test_log_event_defaults_ingestion_to_timestamp() {
        let event = LogEvent::new("e-1", "s-1", 1000, "msg");
        assert_eq!(event.ingestion_time, event.timestamp);
    }

    #[test]
    fn test_log_event_serialization() {
        let event = LogEvent::new("e-1", "s-1", 1000, "msg").with_ingestion_time(1002);

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("e-1"));

        let back: LogEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
