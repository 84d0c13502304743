//! CloudWatch Logs Retrieval Core
//!
//! Drives paginated `FilterLogEvents` queries against one log group,
//! deduplicates events across pages, and supports indefinite tailing.
//!
//! ## Features
//!
//! - Stream selection by prefix with query-window intersection
//! - Paginated filtering with interleaved multi-stream results
//! - Duplicate suppression through a bounded recency window
//! - One-shot and watch-mode iteration with clean cancellation
//!
//! The service's interleaved mode trades strict ordering for completeness
//! across streams, which re-surfaces events at page boundaries. The fetcher
//! absorbs that with a FIFO set of the most recently seen event ids instead
//! of a persistent dedup store; see [`fetcher`] for the details.

#![warn(clippy::all, rust_2018_idioms)]

use std::time::Duration;

pub mod client;
pub mod fetcher;
pub mod streams;
pub mod types;
pub mod watch;

// Re-export commonly used types
pub use client::{CloudWatchLogsApi, LogsApi};
pub use fetcher::{EventFetcher, PageOutcome, RecencyWindow};
pub use streams::{resolve_streams, select_streams};
pub use types::{FilterRequest, LogEvent, Page, QueryWindow, StreamHeader};
pub use watch::run_stream;

/// Capacity of the recency window, matching the service's maximum number of
/// events one filter call can return. Duplicates are a pagination artifact
/// confined to recently seen ids, so a window of one full page is enough.
pub const MAX_EVENTS_PER_CALL: usize = 10_000;

/// `FilterLogEvents` rejects requests naming more than this many streams.
pub const FILTER_EVENTS_STREAMS_LIMIT: usize = 100;

/// Suspend between poll cycles in watch mode.
pub const WATCH_SLEEP: Duration = Duration::from_secs(2);
