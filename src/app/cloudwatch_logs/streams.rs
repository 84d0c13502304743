//! Stream Selection
//!
//! Narrows a filter query to the streams that can actually hold matching
//! events: those whose event-time interval intersects the query window.
//! The service caps how many streams one filter call may name, so the
//! resolved set is bounds-checked before any query is issued.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Result;

use crate::app::errors::Error;

use super::client::LogsApi;
use super::types::{QueryWindow, StreamHeader};
use super::FILTER_EVENTS_STREAMS_LIMIT;

/// True when the stream's event-time interval intersects the query window.
///
/// A missing window bound leaves that side unbounded. A stream without
/// timing metadata is always kept; an explicitly named stream (rather than
/// one discovered by prefix) never carries it.
fn intersects_window(header: &StreamHeader, window: QueryWindow) -> bool {
    let Some(first_event) = header.first_event_time else {
        return true;
    };
    let last_event = header.last_event_time.unwrap_or(i64::MAX);
    let start = window.start.unwrap_or(i64::MIN);
    let end = window.end.unwrap_or(i64::MAX);

    first_event.max(start) <= last_event.min(end)
}

/// Enumerates the streams in `group_name` matching `prefix` whose events can
/// fall inside `window`, in API enumeration order.
pub async fn select_streams(
    api: &dyn LogsApi,
    group_name: &str,
    prefix: Option<&str>,
    window: QueryWindow,
) -> Result<Vec<String>> {
    let streams = api.describe_streams(group_name, prefix).await?;

    Ok(streams
        .into_iter()
        .filter(|header| intersects_window(header, window))
        .map(|header| header.stream_name)
        .collect())
}

/// Selects streams and enforces the filter-call bounds: zero matches and
/// more than [`FILTER_EVENTS_STREAMS_LIMIT`] matches are both input errors.
pub async fn resolve_streams(
    api: &dyn LogsApi,
    group_name: &str,
    prefix: Option<&str>,
    window: QueryWindow,
) -> Result<Vec<String>> {
    let streams = select_streams(api, group_name, prefix, window).await?;

    if streams.is_empty() {
        return Err(Error::NoStreamsFound {
            prefix: prefix.map(String::from),
        }
        .into());
    }

    if streams.len() > FILTER_EVENTS_STREAMS_LIMIT {
        return Err(Error::TooManyStreams {
            prefix: prefix.map(String::from),
            count: streams.len(),
            limit: FILTER_EVENTS_STREAMS_LIMIT,
        }
        .into());
    }

    Ok(streams)
}
