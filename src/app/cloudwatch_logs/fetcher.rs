//! Deduplicating Event Fetcher
//!
//! The service's interleaved filter mode makes a best effort to mix events
//! from multiple streams into one response, and in exchange may surface the
//! same event on adjacent pages. Watch mode re-issues the query with the last
//! continuation token, which re-surfaces events again. Both hazards are
//! absorbed here: every event id passes through a bounded FIFO window of the
//! most recently seen ids before it reaches the consumer, so each distinct
//! event is emitted at most once while memory stays constant under
//! indefinite polling.

#![warn(clippy::all, rust_2018_idioms)]

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use anyhow::Result;
use tracing::trace;

use super::client::LogsApi;
use super::types::{FilterRequest, LogEvent};
use super::MAX_EVENTS_PER_CALL;

/// Bounded FIFO set of recently seen event ids with O(1) membership.
///
/// Once capacity is reached, inserting a new id evicts the oldest. Inserting
/// an id that is already present is a no-op and keeps its original eviction
/// slot (pure FIFO, not LRU).
#[derive(Debug)]
pub struct RecencyWindow {
    order: VecDeque<String>,
    members: HashSet<String>,
    capacity: usize,
}

impl RecencyWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "recency window capacity must be non-zero");
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Inserts `id` unless already present. Returns whether the id was new.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.members.contains(id) {
            return false;
        }

        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }

        self.order.push_back(id.to_string());
        self.members.insert(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Result of draining one page of filter results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// More pages are available; call [`EventFetcher::next_batch`] again
    /// without delay.
    More(Vec<LogEvent>),
    /// Every currently available page has been drained.
    Exhausted(Vec<LogEvent>),
}

impl PageOutcome {
    pub fn events(&self) -> &[LogEvent] {
        match self {
            PageOutcome::More(events) | PageOutcome::Exhausted(events) => events,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, PageOutcome::Exhausted(_))
    }
}

/// Issues paginated filter queries and yields each distinct event once.
///
/// Holds the query state for one invocation: the immutable filter request,
/// the continuation token (advanced per page, never reset, reused verbatim
/// when watch mode resumes) and the recency window, which survives the whole
/// invocation including watch sleep/resume cycles.
pub struct EventFetcher {
    api: Arc<dyn LogsApi>,
    request: FilterRequest,
    next_token: Option<String>,
    seen: RecencyWindow,
}

impl EventFetcher {
    pub fn new(api: Arc<dyn LogsApi>, request: FilterRequest) -> Self {
        Self {
            api,
            request,
            next_token: None,
            seen: RecencyWindow::new(MAX_EVENTS_PER_CALL),
        }
    }

    /// Fetches one page and returns the events not seen before, in response
    /// order. Transport errors propagate unchanged; nothing is retried here.
    pub async fn next_batch(&mut self) -> Result<PageOutcome> {
        let page = self
            .api
            .filter_log_events(&self.request, self.next_token.as_deref())
            .await?;

        let mut fresh = Vec::with_capacity(page.events.len());
        for event in page.events {
            if self.seen.insert(&event.event_id) {
                fresh.push(event);
            } else {
                trace!(event_id = %event.event_id, "suppressed duplicate event");
            }
        }

        match page.next_token {
            Some(token) => {
                self.next_token = Some(token);
                Ok(PageOutcome::More(fresh))
            }
            None => Ok(PageOutcome::Exhausted(fresh)),
        }
    }
}
