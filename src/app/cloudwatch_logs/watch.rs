//! Watch Loop Driver
//!
//! Iterates the fetcher into a consumer callback. One-shot mode returns once
//! the available pages are drained; watch mode suspends for [`WATCH_SLEEP`]
//! and re-polls with the same continuation token and recency window,
//! indefinitely. Cancellation is checked between batches and raced against
//! both the in-flight query and the suspend, so an interrupt never leaves a
//! partially emitted event behind.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::app::printer::PrintError;

use super::fetcher::EventFetcher;
use super::types::LogEvent;
use super::WATCH_SLEEP;

/// Drains the fetcher through `on_event`, in emission order.
///
/// Returns `Ok(())` on normal completion, cancellation, or a closed output
/// pipe; any other consumer or fetcher error propagates.
pub async fn run_stream<F>(
    fetcher: &mut EventFetcher,
    mut on_event: F,
    watch: bool,
    cancel: &CancellationToken,
) -> Result<()>
where
    F: FnMut(&LogEvent) -> Result<(), PrintError>,
{
    loop {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("cancelled before the next page fetch completed");
                return Ok(());
            }
            outcome = fetcher.next_batch() => outcome?,
        };

        for event in outcome.events() {
            match on_event(event) {
                Ok(()) => {}
                Err(PrintError::ClosedPipe) => {
                    debug!("output pipe closed, stopping");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
        }

        if outcome.is_exhausted() {
            if !watch {
                return Ok(());
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("cancelled during watch suspend");
                    return Ok(());
                }
                _ = tokio::time::sleep(WATCH_SLEEP) => {}
            }
        }
    }
}
