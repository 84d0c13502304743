//! awstail - CloudWatch Logs Streaming CLI
//!
//! awstail retrieves, deduplicates and streams log events from AWS CloudWatch
//! Logs. It drives the paginated `FilterLogEvents` API across one or more log
//! streams, suppresses the duplicate events the service surfaces when
//! interleaving streams, and renders each event once to the terminal, either
//! as a one-shot query or as a continuous tail.
//!
//! # Core Features
//!
//! - **Deduplicated streaming**: paginated filter queries with a bounded
//!   recency window that absorbs the service's page-boundary duplicates
//! - **Watch mode**: indefinite polling with a fixed suspend between cycles,
//!   cancellation-aware, constant memory
//! - **Time expressions**: relative ("5m", "2h ago") and absolute date bounds
//! - **Field extraction**: pull a single field out of JSON-formatted messages
//! - **Query templates**: YAML files with strict `{{variable}}` substitution
//!
//! # Architecture Overview
//!
//! The crate follows a layered structure with clear separation of concerns:
//!
//! - **CLI Layer** (`main.rs`): argument parsing, logging setup, exit codes
//! - **Retrieval Core** ([`app::cloudwatch_logs`]): stream selection, the
//!   deduplicating fetcher and the watch loop
//! - **Rendering** ([`app::printer`]): column assembly, color, extraction
//! - **Input Resolution** ([`app::time_range`], [`app::query_template`]):
//!   date expressions and query template preprocessing
//!
//! The CloudWatch Logs service is reached through the
//! [`app::cloudwatch_logs::LogsApi`] trait so that the retrieval core can be
//! exercised against in-memory fakes in tests.

#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
