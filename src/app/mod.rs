//! Core application modules for awstail.
//!
//! # Module Organization
//!
//! ## Log Retrieval
//! - [`cloudwatch_logs`] - API boundary, stream selection, deduplicating
//!   fetcher and watch loop
//!
//! ## Input Resolution
//! - [`time_range`] - relative/absolute date expressions to epoch milliseconds
//! - [`query_template`] - YAML query templates with strict variable
//!   substitution
//!
//! ## Output
//! - [`printer`] - event rendering with columns, color and JSON field
//!   extraction
//!
//! ## Infrastructure
//! - [`errors`] - typed failure taxonomy for user-facing errors

pub mod cloudwatch_logs;
pub mod errors;
pub mod printer;
pub mod query_template;
pub mod time_range;
