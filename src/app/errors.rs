//! Failure taxonomy for user-facing errors.
//!
//! Upstream SDK failures travel as `anyhow::Error` with context attached at
//! the API boundary; the variants here cover everything the tool itself
//! rejects: bad input expressions, stream-count bounds, template problems,
//! and responses the dedup core cannot work with.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The expression matched neither the relative grammar nor a known
    /// absolute date format.
    #[error("unknown date format: {0}")]
    InvalidDate(String),

    #[error("no streams match prefix {prefix:?} inside the query window")]
    NoStreamsFound { prefix: Option<String> },

    #[error("{count} streams match prefix {prefix:?}; filter queries accept at most {limit}")]
    TooManyStreams {
        prefix: Option<String>,
        count: usize,
        limit: usize,
    },

    /// The service returned an event without a field the dedup core keys on.
    #[error("malformed filter response: event missing {field}")]
    MalformedResponse { field: &'static str },

    #[error("invalid query argument: {0}")]
    InvalidQueryArgument(String),

    #[error("template variable {0:?} is not bound by any template argument")]
    MissingTemplateArgument(String),

    #[error("invalid field query expression: {0:?}")]
    InvalidFieldQuery(String),

    #[error("failed to read query template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid query template: {0}")]
    TemplateParse(#[from] serde_yaml::Error),
}
