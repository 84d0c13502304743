//! CloudWatch Logs Client Wrapper
//!
//! Provides the [`LogsApi`] seam the retrieval core is written against, plus
//! the production implementation over the AWS SDK. Tests install in-memory
//! fakes of the trait; nothing above this module touches SDK types.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs as cloudwatchlogs;

use crate::app::errors::Error;

use super::types::{FilterRequest, LogEvent, Page, StreamHeader};

/// The three CloudWatch Logs operations the tool consumes.
///
/// Transport errors propagate unchanged as `anyhow::Error`; retry policy
/// belongs to the SDK's own middleware, never to callers of this trait.
#[async_trait]
pub trait LogsApi: Send + Sync {
    /// One page of filtered events. `next_token` is the continuation token
    /// from the previous page, absent on the first call.
    async fn filter_log_events(
        &self,
        request: &FilterRequest,
        next_token: Option<&str>,
    ) -> Result<Page>;

    /// Every stream in `group_name` matching `prefix`, in API enumeration
    /// order, with event-time metadata where the service reports it.
    async fn describe_streams(
        &self,
        group_name: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<StreamHeader>>;

    /// Every log group name matching `prefix`, in API enumeration order.
    async fn describe_groups(&self, prefix: Option<&str>) -> Result<Vec<String>>;
}

/// CloudWatch Logs client wrapper
#[derive(Clone)]
pub struct CloudWatchLogsApi {
    client: cloudwatchlogs::Client,
}

impl CloudWatchLogsApi {
    /// Create a client from the default provider chain, with optional region
    /// and profile overrides.
    pub async fn connect(region: Option<String>, profile: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }

        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }

        let aws_config = loader.load().await;

        Self {
            client: cloudwatchlogs::Client::new(&aws_config),
        }
    }
}

#[async_trait]
impl LogsApi for CloudWatchLogsApi {
    async fn filter_log_events(
        &self,
        request: &FilterRequest,
        next_token: Option<&str>,
    ) -> Result<Page> {
        let mut api_request = self
            .client
            .filter_log_events()
            .log_group_name(&request.group_name);

        // Interleaved responses mix events from all requested streams in
        // approximate chronological order.
        #[allow(deprecated)]
        {
            api_request = api_request.interleaved(true);
        }

        for stream_name in &request.stream_names {
            api_request = api_request.log_stream_names(stream_name.clone());
        }

        if let Some(start_time) = request.window.start {
            api_request = api_request.start_time(start_time);
        }

        if let Some(end_time) = request.window.end {
            api_request = api_request.end_time(end_time);
        }

        if let Some(filter_pattern) = &request.filter_pattern {
            api_request = api_request.filter_pattern(filter_pattern);
        }

        if let Some(token) = next_token {
            api_request = api_request.next_token(token);
        }

        let response = api_request.send().await.with_context(|| {
            format!(
                "Failed to filter log events from log group: {}",
                request.group_name
            )
        })?;

        let mut events = Vec::new();

        if let Some(aws_events) = response.events {
            for event in aws_events {
                events.push(convert_event(event)?);
            }
        }

        Ok(Page {
            events,
            next_token: response.next_token,
        })
    }

    async fn describe_streams(
        &self,
        group_name: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<StreamHeader>> {
        let mut request = self
            .client
            .describe_log_streams()
            .log_group_name(group_name);

        if let Some(prefix) = prefix {
            request = request.log_stream_name_prefix(prefix);
        }

        let mut paginator = request.into_paginator().send();

        let mut streams = Vec::new();
        while let Some(page) = paginator.next().await {
            let page = page.with_context(|| {
                format!("Failed to list log streams for log group: {}", group_name)
            })?;
            if let Some(stream_list) = page.log_streams {
                for stream in stream_list {
                    if let Some(name) = stream.log_stream_name {
                        streams.push(StreamHeader {
                            stream_name: name,
                            first_event_time: stream.first_event_timestamp,
                            last_event_time: stream.last_event_timestamp,
                        });
                    }
                }
            }
        }

        Ok(streams)
    }

    async fn describe_groups(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let mut request = self.client.describe_log_groups();

        if let Some(prefix) = prefix {
            request = request.log_group_name_prefix(prefix);
        }

        let mut paginator = request.into_paginator().send();

        let mut groups = Vec::new();
        while let Some(page) = paginator.next().await {
            let page = page.with_context(|| "Failed to list log groups")?;
            if let Some(group_list) = page.log_groups {
                for group in group_list {
                    if let Some(name) = group.log_group_name {
                        groups.push(name);
                    }
                }
            }
        }

        Ok(groups)
    }
}

/// The SDK models every event field as optional. The dedup core keys on the
/// event id and the renderer needs the rest, so a response missing any of
/// them is rejected rather than papered over with defaults.
fn convert_event(event: cloudwatchlogs::types::FilteredLogEvent) -> Result<LogEvent> {
    let event_id = event
        .event_id
        .ok_or(Error::MalformedResponse { field: "eventId" })?;
    let stream_name = event.log_stream_name.ok_or(Error::MalformedResponse {
        field: "logStreamName",
    })?;
    let timestamp = event.timestamp.ok_or(Error::MalformedResponse {
        field: "timestamp",
    })?;
    let message = event
        .message
        .ok_or(Error::MalformedResponse { field: "message" })?;

    Ok(LogEvent {
        event_id,
        stream_name,
        timestamp,
        ingestion_time: event.ingestion_time.unwrap_or(timestamp),
        message,
    })
}
