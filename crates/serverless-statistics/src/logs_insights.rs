// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Logs Insights query execution.
//!
//! Logs Insights runs queries asynchronously and never pushes completion, so a
//! query is submitted, then its status is polled until it reaches a terminal
//! state or the poll deadline expires.

use crate::error::BackendError;
use crate::http::AwsJsonClient;
use crate::poll::wait_for_completion;
use crate::query::FunctionQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_QUERY_DEADLINE: Duration = Duration::from_secs(10);

const START_QUERY_TARGET: &str = "Logs_20140328.StartQuery";
const GET_QUERY_RESULTS_TARGET: &str = "Logs_20140328.GetQueryResults";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// One result row: field name to value.
pub type ResultRow = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum QueryStatus {
    Scheduled,
    Running,
    Complete,
    Failed,
    Cancelled,
    Timeout,
    #[serde(other)]
    Unknown,
}

impl QueryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            QueryStatus::Complete | QueryStatus::Failed | QueryStatus::Cancelled | QueryStatus::Timeout
        )
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            QueryStatus::Scheduled => "Scheduled",
            QueryStatus::Running => "Running",
            QueryStatus::Complete => "Complete",
            QueryStatus::Failed => "Failed",
            QueryStatus::Cancelled => "Cancelled",
            QueryStatus::Timeout => "Timeout",
            QueryStatus::Unknown => "Unknown",
        };
        f.write_str(status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQueryRequest {
    pub log_group_names: Vec<String>,
    pub query_string: String,
    /// Epoch seconds.
    pub start_time: i64,
    /// Epoch seconds.
    pub end_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResultField {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryResults {
    pub status: QueryStatus,
    #[serde(default)]
    pub results: Vec<Vec<ResultField>>,
}

#[async_trait]
pub trait LogQueryBackend: Send + Sync {
    /// Submits a query. `Ok(None)` means the backend accepted the call but did
    /// not hand back a job identifier.
    async fn start_query(&self, request: &StartQueryRequest) -> Result<Option<String>, BackendError>;

    async fn get_query_results(&self, query_id: &str) -> Result<QueryResults, BackendError>;
}

#[derive(Clone)]
pub struct QueryRunner {
    backend: Arc<dyn LogQueryBackend>,
    poll_interval: Duration,
    deadline: Duration,
}

impl QueryRunner {
    pub fn new(backend: Arc<dyn LogQueryBackend>) -> Self {
        Self {
            backend,
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: DEFAULT_QUERY_DEADLINE,
        }
    }

    #[must_use]
    pub fn with_poll_timing(mut self, poll_interval: Duration, deadline: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.deadline = deadline;
        self
    }

    /// Runs `query_string` against the function's log group over the query
    /// window and returns the rows in backend order.
    pub async fn run_query(
        &self,
        query: &FunctionQuery,
        query_string: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultRow>, BackendError> {
        let request = StartQueryRequest {
            log_group_names: vec![query.log_group()],
            query_string: query_string.to_string(),
            start_time: query.start_time().unix_timestamp(),
            end_time: query.end_time().unix_timestamp(),
        };

        let submitted = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(BackendError::Cancelled),
            id = self.backend.start_query(&request) => id?,
        };
        let query_id = submitted
            .filter(|id| !id.is_empty())
            .ok_or(BackendError::MissingQueryId)?;
        debug!(query_id = %query_id, function = query.function_name(), "Started Logs Insights query");

        let rows = wait_for_completion(self.poll_interval, self.deadline, cancel, || {
            self.check_status(&query_id)
        })
        .await?;

        debug!(query_id = %query_id, rows = rows.len(), "Logs Insights query complete");
        Ok(rows)
    }

    async fn check_status(&self, query_id: &str) -> Result<Option<Vec<ResultRow>>, BackendError> {
        let response = self.backend.get_query_results(query_id).await?;
        match response.status {
            QueryStatus::Complete => Ok(Some(into_rows(response.results))),
            status if status.is_terminal() => Err(BackendError::QueryTerminated(status)),
            status => {
                debug!(query_id, %status, "Logs Insights query still pending");
                Ok(None)
            }
        }
    }
}

impl fmt::Debug for QueryRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRunner")
            .field("poll_interval", &self.poll_interval)
            .field("deadline", &self.deadline)
            .finish()
    }
}

fn into_rows(results: Vec<Vec<ResultField>>) -> Vec<ResultRow> {
    results
        .into_iter()
        .map(|row| row.into_iter().map(|f| (f.field, f.value)).collect())
        .collect()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartQueryOutput {
    query_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetQueryResultsInput<'a> {
    query_id: &'a str,
}

/// [`LogQueryBackend`] calling the CloudWatch Logs JSON API.
#[derive(Debug, Clone)]
pub struct HttpLogQueryBackend {
    client: AwsJsonClient,
}

impl HttpLogQueryBackend {
    pub fn new(client: AwsJsonClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogQueryBackend for HttpLogQueryBackend {
    async fn start_query(&self, request: &StartQueryRequest) -> Result<Option<String>, BackendError> {
        let output: StartQueryOutput = self
            .client
            .call(START_QUERY_TARGET, CONTENT_TYPE, request)
            .await?;
        Ok(output.query_id)
    }

    async fn get_query_results(&self, query_id: &str) -> Result<QueryResults, BackendError> {
        self.client
            .call(
                GET_QUERY_RESULTS_TARGET,
                CONTENT_TYPE,
                &GetQueryResultsInput { query_id },
            )
            .await
    }
}
