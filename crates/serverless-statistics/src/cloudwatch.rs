// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Scalar metric fetches against CloudWatch Metrics.

use crate::error::BackendError;
use crate::http::AwsJsonClient;
use crate::query::FunctionQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const LAMBDA_NAMESPACE: &str = "AWS/Lambda";
pub const INVOCATIONS_METRIC: &str = "Invocations";
pub const THROTTLES_METRIC: &str = "Throttles";

/// One datapoint per day. The window is summed anyway, so finer periods only
/// add datapoints.
pub const PERIOD_SECS: i64 = 86_400;

const GET_METRIC_DATA_TARGET: &str = "GraniteServiceVersion20100801.GetMetricData";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const QUERY_ID: &str = "m1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Sum,
    Average,
    Minimum,
    Maximum,
    SampleCount,
}

impl Statistic {
    pub fn as_str(self) -> &'static str {
        match self {
            Statistic::Sum => "Sum",
            Statistic::Average => "Average",
            Statistic::Minimum => "Minimum",
            Statistic::Maximum => "Maximum",
            Statistic::SampleCount => "SampleCount",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDataRequest {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub statistic: Statistic,
    pub period_secs: i64,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
}

/// Values of one returned time series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    pub id: String,
    pub values: Vec<f64>,
}

#[async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn get_metric_data(
        &self,
        request: &MetricDataRequest,
    ) -> Result<Vec<MetricSeries>, BackendError>;
}

/// Dimensions scoping a Lambda metric to one function version.
///
/// CloudWatch only tags `$LATEST` datapoints with the bare function name as
/// `Resource`; numbered versions use `name:version`.
pub fn dimensions_for(query: &FunctionQuery) -> Vec<Dimension> {
    let resource = if query.is_latest() {
        query.function_name().to_string()
    } else {
        format!("{}:{}", query.function_name(), query.qualifier())
    };
    vec![
        Dimension::new("FunctionName", query.function_name()),
        Dimension::new("Resource", resource),
    ]
}

#[derive(Clone)]
pub struct MetricsFetcher {
    backend: Arc<dyn MetricsBackend>,
}

impl MetricsFetcher {
    pub fn new(backend: Arc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }

    /// Sum of every datapoint of `metric_name` in the query window. A window
    /// without datapoints sums to `0.0`.
    pub async fn fetch_metric(
        &self,
        query: &FunctionQuery,
        metric_name: &str,
        statistic: Statistic,
        cancel: &CancellationToken,
    ) -> Result<f64, BackendError> {
        let request = MetricDataRequest {
            namespace: LAMBDA_NAMESPACE.to_string(),
            metric_name: metric_name.to_string(),
            dimensions: dimensions_for(query),
            statistic,
            period_secs: PERIOD_SECS,
            start_time: query.start_time(),
            end_time: query.end_time(),
        };

        let series = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(BackendError::Cancelled),
            series = self.backend.get_metric_data(&request) => series?,
        };

        let sum = series.iter().flat_map(|s| s.values.iter()).sum::<f64>();
        debug!(
            function = query.function_name(),
            qualifier = query.qualifier(),
            metric = metric_name,
            %statistic,
            series = series.len(),
            sum,
            "Fetched metric"
        );
        Ok(sum)
    }
}

impl fmt::Debug for MetricsFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetricsFetcher")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetMetricDataInput<'a> {
    metric_data_queries: [MetricDataQuery<'a>; 1],
    start_time: i64,
    end_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MetricDataQuery<'a> {
    id: &'static str,
    metric_stat: MetricStat<'a>,
    return_data: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MetricStat<'a> {
    metric: Metric<'a>,
    period: i64,
    stat: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Metric<'a> {
    namespace: &'a str,
    metric_name: &'a str,
    dimensions: &'a [Dimension],
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetMetricDataOutput {
    #[serde(default)]
    metric_data_results: Vec<MetricDataResult>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetricDataResult {
    #[serde(default)]
    id: String,
    #[serde(default)]
    values: Vec<f64>,
}

/// [`MetricsBackend`] calling CloudWatch `GetMetricData`, following
/// `NextToken` until every page is read.
#[derive(Debug, Clone)]
pub struct HttpMetricsBackend {
    client: AwsJsonClient,
}

impl HttpMetricsBackend {
    pub fn new(client: AwsJsonClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetricsBackend for HttpMetricsBackend {
    async fn get_metric_data(
        &self,
        request: &MetricDataRequest,
    ) -> Result<Vec<MetricSeries>, BackendError> {
        let mut series = Vec::new();
        let mut next_token = None;
        loop {
            let input = GetMetricDataInput {
                metric_data_queries: [MetricDataQuery {
                    id: QUERY_ID,
                    metric_stat: MetricStat {
                        metric: Metric {
                            namespace: &request.namespace,
                            metric_name: &request.metric_name,
                            dimensions: &request.dimensions,
                        },
                        period: request.period_secs,
                        stat: request.statistic.as_str(),
                    },
                    return_data: true,
                }],
                start_time: request.start_time.unix_timestamp(),
                end_time: request.end_time.unix_timestamp(),
                next_token,
            };
            let output: GetMetricDataOutput = self
                .client
                .call(GET_METRIC_DATA_TARGET, CONTENT_TYPE, &input)
                .await?;
            series.extend(output.metric_data_results.into_iter().map(|r| MetricSeries {
                id: r.id,
                values: r.values,
            }));
            match output.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => return Ok(series),
            }
        }
    }
}
