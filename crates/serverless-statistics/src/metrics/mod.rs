// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Derived Lambda metrics.
//!
//! Every metric except the function configuration follows the same shape:
//! resolve the invocation count of the window (cached), bail out with
//! [`StatsError::NoInvocations`] when it is zero, then gather a metric
//! specific numerator from CloudWatch or Logs Insights and combine it.

pub mod distributions;
pub mod error_categories;
pub mod function_configuration;
pub mod rates;
pub mod waste_ratio;

use crate::cache::InvocationCache;
use crate::cloudwatch::{MetricsFetcher, Statistic, INVOCATIONS_METRIC};
use crate::error::StatsError;
use crate::logs_insights::{QueryRunner, ResultRow};
use crate::queries;
use crate::query::FunctionQuery;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Borrowed view of everything one metric computation needs.
#[derive(Debug, Clone, Copy)]
pub struct MetricPipeline<'a> {
    metrics: &'a MetricsFetcher,
    logs: &'a QueryRunner,
    cache: &'a InvocationCache,
    cancel: &'a CancellationToken,
}

impl<'a> MetricPipeline<'a> {
    pub fn new(
        metrics: &'a MetricsFetcher,
        logs: &'a QueryRunner,
        cache: &'a InvocationCache,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            metrics,
            logs,
            cache,
            cancel,
        }
    }

    /// Invocation count of the query window, fetched from CloudWatch at most
    /// once per cache.
    pub async fn invocations(&self, query: &FunctionQuery) -> Result<u64, StatsError> {
        let key = query.cache_key();
        if let Some(count) = self.cache.get(&key) {
            debug!(key = %key, count, "Invocation count served from cache");
            return Ok(count);
        }

        let sum = self
            .metrics
            .fetch_metric(query, INVOCATIONS_METRIC, Statistic::Sum, self.cancel)
            .await
            .map_err(StatsError::backend("fetch invocations metric"))?;
        let count = sum.max(0.0).round() as u64;
        self.cache.set(key, count);
        Ok(count)
    }

    /// Resolves the denominator, then hands it to `numerator`.
    pub(crate) async fn with_invocations<T, F, Fut>(
        &self,
        query: &FunctionQuery,
        numerator: F,
    ) -> Result<T, StatsError>
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = Result<T, StatsError>>,
    {
        let invocations = self.invocations(query).await?;
        if invocations == 0 {
            return Err(StatsError::NoInvocations {
                function_name: query.function_name().to_string(),
            });
        }
        numerator(invocations).await
    }

    pub(crate) async fn fetch_metric(
        &self,
        query: &FunctionQuery,
        metric_name: &str,
        context: &'static str,
    ) -> Result<f64, StatsError> {
        self.metrics
            .fetch_metric(query, metric_name, Statistic::Sum, self.cancel)
            .await
            .map_err(StatsError::backend(context))
    }

    pub(crate) async fn run_log_query(
        &self,
        query: &FunctionQuery,
        template: &str,
    ) -> Result<Vec<ResultRow>, StatsError> {
        let query_string = queries::render(template, query.qualifier());
        self.logs
            .run_query(query, &query_string, self.cancel)
            .await
            .map_err(StatsError::backend("run logs insights query"))
    }
}

/// Reads a numeric field of a single-row aggregate. A missing row or a blank
/// field counts as zero; anything unparsable is fatal since there is no other
/// row to fall back on.
pub(crate) fn aggregate_value(rows: &[ResultRow], field: &'static str) -> Result<f64, StatsError> {
    match rows.first().and_then(|row| row.get(field)) {
        None => Ok(0.0),
        Some(value) if value.trim().is_empty() => Ok(0.0),
        Some(value) => parse_number(value).ok_or_else(|| StatsError::InvalidAggregate {
            field,
            value: value.clone(),
        }),
    }
}

/// Collects one numeric field per row. Rows without the field are ignored,
/// unparsable values are dropped with a warning.
pub(crate) fn collect_samples(rows: &[ResultRow], field: &str) -> Vec<f64> {
    rows.iter()
        .filter_map(|row| row.get(field))
        .filter_map(|value| {
            let parsed = parse_number(value);
            if parsed.is_none() {
                warn!("could not parse {field} value {value:?} as a number, skipping row");
            }
            parsed
        })
        .collect()
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
