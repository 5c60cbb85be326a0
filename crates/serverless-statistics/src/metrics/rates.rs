// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{aggregate_value, MetricPipeline};
use crate::cloudwatch::THROTTLES_METRIC;
use crate::error::StatsError;
use crate::queries;
use crate::query::{FunctionQuery, FunctionWindow};

/// Share of invocation attempts rejected for exceeding concurrency.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleRate {
    pub throttle_rate: f64,
    pub window: FunctionWindow,
}

/// Share of invocations that hit the configured timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeoutRate {
    pub timeout_rate: f64,
    pub window: FunctionWindow,
}

/// Share of invocations that logged an `ERROR` line. Timeouts and throttles
/// are not counted as errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRate {
    pub error_rate: f64,
    pub window: FunctionWindow,
}

/// Share of invocations that had to initialise a new execution environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ColdStartRate {
    pub cold_start_rate: f64,
    pub window: FunctionWindow,
}

impl MetricPipeline<'_> {
    pub async fn throttle_rate(&self, query: &FunctionQuery) -> Result<ThrottleRate, StatsError> {
        self.with_invocations(query, |invocations| async move {
            let throttles = self
                .fetch_metric(query, THROTTLES_METRIC, "fetch throttles metric")
                .await?;
            Ok(ThrottleRate {
                throttle_rate: throttles / invocations as f64,
                window: query.window(),
            })
        })
        .await
    }

    /// Timed out requests over distinct request ids seen in the same log
    /// streams. The CloudWatch count only gates on [`StatsError::NoInvocations`].
    pub async fn timeout_rate(&self, query: &FunctionQuery) -> Result<TimeoutRate, StatsError> {
        self.with_invocations(query, |_| async move {
            let rows = self.run_log_query(query, queries::UNIQUE_REQUESTS).await?;
            let requests = aggregate_value(&rows, "invocationsCount")?;
            let rows = self.run_log_query(query, queries::TIMEOUT_COUNT).await?;
            let timeouts = aggregate_value(&rows, "timeoutCount")?;

            let timeout_rate = if timeouts == 0.0 {
                0.0
            } else if requests == 0.0 {
                return Err(StatsError::InvalidAggregate {
                    field: "invocationsCount",
                    value: requests.to_string(),
                });
            } else {
                timeouts / requests
            };

            Ok(TimeoutRate {
                timeout_rate,
                window: query.window(),
            })
        })
        .await
    }

    pub async fn error_rate(&self, query: &FunctionQuery) -> Result<ErrorRate, StatsError> {
        self.with_invocations(query, |invocations| async move {
            let rows = self.run_log_query(query, queries::ERROR_COUNT).await?;
            let errors = aggregate_value(&rows, "errorCount")?;
            Ok(ErrorRate {
                error_rate: errors / invocations as f64,
                window: query.window(),
            })
        })
        .await
    }

    /// Cold starts over REPORT lines of the same aggregate row, so both sides
    /// of the ratio come from the logs. A blank side means no cold start was
    /// observed and yields 0.
    pub async fn cold_start_rate(
        &self,
        query: &FunctionQuery,
    ) -> Result<ColdStartRate, StatsError> {
        self.with_invocations(query, |_| async move {
            let rows = self.run_log_query(query, queries::COLD_START_RATE).await?;
            let blank = |field: &str| {
                rows.first()
                    .and_then(|row| row.get(field))
                    .map_or(true, |value| value.trim().is_empty())
            };

            let cold_start_rate = if blank("totalInvocations") || blank("coldStartLines") {
                0.0
            } else {
                let total = aggregate_value(&rows, "totalInvocations")?;
                let cold = aggregate_value(&rows, "coldStartLines")?;
                if total == 0.0 {
                    return Err(StatsError::InvalidAggregate {
                        field: "totalInvocations",
                        value: total.to_string(),
                    });
                }
                cold / total
            };

            Ok(ColdStartRate {
                cold_start_rate,
                window: query.window(),
            })
        })
        .await
    }
}
