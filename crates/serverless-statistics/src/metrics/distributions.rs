// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{collect_samples, MetricPipeline};
use crate::error::StatsError;
use crate::queries;
use crate::query::{FunctionQuery, FunctionWindow};
use crate::statistics::{summarize, SummaryStatistics};
use tracing::debug;

/// Handler duration per invocation, in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationStatistics {
    pub statistics: SummaryStatistics,
    pub window: FunctionWindow,
}

/// Init duration of cold-started invocations, in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ColdStartDurationStatistics {
    pub statistics: SummaryStatistics,
    pub window: FunctionWindow,
}

/// Max memory used over configured memory size, per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryUsageStatistics {
    pub statistics: SummaryStatistics,
    pub window: FunctionWindow,
}

impl MetricPipeline<'_> {
    pub async fn duration_statistics(
        &self,
        query: &FunctionQuery,
    ) -> Result<DurationStatistics, StatsError> {
        let statistics = self
            .summarize_field(query, queries::DURATION, "durationMs")
            .await?;
        Ok(DurationStatistics {
            statistics,
            window: query.window(),
        })
    }

    pub async fn cold_start_duration_statistics(
        &self,
        query: &FunctionQuery,
    ) -> Result<ColdStartDurationStatistics, StatsError> {
        let statistics = self
            .summarize_field(query, queries::COLD_START_DURATION, "coldStartDurationMs")
            .await?;
        Ok(ColdStartDurationStatistics {
            statistics,
            window: query.window(),
        })
    }

    pub async fn memory_usage_statistics(
        &self,
        query: &FunctionQuery,
    ) -> Result<MemoryUsageStatistics, StatsError> {
        let statistics = self
            .summarize_field(query, queries::MEMORY_UTILIZATION, "memoryUtilizationRatio")
            .await?;
        Ok(MemoryUsageStatistics {
            statistics,
            window: query.window(),
        })
    }

    async fn summarize_field(
        &self,
        query: &FunctionQuery,
        template: &str,
        field: &'static str,
    ) -> Result<SummaryStatistics, StatsError> {
        self.with_invocations(query, |_| async move {
            let rows = self.run_log_query(query, template).await?;
            let samples = collect_samples(&rows, field);
            debug!(field, rows = rows.len(), samples = samples.len(), "Collected samples");
            summarize(&samples)
        })
        .await
    }
}
