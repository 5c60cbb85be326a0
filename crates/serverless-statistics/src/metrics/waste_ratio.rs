// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{aggregate_value, MetricPipeline};
use crate::error::StatsError;
use crate::queries;
use crate::query::{FunctionQuery, FunctionWindow};

/// Fraction of billed time not spent running the handler:
/// `(billed - actual) / billed`.
#[derive(Debug, Clone, PartialEq)]
pub struct WasteRatio {
    pub waste_ratio: f64,
    pub total_duration_ms: f64,
    pub total_billed_duration_ms: f64,
    pub window: FunctionWindow,
}

impl MetricPipeline<'_> {
    pub async fn waste_ratio(&self, query: &FunctionQuery) -> Result<WasteRatio, StatsError> {
        self.with_invocations(query, |_| async move {
            let rows = self.run_log_query(query, queries::BILLED_DURATION).await?;
            let actual = aggregate_value(&rows, "totalDuration")?;
            let billed = aggregate_value(&rows, "totalBilledDuration")?;

            if actual == 0.0 {
                return Err(StatsError::ZeroDuration {
                    function_name: query.function_name().to_string(),
                });
            }
            if billed == 0.0 {
                return Err(StatsError::InvalidAggregate {
                    field: "totalBilledDuration",
                    value: billed.to_string(),
                });
            }

            Ok(WasteRatio {
                waste_ratio: (billed - actual) / billed,
                total_duration_ms: actual,
                total_billed_duration_ms: billed,
                window: query.window(),
            })
        })
        .await
    }
}
