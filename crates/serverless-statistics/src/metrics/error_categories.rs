// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::MetricPipeline;
use crate::error::StatsError;
use crate::queries;
use crate::query::{FunctionQuery, FunctionWindow};
use tracing::warn;

pub const UNKNOWN_ERROR: &str = "UnknownError";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCategory {
    pub category: String,
    pub count: u64,
}

/// Error counts grouped by category, most frequent first.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorCategories {
    pub categories: Vec<ErrorCategory>,
    pub window: FunctionWindow,
}

impl ErrorCategories {
    pub fn total(&self) -> u64 {
        self.categories.iter().map(|c| c.count).sum()
    }
}

impl MetricPipeline<'_> {
    pub async fn error_categories(
        &self,
        query: &FunctionQuery,
    ) -> Result<ErrorCategories, StatsError> {
        self.with_invocations(query, |_| async move {
            let rows = self.run_log_query(query, queries::ERROR_CATEGORIES).await?;
            let categories = rows
                .iter()
                .filter_map(|row| {
                    let count = row.get("error_count")?;
                    let Ok(count) = count.trim().parse::<u64>() else {
                        warn!("could not parse error_count value {count:?}, skipping category");
                        return None;
                    };
                    let category = row
                        .get("error_category")
                        .map(|c| c.trim())
                        .filter(|c| !c.is_empty())
                        .unwrap_or(UNKNOWN_ERROR);
                    Some(ErrorCategory {
                        category: category.to_string(),
                        count,
                    })
                })
                .collect();

            Ok(ErrorCategories {
                categories,
                window: query.window(),
            })
        })
        .await
    }
}
