// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Identity of a metric request: which function, which version, which window.

use crate::error::StatsError;
use std::fmt;
use time::OffsetDateTime;

/// Qualifier addressing the most recently published code of a function.
pub const LATEST_QUALIFIER: &str = "$LATEST";

/// Maps an empty or blank qualifier to [`LATEST_QUALIFIER`].
pub fn resolve_qualifier(qualifier: &str) -> &str {
    if qualifier.trim().is_empty() {
        LATEST_QUALIFIER
    } else {
        qualifier
    }
}

/// Function, qualifier and time window a metric is computed for.
///
/// `$LATEST` is a label, not a version: if a deployment happens inside the
/// window, invocations of both the old and the new code are counted together.
/// Pin a numbered version when that matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionQuery {
    function_name: String,
    qualifier: String,
    start_time: OffsetDateTime,
    end_time: OffsetDateTime,
}

impl FunctionQuery {
    /// Builds a query, defaulting an empty qualifier to [`LATEST_QUALIFIER`].
    ///
    /// Both instants are normalised to UTC. Fails with
    /// [`StatsError::InvalidWindow`] unless `start_time < end_time`.
    pub fn new(
        function_name: impl Into<String>,
        qualifier: impl Into<String>,
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
    ) -> Result<Self, StatsError> {
        if start_time >= end_time {
            return Err(StatsError::InvalidWindow);
        }
        let qualifier = qualifier.into();
        Ok(Self {
            function_name: function_name.into(),
            qualifier: resolve_qualifier(&qualifier).to_string(),
            start_time: start_time.to_offset(time::UtcOffset::UTC),
            end_time: end_time.to_offset(time::UtcOffset::UTC),
        })
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn start_time(&self) -> OffsetDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> OffsetDateTime {
        self.end_time
    }

    pub fn is_latest(&self) -> bool {
        self.qualifier == LATEST_QUALIFIER
    }

    /// Log group Lambda writes this function's output to.
    pub fn log_group(&self) -> String {
        format!("/aws/lambda/{}", self.function_name)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            function_name: self.function_name.clone(),
            qualifier: self.qualifier.clone(),
            start: self.start_time.unix_timestamp(),
            end: self.end_time.unix_timestamp(),
        }
    }

    pub fn window(&self) -> FunctionWindow {
        FunctionWindow {
            function_name: self.function_name.clone(),
            qualifier: self.qualifier.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Key of the invocation cache. The window is kept at second resolution,
/// which is what both backends are queried with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    function_name: String,
    qualifier: String,
    start: i64,
    end: i64,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.function_name, self.qualifier, self.start, self.end
        )
    }
}

/// Origin of a metric result, echoed back for traceability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionWindow {
    pub function_name: String,
    pub qualifier: String,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
}
