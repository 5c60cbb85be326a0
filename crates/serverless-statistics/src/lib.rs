// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Health and efficiency metrics for AWS Lambda functions.
//!
//! Rates (throttles, timeouts, cold starts, errors), error categories, latency
//! and memory distributions and the waste ratio are derived by combining
//! CloudWatch metrics with Logs Insights queries over the function's logs.
//! [`ServerlessStats`] is the entry point; the backends behind it are traits so
//! they can be swapped for signing proxies, emulators or test doubles.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod cache;
pub mod client;
pub mod cloudwatch;
pub mod config;
pub mod error;
pub mod http;
pub mod lambda;
pub mod logger;
pub mod logs_insights;
pub mod metrics;
pub mod poll;
pub mod queries;
pub mod query;
pub mod statistics;

pub use cache::InvocationCache;
pub use client::ServerlessStats;
pub use config::StatsConfig;
pub use error::{BackendError, StatsError};
pub use metrics::distributions::{
    ColdStartDurationStatistics, DurationStatistics, MemoryUsageStatistics,
};
pub use metrics::error_categories::{ErrorCategories, ErrorCategory};
pub use metrics::function_configuration::FunctionConfiguration;
pub use metrics::rates::{ColdStartRate, ErrorRate, ThrottleRate, TimeoutRate};
pub use metrics::waste_ratio::WasteRatio;
pub use metrics::MetricPipeline;
pub use query::{FunctionQuery, FunctionWindow, LATEST_QUALIFIER};
pub use statistics::{summarize, SummaryStatistics};
