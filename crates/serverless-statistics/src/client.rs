// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Entry point tying the backends, the invocation cache and the metric
//! pipeline together.
//!
//! Every metric method first checks that the function (and, for numbered
//! versions, the qualifier) exists, then runs the computation. Calls may run
//! concurrently; they only share the invocation cache.

use crate::cache::InvocationCache;
use crate::cloudwatch::{HttpMetricsBackend, MetricsBackend, MetricsFetcher};
use crate::config::StatsConfig;
use crate::error::{BackendError, StatsError};
use crate::http::AwsJsonClient;
use crate::lambda::{FunctionRegistry, HttpFunctionRegistry};
use crate::logs_insights::{HttpLogQueryBackend, LogQueryBackend, QueryRunner};
use crate::metrics::distributions::{
    ColdStartDurationStatistics, DurationStatistics, MemoryUsageStatistics,
};
use crate::metrics::error_categories::ErrorCategories;
use crate::metrics::function_configuration::{self, FunctionConfiguration};
use crate::metrics::rates::{ColdStartRate, ErrorRate, ThrottleRate, TimeoutRate};
use crate::metrics::waste_ratio::WasteRatio;
use crate::metrics::MetricPipeline;
use crate::query::{resolve_qualifier, FunctionQuery, LATEST_QUALIFIER};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, error, Instrument};

pub struct ServerlessStats {
    metrics: MetricsFetcher,
    logs: QueryRunner,
    registry: Arc<dyn FunctionRegistry>,
    cache: InvocationCache,
}

impl ServerlessStats {
    /// Builds HTTP backends for the endpoints of `config`.
    pub fn new(config: &StatsConfig) -> Result<Self, StatsError> {
        config.validate()?;
        let client = |endpoint: String| {
            AwsJsonClient::new(
                endpoint,
                config.https_proxy.as_deref(),
                config.request_timeout,
            )
            .map_err(|e| StatsError::InvalidConfig(format!("could not build HTTP client: {e}")))
        };

        let stats = Self::with_backends(
            Arc::new(HttpMetricsBackend::new(client(config.metrics_endpoint())?)),
            Arc::new(HttpLogQueryBackend::new(client(config.logs_endpoint())?)),
            Arc::new(HttpFunctionRegistry::new(client(config.lambda_endpoint())?)),
        )
        .with_query_timing(config.poll_interval, config.query_deadline);

        debug!(region = %config.region, "Serverless statistics client ready");
        Ok(stats)
    }

    pub fn with_backends(
        metrics: Arc<dyn MetricsBackend>,
        logs: Arc<dyn LogQueryBackend>,
        registry: Arc<dyn FunctionRegistry>,
    ) -> Self {
        Self {
            metrics: MetricsFetcher::new(metrics),
            logs: QueryRunner::new(logs),
            registry,
            cache: InvocationCache::new(),
        }
    }

    /// Overrides how often and for how long Logs Insights queries are polled.
    #[must_use]
    pub fn with_query_timing(mut self, poll_interval: Duration, deadline: Duration) -> Self {
        self.logs = self.logs.with_poll_timing(poll_interval, deadline);
        self
    }

    pub fn cache(&self) -> &InvocationCache {
        &self.cache
    }

    pub async fn invocations(
        &self,
        query: &FunctionQuery,
        cancel: &CancellationToken,
    ) -> Result<u64, StatsError> {
        self.run("invocations", query, cancel, |p| async move {
            p.invocations(query).await
        })
        .await
    }

    pub async fn throttle_rate(
        &self,
        query: &FunctionQuery,
        cancel: &CancellationToken,
    ) -> Result<ThrottleRate, StatsError> {
        self.run("throttle_rate", query, cancel, |p| async move {
            p.throttle_rate(query).await
        })
        .await
    }

    pub async fn timeout_rate(
        &self,
        query: &FunctionQuery,
        cancel: &CancellationToken,
    ) -> Result<TimeoutRate, StatsError> {
        self.run("timeout_rate", query, cancel, |p| async move {
            p.timeout_rate(query).await
        })
        .await
    }

    pub async fn error_rate(
        &self,
        query: &FunctionQuery,
        cancel: &CancellationToken,
    ) -> Result<ErrorRate, StatsError> {
        self.run("error_rate", query, cancel, |p| async move {
            p.error_rate(query).await
        })
        .await
    }

    pub async fn cold_start_rate(
        &self,
        query: &FunctionQuery,
        cancel: &CancellationToken,
    ) -> Result<ColdStartRate, StatsError> {
        self.run("cold_start_rate", query, cancel, |p| async move {
            p.cold_start_rate(query).await
        })
        .await
    }

    pub async fn error_categories(
        &self,
        query: &FunctionQuery,
        cancel: &CancellationToken,
    ) -> Result<ErrorCategories, StatsError> {
        self.run("error_categories", query, cancel, |p| async move {
            p.error_categories(query).await
        })
        .await
    }

    pub async fn duration_statistics(
        &self,
        query: &FunctionQuery,
        cancel: &CancellationToken,
    ) -> Result<DurationStatistics, StatsError> {
        self.run("duration_statistics", query, cancel, |p| async move {
            p.duration_statistics(query).await
        })
        .await
    }

    pub async fn cold_start_duration_statistics(
        &self,
        query: &FunctionQuery,
        cancel: &CancellationToken,
    ) -> Result<ColdStartDurationStatistics, StatsError> {
        self.run("cold_start_duration_statistics", query, cancel, |p| async move {
            p.cold_start_duration_statistics(query).await
        })
        .await
    }

    pub async fn memory_usage_statistics(
        &self,
        query: &FunctionQuery,
        cancel: &CancellationToken,
    ) -> Result<MemoryUsageStatistics, StatsError> {
        self.run("memory_usage_statistics", query, cancel, |p| async move {
            p.memory_usage_statistics(query).await
        })
        .await
    }

    pub async fn waste_ratio(
        &self,
        query: &FunctionQuery,
        cancel: &CancellationToken,
    ) -> Result<WasteRatio, StatsError> {
        self.run("waste_ratio", query, cancel, |p| async move {
            p.waste_ratio(query).await
        })
        .await
    }

    /// Configuration of `function_name` at `qualifier`; a blank qualifier
    /// means `$LATEST`.
    pub async fn function_configuration(
        &self,
        function_name: &str,
        qualifier: &str,
        cancel: &CancellationToken,
    ) -> Result<FunctionConfiguration, StatsError> {
        let qualifier = resolve_qualifier(qualifier);
        let span = debug_span!(
            "metric",
            metric = "function_configuration",
            function = function_name,
            qualifier
        );
        async move {
            self.ensure_function_exists(function_name, cancel).await?;
            function_configuration::function_configuration(
                self.registry.as_ref(),
                function_name,
                qualifier,
                cancel,
            )
            .await
        }
        .instrument(span)
        .await
    }

    async fn run<'a, T, F, Fut>(
        &'a self,
        name: &'static str,
        query: &'a FunctionQuery,
        cancel: &'a CancellationToken,
        metric: F,
    ) -> Result<T, StatsError>
    where
        F: FnOnce(MetricPipeline<'a>) -> Fut,
        Fut: Future<Output = Result<T, StatsError>>,
    {
        let span = debug_span!(
            "metric",
            metric = name,
            function = query.function_name(),
            qualifier = query.qualifier()
        );
        async move {
            let result = async move {
                self.ensure_function_exists(query.function_name(), cancel)
                    .await?;
                if query.qualifier() != LATEST_QUALIFIER {
                    self.ensure_qualifier_exists(query.function_name(), query.qualifier(), cancel)
                        .await?;
                }
                let pipeline = MetricPipeline::new(&self.metrics, &self.logs, &self.cache, cancel);
                metric(pipeline).await
            }
            .await;
            if let Err(err @ StatsError::Backend { .. }) = &result {
                error!("{err}");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn ensure_function_exists(
        &self,
        function_name: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StatsError> {
        let exists = cancellable(cancel, self.registry.function_exists(function_name))
            .await
            .map_err(StatsError::backend("check function exists"))?;
        if exists {
            Ok(())
        } else {
            Err(StatsError::FunctionNotFound(function_name.to_string()))
        }
    }

    async fn ensure_qualifier_exists(
        &self,
        function_name: &str,
        qualifier: &str,
        cancel: &CancellationToken,
    ) -> Result<(), StatsError> {
        let exists = cancellable(
            cancel,
            self.registry.qualifier_exists(function_name, qualifier),
        )
        .await
        .map_err(StatsError::backend("check qualifier exists"))?;
        if exists {
            Ok(())
        } else {
            Err(StatsError::QualifierNotFound {
                function_name: function_name.to_string(),
                qualifier: qualifier.to_string(),
            })
        }
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, BackendError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(BackendError::Cancelled),
        result = call => result,
    }
}
