// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::StatsError;
use crate::logs_insights::{DEFAULT_POLL_INTERVAL, DEFAULT_QUERY_DEADLINE};
use std::env;
use std::time::Duration;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration for reaching the CloudWatch, Logs and Lambda endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsConfig {
    /// AWS region (e.g., us-east-1)
    pub region: String,
    /// Override for the CloudWatch Metrics endpoint
    pub metrics_endpoint: Option<String>,
    /// Override for the CloudWatch Logs endpoint
    pub logs_endpoint: Option<String>,
    /// Override for the Lambda endpoint
    pub lambda_endpoint: Option<String>,
    /// Delay between two Logs Insights status checks
    pub poll_interval: Duration,
    /// Ceiling on the total time spent polling one query
    pub query_deadline: Duration,
    /// Timeout of every single HTTP request
    pub request_timeout: Duration,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
    /// Log level (e.g., trace, debug, info, warn, error), applied by
    /// [`crate::logger::init_from`]
    pub log_level: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            metrics_endpoint: None,
            logs_endpoint: None,
            lambda_endpoint: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            query_deadline: DEFAULT_QUERY_DEADLINE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            https_proxy: None,
            log_level: "info".to_string(),
        }
    }
}

impl StatsConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, StatsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`StatsConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StatsError> {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| -> Result<Duration, StatsError> {
            match lookup(key) {
                None => Ok(default),
                Some(val) => val.trim().parse::<u64>().map(Duration::from_millis).map_err(|_| {
                    StatsError::InvalidConfig(format!("{key} must be a number of milliseconds, got '{val}'"))
                }),
            }
        };

        let region = lookup("SERVERLESS_STATS_REGION")
            .or_else(|| lookup("AWS_REGION"))
            .unwrap_or(defaults.region);
        let https_proxy = lookup("SERVERLESS_STATS_PROXY_HTTPS").or_else(|| lookup("HTTPS_PROXY"));
        let log_level = lookup("SERVERLESS_STATS_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or(defaults.log_level);

        let config = Self {
            region,
            metrics_endpoint: lookup("SERVERLESS_STATS_METRICS_ENDPOINT"),
            logs_endpoint: lookup("SERVERLESS_STATS_LOGS_ENDPOINT"),
            lambda_endpoint: lookup("SERVERLESS_STATS_LAMBDA_ENDPOINT"),
            poll_interval: millis("SERVERLESS_STATS_POLL_INTERVAL_MS", defaults.poll_interval)?,
            query_deadline: millis("SERVERLESS_STATS_QUERY_DEADLINE_MS", defaults.query_deadline)?,
            request_timeout: millis("SERVERLESS_STATS_REQUEST_TIMEOUT_MS", defaults.request_timeout)?,
            https_proxy,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn metrics_endpoint(&self) -> String {
        self.endpoint(self.metrics_endpoint.as_deref(), "monitoring")
    }

    pub fn logs_endpoint(&self) -> String {
        self.endpoint(self.logs_endpoint.as_deref(), "logs")
    }

    pub fn lambda_endpoint(&self) -> String {
        self.endpoint(self.lambda_endpoint.as_deref(), "lambda")
    }

    fn endpoint(&self, configured: Option<&str>, service: &str) -> String {
        configured.map_or_else(
            || format!("https://{service}.{}.amazonaws.com", self.region),
            ToString::to_string,
        )
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), StatsError> {
        if self.region.trim().is_empty() {
            return Err(StatsError::InvalidConfig(
                "region cannot be empty".to_string(),
            ));
        }

        for (name, endpoint) in [
            ("metrics", &self.metrics_endpoint),
            ("logs", &self.logs_endpoint),
            ("lambda", &self.lambda_endpoint),
        ] {
            if endpoint.as_deref().is_some_and(|e| e.trim().is_empty()) {
                return Err(StatsError::InvalidConfig(format!(
                    "{name} endpoint cannot be empty"
                )));
            }
        }

        if self.poll_interval.is_zero() {
            return Err(StatsError::InvalidConfig(
                "poll interval must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(StatsError::InvalidConfig(
                "request timeout must be greater than 0".to_string(),
            ));
        }
        if self.query_deadline < self.poll_interval {
            return Err(StatsError::InvalidConfig(format!(
                "query deadline {:?} is shorter than the poll interval {:?}",
                self.query_deadline, self.poll_interval
            )));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(StatsError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}
