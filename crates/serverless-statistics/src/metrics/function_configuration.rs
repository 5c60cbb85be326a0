// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::{BackendError, StatsError};
use crate::lambda::{FunctionConfig, FunctionRegistry};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Deployed settings of one function version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionConfiguration {
    pub arn: String,
    pub function_name: String,
    pub version: String,
    pub memory_size_mb: u32,
    pub timeout_secs: u32,
    pub runtime: String,
    pub last_modified: String,
    pub environment_variables: HashMap<String, String>,
}

impl From<FunctionConfig> for FunctionConfiguration {
    fn from(config: FunctionConfig) -> Self {
        Self {
            arn: config.function_arn,
            function_name: config.function_name,
            version: config.version,
            memory_size_mb: config.memory_size,
            timeout_secs: config.timeout,
            runtime: config.runtime,
            last_modified: config.last_modified,
            environment_variables: config
                .environment
                .and_then(|env| env.variables)
                .unwrap_or_default(),
        }
    }
}

/// Looks up the configuration of `function_name` at `qualifier`. Needs no
/// invocation data, so unlike the other metrics it never consults the cache.
pub async fn function_configuration(
    registry: &dyn FunctionRegistry,
    function_name: &str,
    qualifier: &str,
    cancel: &CancellationToken,
) -> Result<FunctionConfiguration, StatsError> {
    let fetched = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(BackendError::Cancelled),
        config = registry.get_function_config(function_name, qualifier) => config,
    };

    fetched
        .map_err(StatsError::backend("get function configuration"))?
        .map(FunctionConfiguration::from)
        .ok_or_else(|| StatsError::QualifierNotFound {
            function_name: function_name.to_string(),
            qualifier: qualifier.to_string(),
        })
}
