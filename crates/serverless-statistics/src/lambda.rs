// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Lambda control-plane lookups: existence checks and function configuration.

use crate::error::BackendError;
use crate::http::AwsJsonClient;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

const API_VERSION: &str = "2015-03-31";

/// Configuration of one published function version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionConfig {
    #[serde(default)]
    pub function_arn: String,
    #[serde(default)]
    pub function_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub memory_size: u32,
    #[serde(default)]
    pub timeout: u32,
    #[serde(default)]
    pub runtime: String,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default)]
    pub environment: Option<Environment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    #[serde(default)]
    pub variables: Option<HashMap<String, String>>,
}

#[async_trait]
pub trait FunctionRegistry: Send + Sync {
    async fn function_exists(&self, function_name: &str) -> Result<bool, BackendError>;

    async fn qualifier_exists(
        &self,
        function_name: &str,
        qualifier: &str,
    ) -> Result<bool, BackendError>;

    /// `Ok(None)` when the function or qualifier does not exist.
    async fn get_function_config(
        &self,
        function_name: &str,
        qualifier: &str,
    ) -> Result<Option<FunctionConfig>, BackendError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetFunctionOutput {
    configuration: Option<FunctionConfig>,
}

/// [`FunctionRegistry`] calling the Lambda `GetFunction` REST endpoint.
#[derive(Debug, Clone)]
pub struct HttpFunctionRegistry {
    client: AwsJsonClient,
}

impl HttpFunctionRegistry {
    pub fn new(client: AwsJsonClient) -> Self {
        Self { client }
    }

    async fn get_function(
        &self,
        function_name: &str,
        qualifier: Option<&str>,
    ) -> Result<Option<GetFunctionOutput>, BackendError> {
        let query: Vec<(&str, &str)> = qualifier.map(|q| ("Qualifier", q)).into_iter().collect();
        self.client
            .get(&[API_VERSION, "functions", function_name], &query)
            .await
    }
}

#[async_trait]
impl FunctionRegistry for HttpFunctionRegistry {
    async fn function_exists(&self, function_name: &str) -> Result<bool, BackendError> {
        Ok(self.get_function(function_name, None).await?.is_some())
    }

    async fn qualifier_exists(
        &self,
        function_name: &str,
        qualifier: &str,
    ) -> Result<bool, BackendError> {
        Ok(self
            .get_function(function_name, Some(qualifier))
            .await?
            .is_some())
    }

    async fn get_function_config(
        &self,
        function_name: &str,
        qualifier: &str,
    ) -> Result<Option<FunctionConfig>, BackendError> {
        Ok(self
            .get_function(function_name, Some(qualifier))
            .await?
            .and_then(|output| output.configuration))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Registry knowing a fixed set of `(function, versions)`.
    #[derive(Default)]
    pub(crate) struct MockRegistry {
        functions: HashMap<String, Vec<String>>,
        pub(crate) config: Option<FunctionConfig>,
    }

    impl MockRegistry {
        pub(crate) fn with_function(mut self, function_name: &str, versions: &[&str]) -> Self {
            self.functions.insert(
                function_name.to_string(),
                versions.iter().map(ToString::to_string).collect(),
            );
            self
        }

        pub(crate) fn with_config(mut self, config: FunctionConfig) -> Self {
            self.config = Some(config);
            self
        }
    }

    #[async_trait]
    impl FunctionRegistry for MockRegistry {
        async fn function_exists(&self, function_name: &str) -> Result<bool, BackendError> {
            Ok(self.functions.contains_key(function_name))
        }

        async fn qualifier_exists(
            &self,
            function_name: &str,
            qualifier: &str,
        ) -> Result<bool, BackendError> {
            Ok(self
                .functions
                .get(function_name)
                .is_some_and(|versions| versions.iter().any(|v| v == qualifier)))
        }

        async fn get_function_config(
            &self,
            function_name: &str,
            qualifier: &str,
        ) -> Result<Option<FunctionConfig>, BackendError> {
            if self.qualifier_exists(function_name, qualifier).await? {
                Ok(self.config.clone())
            } else {
                Ok(None)
            }
        }
    }

    #[test]
    fn test_function_config_deserialization() {
        let output: GetFunctionOutput = serde_json::from_str(
            r#"{
                "Configuration": {
                    "FunctionArn": "arn:aws:lambda:us-east-1:123456789012:function:checkout:3",
                    "FunctionName": "checkout",
                    "Version": "3",
                    "MemorySize": 512,
                    "Timeout": 30,
                    "Runtime": "python3.12",
                    "LastModified": "2025-05-01T10:00:00.000+0000",
                    "Environment": {"Variables": {"STAGE": "prod"}},
                    "Handler": "app.handler"
                },
                "Code": {"RepositoryType": "S3"}
            }"#,
        )
        .unwrap();
        let config = output.configuration.unwrap();
        assert_eq!(config.memory_size, 512);
        assert_eq!(config.timeout, 30);
        assert_eq!(config.version, "3");
        assert_eq!(
            config.environment.unwrap().variables.unwrap()["STAGE"],
            "prod"
        );
    }

    #[test]
    fn test_function_config_without_environment() {
        let output: GetFunctionOutput =
            serde_json::from_str(r#"{"Configuration": {"FunctionName": "checkout"}}"#).unwrap();
        let config = output.configuration.unwrap();
        assert_eq!(config.environment, None);
        assert_eq!(config.memory_size, 0);
    }
}
