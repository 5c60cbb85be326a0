// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use mockito::{Matcher, Mock, Server};
use serde_json::{json, Value};
use serverless_statistics::{FunctionQuery, StatsConfig};
use std::time::Duration;
use time::OffsetDateTime;

pub const GET_METRIC_DATA: &str = "GraniteServiceVersion20100801.GetMetricData";
pub const START_QUERY: &str = "Logs_20140328.StartQuery";
pub const GET_QUERY_RESULTS: &str = "Logs_20140328.GetQueryResults";

pub const START: i64 = 1_700_000_000;
pub const END: i64 = 1_700_086_400;

/// Points every endpoint at `server` and polls fast enough for real time.
pub fn config_for(server: &Server) -> StatsConfig {
    StatsConfig {
        metrics_endpoint: Some(server.url()),
        logs_endpoint: Some(server.url()),
        lambda_endpoint: Some(server.url()),
        poll_interval: Duration::from_millis(10),
        query_deadline: Duration::from_secs(2),
        request_timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

pub fn query(function_name: &str, qualifier: &str) -> FunctionQuery {
    FunctionQuery::new(
        function_name,
        qualifier,
        OffsetDateTime::from_unix_timestamp(START).unwrap(),
        OffsetDateTime::from_unix_timestamp(END).unwrap(),
    )
    .unwrap()
}

pub fn function_body(function_name: &str, version: &str) -> String {
    json!({
        "Configuration": {
            "FunctionArn": format!("arn:aws:lambda:us-east-1:123456789012:function:{function_name}:{version}"),
            "FunctionName": function_name,
            "Version": version,
            "MemorySize": 512,
            "Timeout": 30,
            "Runtime": "python3.12",
            "LastModified": "2025-05-01T10:00:00.000+0000",
            "Environment": {"Variables": {"STAGE": "prod"}}
        }
    })
    .to_string()
}

/// Lambda `GetFunction` answering for any qualifier of `function_name`.
pub async fn mock_function(server: &mut Server, function_name: &str) -> Mock {
    server
        .mock("GET", format!("/2015-03-31/functions/{function_name}").as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(function_body(function_name, "$LATEST"))
        .create_async()
        .await
}

/// `GetMetricData` answering `values` for one metric name.
pub async fn mock_metric(server: &mut Server, metric_name: &str, values: &[f64]) -> Mock {
    server
        .mock("POST", "/")
        .match_header("x-amz-target", GET_METRIC_DATA)
        .match_header("content-type", "application/x-amz-json-1.0")
        .match_body(Matcher::Regex(format!(r#""MetricName":"{metric_name}""#)))
        .with_status(200)
        .with_body(json!({"MetricDataResults": [{"Id": "m1", "Values": values}]}).to_string())
        .create_async()
        .await
}

pub async fn mock_start_query(server: &mut Server, query_id: &str) -> Mock {
    server
        .mock("POST", "/")
        .match_header("x-amz-target", START_QUERY)
        .match_header("content-type", "application/x-amz-json-1.1")
        .with_status(200)
        .with_body(json!({ "queryId": query_id }).to_string())
        .create_async()
        .await
}

/// `GetQueryResults` answering `status` with rows of `(field, value)` pairs.
pub async fn mock_query_results(
    server: &mut Server,
    status: &str,
    rows: &[&[(&str, &str)]],
) -> Mock {
    let results: Vec<Value> = rows
        .iter()
        .map(|row| {
            Value::Array(
                row.iter()
                    .map(|(field, value)| json!({"field": field, "value": value}))
                    .collect(),
            )
        })
        .collect();
    server
        .mock("POST", "/")
        .match_header("x-amz-target", GET_QUERY_RESULTS)
        .with_status(200)
        .with_body(json!({"status": status, "results": results}).to_string())
        .create_async()
        .await
}
