// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod common;

use common::*;
use mockito::{Matcher, Server};
use serverless_statistics::{BackendError, ServerlessStats, StatsError};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn error_rate_over_http_backends() {
    let mut server = Server::new_async().await;
    let _function = mock_function(&mut server, "checkout").await;
    let invocations = mock_metric(&mut server, "Invocations", &[12.0, 8.0]).await;
    let start = server
        .mock("POST", "/")
        .match_header("x-amz-target", START_QUERY)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""logGroupNames":\["/aws/lambda/checkout"\]"#.to_string()),
            Matcher::Regex(format!(r#""startTime":{START}"#)),
            Matcher::Regex(format!(r#""endTime":{END}"#)),
            Matcher::Regex("errorCount".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"queryId":"q-42"}"#)
        .create_async()
        .await;
    let results = server
        .mock("POST", "/")
        .match_header("x-amz-target", GET_QUERY_RESULTS)
        .match_body(Matcher::Regex(r#""queryId":"q-42""#.to_string()))
        .with_status(200)
        .with_body(r#"{"status":"Complete","results":[[{"field":"errorCount","value":"5"}]]}"#)
        .create_async()
        .await;

    let stats = ServerlessStats::new(&config_for(&server)).expect("failed to build client");
    let result = stats
        .error_rate(&query("checkout", ""), &CancellationToken::new())
        .await
        .expect("error rate");

    assert_eq!(result.error_rate, 0.25);
    assert_eq!(result.window.qualifier, "$LATEST");
    invocations.assert_async().await;
    start.assert_async().await;
    results.assert_async().await;
}

#[tokio::test]
async fn metric_pages_are_summed() {
    let mut server = Server::new_async().await;
    let _function = mock_function(&mut server, "checkout").await;
    let first = server
        .mock("POST", "/")
        .match_header("x-amz-target", GET_METRIC_DATA)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""MetricName":"Throttles""#.to_string()),
            Matcher::Regex(r#""EndTime":\d+\}$"#.to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"MetricDataResults":[{"Id":"m1","Values":[3.0]}],"NextToken":"page-2"}"#)
        .create_async()
        .await;
    let second = server
        .mock("POST", "/")
        .match_header("x-amz-target", GET_METRIC_DATA)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""MetricName":"Throttles""#.to_string()),
            Matcher::Regex(r#""NextToken":"page-2"\}$"#.to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"MetricDataResults":[{"Id":"m1","Values":[2.0]}]}"#)
        .create_async()
        .await;
    let _invocations = mock_metric(&mut server, "Invocations", &[50.0]).await;

    let stats = ServerlessStats::new(&config_for(&server)).expect("failed to build client");
    let result = stats
        .throttle_rate(&query("checkout", ""), &CancellationToken::new())
        .await
        .expect("throttle rate");

    assert_eq!(result.throttle_rate, 0.1);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn numbered_version_uses_resource_dimension() {
    let mut server = Server::new_async().await;
    let _function = mock_function(&mut server, "checkout").await;
    let invocations = server
        .mock("POST", "/")
        .match_header("x-amz-target", GET_METRIC_DATA)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""MetricName":"Invocations""#.to_string()),
            Matcher::Regex(r#"\{"Name":"Resource","Value":"checkout:7"\}"#.to_string()),
            Matcher::Regex(r#""Period":86400"#.to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"MetricDataResults":[{"Id":"m1","Values":[0.0]}]}"#)
        .create_async()
        .await;

    let stats = ServerlessStats::new(&config_for(&server)).expect("failed to build client");
    let err = stats
        .cold_start_rate(&query("checkout", "7"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_no_invocations());
    invocations.assert_async().await;
}

#[tokio::test]
async fn missing_function_is_reported() {
    let mut server = Server::new_async().await;
    let lookup = server
        .mock("GET", "/2015-03-31/functions/billing")
        .with_status(404)
        .with_body(r#"{"Type":"User","Message":"Function not found"}"#)
        .create_async()
        .await;

    let stats = ServerlessStats::new(&config_for(&server)).expect("failed to build client");
    let err = stats
        .duration_statistics(&query("billing", ""), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, StatsError::FunctionNotFound(ref name) if name == "billing"));
    lookup.assert_async().await;
}

#[tokio::test]
async fn missing_version_is_reported() {
    let mut server = Server::new_async().await;
    let _function = server
        .mock("GET", "/2015-03-31/functions/orders")
        .with_status(200)
        .with_body(function_body("orders", "$LATEST"))
        .create_async()
        .await;
    let _version = server
        .mock("GET", "/2015-03-31/functions/orders")
        .match_query(Matcher::UrlEncoded("Qualifier".into(), "9".into()))
        .with_status(404)
        .create_async()
        .await;

    let stats = ServerlessStats::new(&config_for(&server)).expect("failed to build client");
    let err = stats
        .waste_ratio(&query("orders", "9"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "version \"9\" of function \"orders\" does not exist"
    );
}

#[tokio::test]
async fn failed_query_is_surfaced() {
    let mut server = Server::new_async().await;
    let _function = mock_function(&mut server, "checkout").await;
    let _invocations = mock_metric(&mut server, "Invocations", &[10.0]).await;
    let _start = mock_start_query(&mut server, "q-1").await;
    let _results = mock_query_results(&mut server, "Failed", &[]).await;

    let stats = ServerlessStats::new(&config_for(&server)).expect("failed to build client");
    let err = stats
        .timeout_rate(&query("checkout", ""), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "run logs insights query: query failed with status: Failed"
    );
}

#[tokio::test]
async fn rejected_query_is_surfaced() {
    let mut server = Server::new_async().await;
    let _function = mock_function(&mut server, "checkout").await;
    let _invocations = mock_metric(&mut server, "Invocations", &[10.0]).await;
    let _start = server
        .mock("POST", "/")
        .match_header("x-amz-target", START_QUERY)
        .with_status(400)
        .with_body(r#"{"__type":"MalformedQueryException"}"#)
        .create_async()
        .await;

    let stats = ServerlessStats::new(&config_for(&server)).expect("failed to build client");
    let err = stats
        .error_categories(&query("checkout", ""), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        StatsError::Backend {
            source: BackendError::Status { status, body },
            ..
        } => {
            assert_eq!(status, 400);
            assert!(body.contains("MalformedQueryException"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn memory_distribution_over_http_backends() {
    let mut server = Server::new_async().await;
    let _function = mock_function(&mut server, "checkout").await;
    let _invocations = mock_metric(&mut server, "Invocations", &[4.0]).await;
    let _start = mock_start_query(&mut server, "q-7").await;
    let _results = mock_query_results(
        &mut server,
        "Complete",
        &[
            &[("memoryUtilizationRatio", "0.5"), ("@timestamp", "2023-11-14 22:13:20.000")],
            &[("memoryUtilizationRatio", "0.25")],
            &[("memoryUtilizationRatio", "")],
            &[("memoryUtilizationRatio", "0.75")],
        ],
    )
    .await;

    let stats = ServerlessStats::new(&config_for(&server)).expect("failed to build client");
    let result = stats
        .memory_usage_statistics(&query("checkout", ""), &CancellationToken::new())
        .await
        .expect("memory statistics");

    assert_eq!(result.statistics.min, 0.25);
    assert_eq!(result.statistics.max, 0.75);
    assert_eq!(result.statistics.mean, 0.5);
    assert_eq!(result.statistics.p95, None);
}

#[tokio::test]
async fn function_configuration_over_http() {
    let mut server = Server::new_async().await;
    let _function = mock_function(&mut server, "checkout").await;

    let stats = ServerlessStats::new(&config_for(&server)).expect("failed to build client");
    let config = stats
        .function_configuration("checkout", "", &CancellationToken::new())
        .await
        .expect("function configuration");

    assert_eq!(config.memory_size_mb, 512);
    assert_eq!(config.timeout_secs, 30);
    assert_eq!(config.runtime, "python3.12");
    assert_eq!(config.environment_variables["STAGE"], "prod");
}

#[tokio::test]
async fn timeout_rate_over_log_request_count() {
    let mut server = Server::new_async().await;
    let _function = mock_function(&mut server, "checkout").await;
    let _invocations = mock_metric(&mut server, "Invocations", &[100.0]).await;
    let mut mocks = Vec::new();
    for (marker, query_id, field, value) in [
        ("as invocationsCount", "q-requests", "invocationsCount", "40"),
        ("as timeoutCount", "q-timeouts", "timeoutCount", "2"),
    ] {
        mocks.push(
            server
                .mock("POST", "/")
                .match_header("x-amz-target", START_QUERY)
                .match_body(Matcher::Regex(marker.to_string()))
                .with_status(200)
                .with_body(format!(r#"{{"queryId":"{query_id}"}}"#))
                .create_async()
                .await,
        );
        mocks.push(
            server
                .mock("POST", "/")
                .match_header("x-amz-target", GET_QUERY_RESULTS)
                .match_body(Matcher::Regex(format!(r#""queryId":"{query_id}""#)))
                .with_status(200)
                .with_body(format!(
                    r#"{{"status":"Complete","results":[[{{"field":"{field}","value":"{value}"}}]]}}"#
                ))
                .create_async()
                .await,
        );
    }

    let stats = ServerlessStats::new(&config_for(&server)).expect("failed to build client");
    let result = stats
        .timeout_rate(&query("checkout", ""), &CancellationToken::new())
        .await
        .expect("timeout rate");

    assert_eq!(result.timeout_rate, 0.05);
    for mock in mocks {
        mock.assert_async().await;
    }
}
