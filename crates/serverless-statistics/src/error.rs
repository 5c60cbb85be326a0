// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::logs_insights::QueryStatus;
use std::time::Duration;

/// Errors raised while talking to one of the telemetry backends.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// DNS, TLS, socket or request timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected wire shape.
    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The endpoint cannot carry a path, e.g. `mailto:` or an unparsable URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("no query ID returned")]
    MissingQueryId,

    #[error("query failed with status: {0}")]
    QueryTerminated(QueryStatus),

    #[error("query polling timed out after {0:?}")]
    PollTimeout(Duration),

    #[error("operation cancelled by caller")]
    Cancelled,

    /// Failure reported by a collaborator that is not HTTP based.
    #[error("{0}")]
    Other(String),
}

/// Errors returned by every metric computation.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// The function was not invoked in the requested window. Callers usually
    /// report this as N/A rather than as a failure.
    #[error("function {function_name:?} has zero invocations")]
    NoInvocations { function_name: String },

    #[error("{context}: {source}")]
    Backend {
        context: &'static str,
        #[source]
        source: BackendError,
    },

    /// A field of a single-row aggregate could not be interpreted.
    #[error("invalid aggregate value for {field}: {value:?}")]
    InvalidAggregate { field: &'static str, value: String },

    #[error("cannot compute statistics over an empty sample")]
    EmptySample,

    #[error("total duration of function {function_name:?} is zero, cannot calculate waste ratio")]
    ZeroDuration { function_name: String },

    #[error("query window start must be before its end")]
    InvalidWindow,

    #[error("lambda function {0:?} does not exist")]
    FunctionNotFound(String),

    #[error("version {qualifier:?} of function {function_name:?} does not exist")]
    QualifierNotFound {
        function_name: String,
        qualifier: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StatsError {
    pub(crate) fn backend(context: &'static str) -> impl FnOnce(BackendError) -> Self {
        move |source| Self::Backend { context, source }
    }

    /// True when the error only signals that there was nothing to measure.
    pub fn is_no_invocations(&self) -> bool {
        matches!(self, Self::NoInvocations { .. })
    }
}
