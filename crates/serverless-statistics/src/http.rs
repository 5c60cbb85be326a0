// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared HTTP plumbing for the AWS backends.
//!
//! CloudWatch and CloudWatch Logs speak the AWS JSON protocol: every call is a
//! `POST /` whose operation is named by the `X-Amz-Target` header. Lambda's
//! control plane is a REST API. Request signing is expected to happen outside
//! this crate (signing proxy, VPC endpoint policy, local emulator).

use crate::error::BackendError;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const AMZ_TARGET: &str = "X-Amz-Target";

#[derive(Debug, Clone)]
pub struct AwsJsonClient {
    client: Client,
    endpoint: Url,
}

impl AwsJsonClient {
    pub fn new(
        endpoint: impl Into<String>,
        https_proxy: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let mut builder = Client::builder().use_rustls_tls().timeout(timeout);
        if let Some(proxy) = https_proxy {
            builder = builder.proxy(reqwest::Proxy::https(proxy)?);
        }
        let endpoint = endpoint.into();
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| BackendError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(BackendError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Endpoint URL with `segments` appended, each percent-encoded.
    pub fn url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Calls an AWS JSON protocol operation and decodes its response.
    pub async fn call<Req, Resp>(
        &self,
        target: &str,
        content_type: &'static str,
        request: &Req,
    ) -> Result<Resp, BackendError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)?;
        debug!(target_operation = target, body_len = body.len(), "AWS JSON request");
        let response = self
            .client
            .request(Method::POST, self.url(&[""])?)
            .header(AMZ_TARGET, target)
            .header(CONTENT_TYPE, HeaderValue::from_static(content_type))
            .body(body)
            .send()
            .await?;
        decode(response).await
    }

    /// Issues a REST `GET` on the path built from `segments`. A 404 yields
    /// `Ok(None)` so callers can tell a missing resource apart from a failing
    /// backend.
    pub async fn get<Resp>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Option<Resp>, BackendError>
    where
        Resp: DeserializeOwned,
    {
        let url = self.url(segments)?;
        debug!(url = %url, "AWS REST request");
        let response = self.client.get(url).query(query).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(response).await.map(Some)
    }
}

async fn decode<Resp: DeserializeOwned>(response: reqwest::Response) -> Result<Resp, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "AWS request rejected");
        return Err(BackendError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
