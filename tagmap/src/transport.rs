// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Signed HTTP calls to AWS service endpoints.
//!
//! [`Transport`] is the socket seam: it moves a [`SignedRequest`] over the
//! wire and hands back the raw status and body. [`AwsClient`] sits on top,
//! signing each call with the caller's credentials and turning non-2xx
//! responses into [`DiscoveryError`] variants.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tagmap_signer::{Credentials, SignableRequest, SignedRequest, SigningParams, sign};

use crate::constants::{GLOBAL_SIGNING_REGION, MAX_ERROR_BODY_CHARS, REQUEST_TIMEOUT};
use crate::errors::DiscoveryError;

/// Error codes that mark a 400 response as throttling.
const THROTTLING_MARKERS: &[&str] = &[
    "Throttling",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "SlowDown",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns whatever the server answered.
    ///
    /// Only a missing response (connect failure, timeout, TLS failure) is an
    /// error here; status handling belongs to the caller.
    async fn send(&self, request: SignedRequest) -> Result<HttpResponse, DiscoveryError>;
}

/// [`Transport`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint_override: Option<String>,
}

impl HttpTransport {
    pub fn new() -> Result<Self, DiscoveryError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DiscoveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DiscoveryError::Configuration(format!("unable to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint_override: None,
        })
    }

    /// Sends every request to `base_url` instead of `https://<host>`.
    ///
    /// The signature still covers the real service host.
    pub fn with_endpoint_override(mut self, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.endpoint_override = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn url(&self, request: &SignedRequest) -> String {
        let base = match &self.endpoint_override {
            Some(base_url) => base_url.clone(),
            None => format!("https://{}", request.host),
        };
        format!("{base}{}", request.path_and_query())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: SignedRequest) -> Result<HttpResponse, DiscoveryError> {
        let url = self.url(&request);
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| DiscoveryError::Configuration(format!("invalid HTTP method: {e}")))?;

        tracing::trace!("[tagmap] {} {}", request.method, url);

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                DiscoveryError::Network(format!("request to {} timed out", request.host))
            } else {
                DiscoveryError::Network(format!("unable to reach {}: {e}", request.host))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DiscoveryError::Network(format!("unable to read response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}

/// Regional endpoint host for a service namespace.
pub fn service_host(service: &str, region: &str) -> String {
    format!("{service}.{region}.amazonaws.com")
}

/// Signs and sends calls on behalf of one account and region.
#[derive(Clone)]
pub struct AwsClient {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    region: String,
}

impl std::fmt::Debug for AwsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsClient")
            .field("credentials", &self.credentials)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl AwsClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        region: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            credentials,
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// A request addressed to the regional endpoint of `service`.
    pub fn request(&self, method: &str, service: &str, path: &str) -> SignableRequest {
        SignableRequest::new(method, service_host(service, &self.region), path)
    }

    pub async fn call(
        &self,
        service: &str,
        request: SignableRequest,
    ) -> Result<String, DiscoveryError> {
        self.call_in_region(service, &self.region, request).await
    }

    /// Signs for `region` rather than the client's region. Global services
    /// such as CloudFront are signed for [`GLOBAL_SIGNING_REGION`].
    pub async fn call_in_region(
        &self,
        service: &str,
        region: &str,
        request: SignableRequest,
    ) -> Result<String, DiscoveryError> {
        let params = SigningParams {
            credentials: &self.credentials,
            region,
            service,
        };
        let signed = sign(&params, request)?;

        tracing::debug!(
            "[tagmap] {} {}{}",
            signed.method,
            signed.host,
            signed.path
        );

        let response = self.transport.send(signed).await?;
        classify_response(response)
    }

    pub async fn call_global(
        &self,
        service: &str,
        request: SignableRequest,
    ) -> Result<String, DiscoveryError> {
        self.call_in_region(service, GLOBAL_SIGNING_REGION, request)
            .await
    }

    pub async fn call_json<T: DeserializeOwned>(
        &self,
        service: &str,
        request: SignableRequest,
    ) -> Result<T, DiscoveryError> {
        let body = self.call(service, request).await?;
        parse_json(&body)
    }

    pub async fn call_xml<T: DeserializeOwned>(
        &self,
        service: &str,
        request: SignableRequest,
    ) -> Result<T, DiscoveryError> {
        let body = self.call(service, request).await?;
        parse_xml(&body)
    }
}

pub fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, DiscoveryError> {
    serde_json::from_str(body).map_err(|e| {
        DiscoveryError::MalformedResponse(format!("{e}: {}", truncate(body, MAX_ERROR_BODY_CHARS)))
    })
}

pub fn parse_xml<T: DeserializeOwned>(body: &str) -> Result<T, DiscoveryError> {
    quick_xml::de::from_str(body).map_err(|e| {
        DiscoveryError::MalformedResponse(format!("{e}: {}", truncate(body, MAX_ERROR_BODY_CHARS)))
    })
}

/// Maps a raw response to its body or a typed error.
pub fn classify_response(response: HttpResponse) -> Result<String, DiscoveryError> {
    let status = response.status;
    if (200..300).contains(&status) {
        return Ok(response.body);
    }

    let message = truncate(&response.body, MAX_ERROR_BODY_CHARS);
    match status {
        401 | 403 => Err(DiscoveryError::Auth { status, message }),
        429 | 500..=599 => Err(DiscoveryError::RateLimitOrServer { status, message }),
        400 if is_throttling(&response.body) => {
            Err(DiscoveryError::RateLimitOrServer { status, message })
        }
        _ => Err(DiscoveryError::UnexpectedStatus { status, message }),
    }
}

fn is_throttling(body: &str) -> bool {
    THROTTLING_MARKERS.iter().any(|marker| body.contains(marker))
}

pub(crate) fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_success_returns_body() {
        let body = classify_response(HttpResponse::new(200, "{}")).unwrap();
        assert_eq!(body, "{}");
    }

    #[test]
    fn test_classify_auth() {
        for status in [401, 403] {
            let err = classify_response(HttpResponse::new(status, "AccessDenied")).unwrap_err();
            assert!(err.is_auth(), "{status}");
        }
    }

    #[test]
    fn test_classify_rate_limit_and_server() {
        for status in [429, 500, 503] {
            let err = classify_response(HttpResponse::new(status, "")).unwrap_err();
            assert!(matches!(err, DiscoveryError::RateLimitOrServer { .. }), "{status}");
        }

        let err = classify_response(HttpResponse::new(
            400,
            r#"{"__type":"ThrottlingException","message":"Rate exceeded"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, DiscoveryError::RateLimitOrServer { status: 400, .. }));
    }

    #[test]
    fn test_classify_other_statuses() {
        let err = classify_response(HttpResponse::new(404, "not here")).unwrap_err();
        assert_eq!(
            err,
            DiscoveryError::UnexpectedStatus {
                status: 404,
                message: "not here".to_string()
            }
        );

        let err = classify_response(HttpResponse::new(400, "ValidationException")).unwrap_err();
        assert!(matches!(err, DiscoveryError::UnexpectedStatus { status: 400, .. }));
    }

    #[test]
    fn test_error_body_truncated() {
        let body = "x".repeat(2_000);
        match classify_response(HttpResponse::new(500, body)).unwrap_err() {
            DiscoveryError::RateLimitOrServer { message, .. } => {
                assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS)
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_failures_are_malformed() {
        let err = parse_json::<serde_json::Value>("not json").unwrap_err();
        assert!(matches!(err, DiscoveryError::MalformedResponse(_)));
    }

    #[test]
    fn test_service_host() {
        assert_eq!(
            service_host("tagging", "eu-west-1"),
            "tagging.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_endpoint_override_url() {
        let transport = HttpTransport::new()
            .unwrap()
            .with_endpoint_override("http://127.0.0.1:4566/");
        let request = SignedRequest {
            method: "GET".to_string(),
            host: "lambda.us-east-1.amazonaws.com".to_string(),
            path: "/2015-03-31/event-source-mappings/".to_string(),
            query_string: "FunctionName=orders".to_string(),
            headers: Default::default(),
            body: String::new(),
        };
        assert_eq!(
            transport.url(&request),
            "http://127.0.0.1:4566/2015-03-31/event-source-mappings/?FunctionName=orders"
        );
    }

    #[tokio::test]
    async fn test_client_signs_and_classifies() {
        let transport = crate::testing::MockTransport::new(|request| {
            assert!(request.authorization().is_some());
            assert_eq!(request.host, "sns.us-east-1.amazonaws.com");
            crate::testing::Reply::status(403, "denied")
        });
        let client = AwsClient::new(
            Arc::new(transport),
            Credentials::new("AKID", "SECRET"),
            "us-east-1",
        );
        let err = client
            .call("sns", client.request("POST", "sns", "/"))
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_client_rejects_missing_credentials() {
        let transport = crate::testing::MockTransport::new(|_| crate::testing::Reply::ok("{}"));
        let client = AwsClient::new(Arc::new(transport), Credentials::new("", ""), "us-east-1");
        let err = client
            .call("sns", client.request("POST", "sns", "/"))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Configuration(_)));
    }
}
