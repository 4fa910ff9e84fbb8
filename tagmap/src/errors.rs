// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tagmap_signer::SigningError;

/// Failures of a discovery run.
///
/// During discovery every variant is fatal. During enrichment the same
/// variants are logged per node and the run continues.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("access denied (HTTP {status}): {message}")]
    Auth { status: u16, message: String },
    #[error("rate limited or server error (HTTP {status}): {message}")]
    RateLimitOrServer { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("unexpected response (HTTP {status}): {message}")]
    UnexpectedStatus { status: u16, message: String },
    #[error("no architecturally significant resources are tagged {key}={value}")]
    EmptyResult { key: String, value: String },
    #[error("discovery cancelled")]
    Cancelled,
}

impl DiscoveryError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// A short hint for the person running discovery.
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "check that the access key, secret key and region are set",
            Self::Auth { .. } => {
                "check the access keys and that the principal may call the tagging API"
            }
            Self::RateLimitOrServer { .. } => "wait and retry the discovery",
            Self::Network(_) => concat!(
                "the endpoint could not be reached; ",
                "check connectivity, proxies and the endpoint override"
            ),
            Self::MalformedResponse(_) | Self::UnexpectedStatus { .. } => {
                "the service returned an unexpected response; check the region and endpoint"
            }
            Self::EmptyResult { .. } => "check the tag key and value, and the region",
            Self::Cancelled => "the run was cancelled before it finished",
        }
    }
}

impl From<SigningError> for DiscoveryError {
    fn from(source: SigningError) -> Self {
        match source {
            SigningError::Configuration(message) => DiscoveryError::Configuration(message),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AppError {
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Discovery(err) => {
                let status = match &err {
                    DiscoveryError::Configuration(_) => StatusCode::BAD_REQUEST,
                    DiscoveryError::Auth { .. } => StatusCode::UNAUTHORIZED,
                    DiscoveryError::EmptyResult { .. } => StatusCode::NOT_FOUND,
                    DiscoveryError::Network(_)
                    | DiscoveryError::MalformedResponse(_)
                    | DiscoveryError::UnexpectedStatus { .. } => StatusCode::BAD_GATEWAY,
                    DiscoveryError::RateLimitOrServer { .. } | DiscoveryError::Cancelled => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                };
                (status, format!("{err} ({})", err.remediation()))
            }
        };

        let body = Json(json!({"code": status.as_u16(), "message": message}));

        (status, body).into_response()
    }
}
