// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP route handlers for the discovery API.
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/health` | [`health`] | Health check endpoint |
//! | POST | `/discover` | [`discover`] | Discover, enrich and connect tagged resources |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::application::AppState;
use crate::errors::AppError;
use crate::models::{ArchitectureResult, DiscoverRequest};
use crate::pipeline::Pipeline;
use crate::transport::AwsClient;

/// Health check endpoint.
///
/// # Response
///
/// ```json
/// {"status": "ok"}
/// ```
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Runs one discovery for the caller's credentials, region and tag.
///
/// The run is cancelled if the client goes away before it finishes.
///
/// # Errors
///
/// - [`AppError::ValidationError`] - Request validation failed
/// - [`AppError::Discovery`] - Discovery failed or found nothing
#[tracing::instrument(skip(state, request), fields(region = %request.region))]
pub async fn discover(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DiscoverRequest>,
) -> Result<Json<ArchitectureResult>, AppError> {
    tracing::debug!("[tagmap] validating discover request");
    request.validate().map_err(|e| {
        tracing::error!("[tagmap] validation failed: {}", e);
        AppError::ValidationError(e.to_string())
    })?;

    let client = AwsClient::new(
        state.transport.clone(),
        request.credentials(),
        request.region.as_str(),
    );
    let pipeline = Pipeline::new(client, state.pipeline_options)?;

    // dropping the handler future (client disconnect) cancels the run
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let result = pipeline
        .run(&request.tag_filter(), &cancel)
        .await
        .map_err(|e| {
            tracing::error!("[tagmap] discovery failed: {}", e);
            e
        })?;

    tracing::info!(
        "[tagmap] discovery returned {} nodes and {} edges",
        result.nodes.len(),
        result.edges.len()
    );

    Ok(Json(result))
}
