// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::serve::Serve;
use tokio::net::TcpListener;

use crate::configuration::ServeArgs;
use crate::constants::MAX_REQUEST_BODY_BYTES;
use crate::pipeline::PipelineOptions;
use crate::routes;
use crate::transport::Transport;

#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<dyn Transport>,
    pub pipeline_options: PipelineOptions,
}

pub struct Application {
    port: u16,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    pub async fn build(args: ServeArgs, state: AppState) -> Result<Self, std::io::Error> {
        let address = format!("{}:{}", args.host, args.port);
        let listener = TcpListener::bind(address).await?;
        let server = run(listener, state)?;
        let port = server.local_addr()?.port();

        tracing::info!("[tagmap] listening at http://{}:{}", args.host, port);

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/discover", post(routes::discover))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .with_state(Arc::new(state))
}

#[tracing::instrument(skip(listener, state))]
pub fn run(
    listener: TcpListener,
    state: AppState,
) -> Result<Serve<TcpListener, Router, Router>, std::io::Error> {
    Ok(axum::serve(listener, create_router(state)))
}
