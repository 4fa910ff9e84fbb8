// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tagmap::application::{AppState, Application};
use tagmap::configuration::{Command, DiscoverArgs, TagmapOptions};
use tagmap::models::TagFilter;
use tagmap::pipeline::{Pipeline, PipelineOptions};
use tagmap::transport::{AwsClient, HttpTransport, Transport};
use tagmap_signer::Credentials;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        // stdout carries the discovery result
        .with_writer(std::io::stderr)
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        .with_ansi(false)
        .without_time()
        // remove the name of the function from every log entry
        .with_target(false)
        .init();

    let options = TagmapOptions::parse();

    tracing::info!("[tagmap] {:?}", &options);

    let mut transport = HttpTransport::with_timeout(options.request_timeout())?;
    if let Some(endpoint_url) = &options.endpoint_url {
        tracing::warn!("[tagmap] sending all AWS calls to {}", endpoint_url);
        transport = transport.with_endpoint_override(endpoint_url.as_str());
    }
    let transport: Arc<dyn Transport> = Arc::new(transport);
    let pipeline_options = options.pipeline_options();

    match options.command {
        Command::Discover(args) => discover(args, transport, pipeline_options).await,
        Command::Serve(args) => {
            let state = AppState {
                transport,
                pipeline_options,
            };
            let application = Application::build(args, state)
                .await
                .context("unable to start the HTTP server")?;
            application.run_until_stopped().await?;
            Ok(())
        }
    }
}

async fn discover(
    args: DiscoverArgs,
    transport: Arc<dyn Transport>,
    pipeline_options: PipelineOptions,
) -> anyhow::Result<()> {
    let credentials =
        Credentials::new(args.access_key_id.as_str(), args.secret_access_key.as_str());
    let client = AwsClient::new(transport, credentials, args.region.as_str());
    let pipeline = Pipeline::new(client, pipeline_options)?;
    let filter = TagFilter::new(args.tag_key.as_str(), args.tag_value.as_str());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("[tagmap] interrupted, cancelling discovery");
            on_signal.cancel();
        }
    });

    let result = match pipeline.run(&filter, &cancel).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("[tagmap] {}", e);
            anyhow::bail!("{e} ({})", e.remediation());
        }
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");

    Ok(())
}
