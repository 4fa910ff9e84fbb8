// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::pipeline::PipelineOptions;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct TagmapOptions {
    /// Send every AWS call to this base URL instead of the public endpoints
    #[arg(long, global = true, env("TAGMAP_ENDPOINT_URL"))]
    pub endpoint_url: Option<String>,
    #[arg(long, global = true, default_value = "10", env("TAGMAP_REQUEST_TIMEOUT_SECS"))]
    pub request_timeout_secs: u64,
    #[arg(long, global = true, default_value = "15", env("TAGMAP_INSPECTION_TIMEOUT_SECS"))]
    pub inspection_timeout_secs: u64,
    #[arg(long, global = true, default_value = "8", env("TAGMAP_MAX_CONCURRENT_INSPECTIONS"))]
    pub max_concurrent_inspections: usize,
    #[command(subcommand)]
    pub command: Command,
}

impl TagmapOptions {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            inspection_timeout: Duration::from_secs(self.inspection_timeout_secs),
            max_concurrent_inspections: self.max_concurrent_inspections.max(1),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Discover tagged resources once and print the result as JSON
    Discover(DiscoverArgs),
    /// Serve the discovery HTTP API
    Serve(ServeArgs),
}

#[derive(Clone, Args)]
pub struct DiscoverArgs {
    #[arg(long, env("AWS_REGION"))]
    pub region: String,
    #[arg(long, env("TAGMAP_TAG_KEY"))]
    pub tag_key: String,
    #[arg(long, env("TAGMAP_TAG_VALUE"))]
    pub tag_value: String,
    #[arg(long, env("AWS_ACCESS_KEY_ID"), hide_env_values = true)]
    pub access_key_id: String,
    #[arg(long, env("AWS_SECRET_ACCESS_KEY"), hide_env_values = true)]
    pub secret_access_key: String,
    #[arg(long, default_value = "false", action = ArgAction::SetTrue)]
    pub pretty: bool,
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for DiscoverArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoverArgs")
            .field("region", &self.region)
            .field("tag_key", &self.tag_key)
            .field("tag_value", &self.tag_value)
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("pretty", &self.pretty)
            .finish()
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1", env("TAGMAP_HTTP_HOST"))]
    pub host: String,
    #[arg(long, default_value = "8080", env("TAGMAP_HTTP_PORT"))]
    pub port: u16,
}

impl Default for ServeArgs {
    fn default() -> Self {
        ServeArgs {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
