// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Tagmap
//!
//! Discovers the AWS resources carrying one tag and infers how they connect.
//!
//! ## Architecture
//!
//! ```text
//! tag filter -> discovery (tagging API) -> enrichment (per-service inspectors)
//!                                                  |
//!                                      topology (verified + fallback edges)
//!                                                  |
//!                                        { nodes, edges } as JSON
//! ```
//!
//! Every call is signed with Signature Version 4 by the `tagmap-signer` crate
//! and sent through the [`transport::Transport`] seam, so the whole pipeline
//! runs against a recording transport in tests.
//!
//! ## Modules
//!
//! - [`application`]: HTTP server setup with Axum
//! - [`classifier`]: ARN parsing and service classification
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: Limits, timeouts and reserved detail keys
//! - [`discovery`]: Paginated tag-based resource discovery
//! - [`enrichment`]: Per-service inspectors run with bounded concurrency
//! - [`errors`]: Discovery error taxonomy with HTTP response mapping
//! - [`models`]: Nodes, edges and the discover request
//! - [`pipeline`]: Discovery, enrichment and topology as one cancellable run
//! - [`routes`]: HTTP route handlers (health, discover)
//! - [`topology`]: Edge inference from enriched details
//! - [`transport`]: Signed calls to AWS endpoints
//!
//! ## Usage
//!
//! ```bash
//! tagmap discover --region eu-west-1 --tag-key app --tag-value shop --pretty
//! tagmap serve --host 127.0.0.1 --port 8080
//! ```
//!
//! ## Security Considerations
//!
//! - Credentials are held only for the duration of one run and zeroized on drop
//! - Debug output of requests and clients redacts keys and secrets
//! - Request bodies are limited to 64 KiB

pub mod application;
pub mod classifier;
pub mod configuration;
pub mod constants;
pub mod discovery;
pub mod enrichment;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod topology;
pub mod transport;

#[cfg(test)]
mod testing;
