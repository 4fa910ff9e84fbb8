// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Recording in-memory transport for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tagmap_signer::{Credentials, SignedRequest};

use crate::classifier::{classify, extract_local_name};
use crate::constants::DETAIL_ARN;
use crate::errors::DiscoveryError;
use crate::models::{Details, Node};
use crate::transport::{AwsClient, HttpResponse, Transport};

pub enum Reply {
    Respond(Result<HttpResponse, DiscoveryError>),
    /// Never answers; used to drive timeouts and cancellation.
    Hang,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self::ok(value.to_string())
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Respond(Ok(HttpResponse::new(status, body)))
    }

    pub fn error(error: DiscoveryError) -> Self {
        Self::Respond(Err(error))
    }
}

type Handler = Box<dyn Fn(&SignedRequest) -> Reply + Send + Sync>;

pub struct MockTransport {
    handler: Handler,
    calls: Mutex<Vec<SignedRequest>>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&SignedRequest) -> Reply + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<SignedRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: SignedRequest) -> Result<HttpResponse, DiscoveryError> {
        let reply = (self.handler)(&request);
        self.calls.lock().unwrap().push(request);
        match reply {
            Reply::Respond(result) => result,
            Reply::Hang => std::future::pending().await,
        }
    }
}

pub fn client(transport: std::sync::Arc<MockTransport>) -> AwsClient {
    AwsClient::new(transport, Credentials::new("AKIDEXAMPLE", "SECRET"), "us-east-1")
}

/// `X-Amz-Target` of a JSON protocol call.
pub fn target(request: &SignedRequest) -> Option<&str> {
    request.headers.get("x-amz-target").map(String::as_str)
}

/// `Action` of a query protocol call.
pub fn action(request: &SignedRequest) -> Option<&str> {
    request
        .query_string
        .split('&')
        .find_map(|pair| pair.strip_prefix("Action="))
}

pub fn body_json(request: &SignedRequest) -> serde_json::Value {
    serde_json::from_str(&request.body).unwrap_or(serde_json::Value::Null)
}

/// A freshly discovered node for `arn`, id and label set to its local name.
pub fn node(arn: &str) -> Node {
    let mut details = Details::new();
    details.insert_text(DETAIL_ARN, arn);
    Node {
        id: extract_local_name(arn).to_string(),
        label: extract_local_name(arn).to_string(),
        service_type: classify(arn),
        details,
        parent_id: None,
    }
}
