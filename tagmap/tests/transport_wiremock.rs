// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Signed calls and tag discovery over a real socket.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use serde_json::json;
use tagmap::discovery::discover;
use tagmap::errors::DiscoveryError;
use tagmap::models::TagFilter;
use tagmap::transport::{AwsClient, HttpTransport};
use tagmap_signer::Credentials;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base_url: &str) -> AwsClient {
    let transport = HttpTransport::new()
        .unwrap()
        .with_endpoint_override(base_url);
    AwsClient::new(
        Arc::new(transport),
        Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
        "eu-west-1",
    )
}

fn filter() -> TagFilter {
    TagFilter::new("app", "shop")
}

#[tokio::test]
async fn test_requests_carry_signature_headers() {
    let aws = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ResourceTagMappingList": [
                {"ResourceARN": "arn:aws:sqs:eu-west-1:123456789012:jobs"}
            ]
        })))
        .expect(1)
        .mount(&aws)
        .await;

    let nodes = discover(&client_for(&aws.uri()), &filter()).await.unwrap();

    assert_eq!(nodes.len(), 1);
    let requests = aws.received_requests().await.unwrap();
    let authorization = requests[0].headers.get("authorization").unwrap().to_str().unwrap();
    assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
    assert!(authorization.contains("/eu-west-1/tagging/aws4_request"));
}

#[tokio::test]
async fn test_discovery_follows_pagination_tokens() {
    let aws = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"PaginationToken": "page-2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ResourceTagMappingList": [
                {"ResourceARN": "arn:aws:dynamodb:eu-west-1:123456789012:table/ledger"}
            ],
            "PaginationToken": ""
        })))
        .with_priority(1)
        .mount(&aws)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ResourceTagMappingList": [
                {"ResourceARN": "arn:aws:sqs:eu-west-1:123456789012:jobs"}
            ],
            "PaginationToken": "page-2"
        })))
        .mount(&aws)
        .await;

    let nodes = discover(&client_for(&aws.uri()), &filter()).await.unwrap();

    let ids: Vec<_> = nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["jobs", "ledger"]);
    assert_eq!(aws.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_throttled_response_is_rate_limit() {
    let aws = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"__type":"ThrottlingException","message":"Rate exceeded"}"#),
        )
        .mount(&aws)
        .await;

    let err = discover(&client_for(&aws.uri()), &filter()).await.unwrap_err();

    assert!(matches!(err, DiscoveryError::RateLimitOrServer { status: 400, .. }));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = discover(&client_for(&format!("http://127.0.0.1:{port}")), &filter())
        .await
        .unwrap_err();

    assert!(err.is_connectivity(), "{err:?}");
}
