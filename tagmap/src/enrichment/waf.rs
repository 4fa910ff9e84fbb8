// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use super::{Inspector, push_unique, settle};
use crate::classifier::ServiceType;
use crate::constants::{
    AMZ_JSON_1_1, DETAIL_PROTECTED_RESOURCES, HEADER_AMZ_TARGET, HEADER_CONTENT_TYPE,
};
use crate::errors::DiscoveryError;
use crate::models::{Details, Node};
use crate::transport::AwsClient;

const SERVICE: &str = "wafv2";
const LIST_RESOURCES_TARGET: &str = "AWSWAF_20190729.ListResourcesForWebACL";

/// Resource types a regional web ACL can be associated with.
pub const PROTECTED_RESOURCE_TYPES: &[&str] = &[
    "APPLICATION_LOAD_BALANCER",
    "API_GATEWAY",
    "APPSYNC",
    "COGNITO_USER_POOL",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListResourcesForWebAclRequest<'a> {
    #[serde(rename = "WebACLArn")]
    web_acl_arn: &'a str,
    resource_type: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListResourcesForWebAclResponse {
    #[serde(default)]
    resource_arns: Vec<String>,
}

/// Resources a regional web ACL is attached to.
pub struct WebAclInspector;

impl WebAclInspector {
    async fn list(
        client: &AwsClient,
        web_acl_arn: &str,
        resource_type: &str,
    ) -> Result<Vec<String>, DiscoveryError> {
        let body = serde_json::to_string(&ListResourcesForWebAclRequest {
            web_acl_arn,
            resource_type,
        })
        .map_err(|e| DiscoveryError::Configuration(format!("unable to encode request: {e}")))?;

        let request = client
            .request("POST", SERVICE, "/")
            .with_header(HEADER_AMZ_TARGET, LIST_RESOURCES_TARGET)
            .with_header(HEADER_CONTENT_TYPE, AMZ_JSON_1_1)
            .with_body(body);
        let response: ListResourcesForWebAclResponse = client.call_json(SERVICE, request).await?;
        Ok(response.resource_arns)
    }
}

#[async_trait]
impl Inspector for WebAclInspector {
    fn family(&self) -> &'static str {
        "wafv2"
    }

    fn owned_keys(&self) -> &'static [&'static str] {
        &[DETAIL_PROTECTED_RESOURCES]
    }

    fn accepts(&self, node: &Node) -> bool {
        node.service_type == ServiceType::Waf
            && node
                .identifier()
                .is_some_and(|arn| arn.resource.starts_with("regional/webacl/"))
    }

    async fn inspect(&self, client: &AwsClient, node: &Node) -> Result<Details, DiscoveryError> {
        let lookups = PROTECTED_RESOURCE_TYPES
            .iter()
            .map(|resource_type| Self::list(client, node.arn(), resource_type));
        let results = join_all(lookups).await;

        if results.iter().all(Result::is_err) {
            if let Some(Err(e)) = results.first() {
                return Err(e.clone());
            }
        }

        let mut protected = Vec::new();
        for (resource_type, result) in PROTECTED_RESOURCE_TYPES.iter().zip(results) {
            if let Some(arns) = settle(self.family(), node, resource_type, result) {
                for arn in &arns {
                    push_unique(&mut protected, arn);
                }
            }
        }

        let mut details = Details::new();
        details.insert_list(DETAIL_PROTECTED_RESOURCES, protected);
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, Reply, body_json, client, node, target};
    use serde_json::json;
    use std::sync::Arc;

    const WEB_ACL: &str =
        "arn:aws:wafv2:us-east-1:123456789012:regional/webacl/shop-acl/a1b2c3d4-5678-90ab-cdef-EXAMPLE11111";
    const BALANCER: &str =
        "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/app/web/50dc6c495c0c9188";

    #[test]
    fn test_accepts_regional_acls_only() {
        assert!(WebAclInspector.accepts(&node(WEB_ACL)));
        assert!(!WebAclInspector.accepts(&node(
            "arn:aws:wafv2:us-east-1:123456789012:global/webacl/edge/a1b2"
        )));
        assert!(!WebAclInspector.accepts(&node(
            "arn:aws:wafv2:us-east-1:123456789012:regional/ipset/blocked/a1b2"
        )));
    }

    #[tokio::test]
    async fn test_queries_each_resource_type() {
        let transport = Arc::new(MockTransport::new(|request| {
            assert_eq!(target(request), Some(LIST_RESOURCES_TARGET));
            let body = body_json(request);
            assert_eq!(body["WebACLArn"], WEB_ACL);
            match body["ResourceType"].as_str() {
                Some("APPLICATION_LOAD_BALANCER") => Reply::json(json!({"ResourceArns": [BALANCER]})),
                Some("API_GATEWAY") => Reply::json(json!({"ResourceArns": [
                    "arn:aws:apigateway:us-east-1::/restapis/a1b2c3/stages/prod"
                ]})),
                Some("APPSYNC") => Reply::status(400, "WAFInvalidParameterException"),
                _ => Reply::json(json!({"ResourceArns": []})),
            }
        }));

        let details = WebAclInspector
            .inspect(&client(transport.clone()), &node(WEB_ACL))
            .await
            .unwrap();

        assert_eq!(transport.call_count(), PROTECTED_RESOURCE_TYPES.len());
        assert_eq!(
            details.protected_resources(),
            [
                BALANCER.to_string(),
                "arn:aws:apigateway:us-east-1::/restapis/a1b2c3/stages/prod".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_all_failures_is_error() {
        let transport = Arc::new(MockTransport::new(|_| Reply::status(403, "AccessDenied")));

        let err = WebAclInspector
            .inspect(&client(transport), &node(WEB_ACL))
            .await
            .unwrap_err();

        assert!(err.is_auth());
    }
}
