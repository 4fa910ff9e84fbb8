// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use async_trait::async_trait;
use serde::Deserialize;
use tagmap_signer::SignableRequest;

use super::{Inspector, push_unique};
use crate::classifier::ServiceType;
use crate::constants::DETAIL_ORIGINS;
use crate::errors::DiscoveryError;
use crate::models::{Details, Node};
use crate::transport::{AwsClient, parse_xml};

const SERVICE: &str = "cloudfront";
/// CloudFront has a single global endpoint.
const HOST: &str = "cloudfront.amazonaws.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DistributionConfig {
    #[serde(default)]
    origins: Option<Origins>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Origins {
    #[serde(default)]
    items: Option<OriginItems>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OriginItems {
    #[serde(default)]
    origin: Vec<Origin>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Origin {
    #[serde(default)]
    domain_name: String,
}

/// Origin domains of a distribution.
pub struct CloudFrontInspector;

impl CloudFrontInspector {
    fn distribution_id(node: &Node) -> Option<&str> {
        let arn = node.identifier()?;
        arn.resource
            .strip_prefix("distribution/")
            .filter(|id| !id.is_empty() && !id.contains('/'))
    }
}

#[async_trait]
impl Inspector for CloudFrontInspector {
    fn family(&self) -> &'static str {
        "cloudfront"
    }

    fn owned_keys(&self) -> &'static [&'static str] {
        &[DETAIL_ORIGINS]
    }

    fn accepts(&self, node: &Node) -> bool {
        node.service_type == ServiceType::CloudFront && Self::distribution_id(node).is_some()
    }

    async fn inspect(&self, client: &AwsClient, node: &Node) -> Result<Details, DiscoveryError> {
        let id = Self::distribution_id(node).ok_or_else(|| {
            DiscoveryError::Configuration(format!(
                "{} is not a distribution identifier",
                node.arn()
            ))
        })?;

        let request =
            SignableRequest::new("GET", HOST, format!("/2020-05-31/distribution/{id}/config"));
        let body = client.call_global(SERVICE, request).await?;
        let config: DistributionConfig = parse_xml(&body)?;

        let mut origins = Vec::new();
        for origin in config
            .origins
            .and_then(|origins| origins.items)
            .unwrap_or_default()
            .origin
        {
            push_unique(&mut origins, &origin.domain_name);
        }

        let mut details = Details::new();
        details.insert_list(DETAIL_ORIGINS, origins);
        Ok(details)
    }
}
