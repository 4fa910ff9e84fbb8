// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;

use super::{Inspector, XmlMembers, push_unique, settle};
use crate::classifier::ServiceType;
use crate::constants::{DETAIL_TARGET_GROUPS, DETAIL_TARGETS};
use crate::errors::DiscoveryError;
use crate::models::{Details, Node};
use crate::transport::AwsClient;

const SERVICE: &str = "elasticloadbalancing";
const API_VERSION: &str = "2015-12-01";

/// Balancer kinds that expose target groups.
const TARGET_GROUP_BALANCERS: &[&str] =
    &["loadbalancer/app/", "loadbalancer/net/", "loadbalancer/gwy/"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeTargetGroupsResponse {
    describe_target_groups_result: DescribeTargetGroupsResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeTargetGroupsResult {
    #[serde(default)]
    target_groups: XmlMembers<TargetGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TargetGroup {
    target_group_arn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeTargetHealthResponse {
    describe_target_health_result: DescribeTargetHealthResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeTargetHealthResult {
    #[serde(default)]
    target_health_descriptions: XmlMembers<TargetHealthDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TargetHealthDescription {
    target: Target,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Target {
    id: String,
}

/// Balancer to target group to target chains.
///
/// Balancer nodes get both their target groups and the union of every
/// group's registered targets. Target group nodes get their own targets.
pub struct LoadBalancerInspector;

impl LoadBalancerInspector {
    async fn target_groups(
        client: &AwsClient,
        balancer_arn: &str,
    ) -> Result<Vec<String>, DiscoveryError> {
        let request = client
            .request("GET", SERVICE, "/")
            .with_query("Action", "DescribeTargetGroups")
            .with_query("Version", API_VERSION)
            .with_query("LoadBalancerArn", balancer_arn);
        let response: DescribeTargetGroupsResponse = client.call_xml(SERVICE, request).await?;

        let mut groups = Vec::new();
        for group in &response.describe_target_groups_result.target_groups.member {
            push_unique(&mut groups, &group.target_group_arn);
        }
        Ok(groups)
    }

    async fn targets(client: &AwsClient, group_arn: &str) -> Result<Vec<String>, DiscoveryError> {
        let request = client
            .request("GET", SERVICE, "/")
            .with_query("Action", "DescribeTargetHealth")
            .with_query("Version", API_VERSION)
            .with_query("TargetGroupArn", group_arn);
        let response: DescribeTargetHealthResponse = client.call_xml(SERVICE, request).await?;

        let mut targets = Vec::new();
        let descriptions = &response.describe_target_health_result.target_health_descriptions;
        for description in &descriptions.member {
            push_unique(&mut targets, &description.target.id);
        }
        Ok(targets)
    }
}

#[async_trait]
impl Inspector for LoadBalancerInspector {
    fn family(&self) -> &'static str {
        "elasticloadbalancing"
    }

    fn owned_keys(&self) -> &'static [&'static str] {
        &[DETAIL_TARGET_GROUPS, DETAIL_TARGETS]
    }

    fn accepts(&self, node: &Node) -> bool {
        match node.service_type {
            ServiceType::TargetGroup => true,
            ServiceType::LoadBalancer => node.identifier().is_some_and(|arn| {
                TARGET_GROUP_BALANCERS
                    .iter()
                    .any(|prefix| arn.resource.starts_with(prefix))
            }),
            _ => false,
        }
    }

    async fn inspect(&self, client: &AwsClient, node: &Node) -> Result<Details, DiscoveryError> {
        let mut details = Details::new();

        if node.service_type == ServiceType::TargetGroup {
            details.insert_list(DETAIL_TARGETS, Self::targets(client, node.arn()).await?);
            return Ok(details);
        }

        let groups = Self::target_groups(client, node.arn()).await?;
        let lookups = groups.iter().map(|group| Self::targets(client, group));

        let mut targets = Vec::new();
        for result in join_all(lookups).await {
            if let Some(found) = settle(self.family(), node, "DescribeTargetHealth", result) {
                for target in &found {
                    push_unique(&mut targets, target);
                }
            }
        }

        details.insert_list(DETAIL_TARGET_GROUPS, groups);
        details.insert_list(DETAIL_TARGETS, targets);
        Ok(details)
    }
}
