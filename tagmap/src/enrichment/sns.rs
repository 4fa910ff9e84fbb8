// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use async_trait::async_trait;
use serde::Deserialize;

use super::{Inspector, XmlMembers, push_unique};
use crate::classifier::ServiceType;
use crate::constants::{DETAIL_SUBSCRIPTIONS, MAX_SUBSCRIPTION_PAGES};
use crate::errors::DiscoveryError;
use crate::models::{Details, Node};
use crate::transport::AwsClient;

const SERVICE: &str = "sns";
const API_VERSION: &str = "2010-03-31";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListSubscriptionsByTopicResponse {
    list_subscriptions_by_topic_result: ListSubscriptionsByTopicResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListSubscriptionsByTopicResult {
    #[serde(default)]
    subscriptions: XmlMembers<Subscription>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Subscription {
    #[serde(default)]
    endpoint: String,
}

/// Subscriber endpoints of a topic.
pub struct TopicInspector;

#[async_trait]
impl Inspector for TopicInspector {
    fn family(&self) -> &'static str {
        "sns"
    }

    fn owned_keys(&self) -> &'static [&'static str] {
        &[DETAIL_SUBSCRIPTIONS]
    }

    /// Topics only; subscription identifiers carry an extra `:` segment.
    fn accepts(&self, node: &Node) -> bool {
        node.service_type == ServiceType::Sns
            && node
                .identifier()
                .is_some_and(|arn| !arn.resource.is_empty() && !arn.resource.contains(':'))
    }

    async fn inspect(&self, client: &AwsClient, node: &Node) -> Result<Details, DiscoveryError> {
        let mut endpoints = Vec::new();
        let mut token: Option<String> = None;

        for page in 0..MAX_SUBSCRIPTION_PAGES {
            let mut request = client
                .request("GET", SERVICE, "/")
                .with_query("Action", "ListSubscriptionsByTopic")
                .with_query("Version", API_VERSION)
                .with_query("TopicArn", node.arn());
            if let Some(token) = &token {
                request = request.with_query("NextToken", token.as_str());
            }

            let response = match client
                .call_xml::<ListSubscriptionsByTopicResponse>(SERVICE, request)
                .await
            {
                Ok(response) => response.list_subscriptions_by_topic_result,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "[tagmap] sns subscriptions page {} for {} failed: {}",
                        page + 1,
                        node.id,
                        e
                    );
                    break;
                }
            };

            for subscription in &response.subscriptions.member {
                push_unique(&mut endpoints, &subscription.endpoint);
            }

            match response.next_token.filter(|next| !next.is_empty()) {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        let mut details = Details::new();
        details.insert_list(DETAIL_SUBSCRIPTIONS, endpoints);
        Ok(details)
    }
}
