// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Best-effort deep inspection of discovered nodes.
//!
//! Each [`Inspector`] owns one service family and a fixed set of reserved
//! `details` keys. Inspections run concurrently and return patches; a single
//! merge step applies them once every inspection has finished or timed out.
//! A failed or timed-out inspection leaves its node untouched.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;

use crate::constants::{INSPECTION_TIMEOUT, MAX_CONCURRENT_INSPECTIONS};
use crate::errors::DiscoveryError;
use crate::models::{Details, Node};
use crate::transport::AwsClient;

pub mod apigateway;
pub mod cloudfront;
pub mod elb;
pub mod lambda;
pub mod sns;
pub mod waf;
pub mod workflow;

pub use apigateway::ApiGatewayInspector;
pub use cloudfront::CloudFrontInspector;
pub use elb::LoadBalancerInspector;
pub use lambda::LambdaInspector;
pub use sns::TopicInspector;
pub use waf::WebAclInspector;
pub use workflow::StateMachineInspector;

#[async_trait]
pub trait Inspector: Send + Sync {
    /// Short name used in logs.
    fn family(&self) -> &'static str;

    /// The only `details` keys this inspector may write.
    fn owned_keys(&self) -> &'static [&'static str];

    fn accepts(&self, node: &Node) -> bool;

    async fn inspect(&self, client: &AwsClient, node: &Node) -> Result<Details, DiscoveryError>;
}

/// The inspectors for every supported service family.
pub fn default_inspectors() -> Vec<Box<dyn Inspector>> {
    vec![
        Box::new(LambdaInspector),
        Box::new(ApiGatewayInspector),
        Box::new(LoadBalancerInspector),
        Box::new(StateMachineInspector),
        Box::new(TopicInspector),
        Box::new(WebAclInspector),
        Box::new(CloudFrontInspector),
    ]
}

/// Details produced by one inspector for one node.
#[derive(Debug)]
pub struct NodePatch {
    pub index: usize,
    pub family: &'static str,
    pub owned_keys: &'static [&'static str],
    pub details: Details,
}

pub struct Enricher {
    inspectors: Vec<Box<dyn Inspector>>,
    timeout: Duration,
    max_concurrency: usize,
}

impl Enricher {
    /// Fails if two inspectors declare the same key.
    pub fn new(inspectors: Vec<Box<dyn Inspector>>) -> Result<Self, DiscoveryError> {
        let mut seen = HashSet::new();
        for inspector in &inspectors {
            for key in inspector.owned_keys() {
                if !seen.insert(*key) {
                    return Err(DiscoveryError::Configuration(format!(
                        "details key '{key}' is claimed by more than one inspector (last: {})",
                        inspector.family()
                    )));
                }
            }
        }

        Ok(Self {
            inspectors,
            timeout: INSPECTION_TIMEOUT,
            max_concurrency: MAX_CONCURRENT_INSPECTIONS,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Inspects every accepted node and merges the results into `nodes`.
    #[tracing::instrument(skip_all, fields(nodes = nodes.len()))]
    pub async fn enrich(&self, client: &AwsClient, nodes: &mut [Node]) {
        let patches = self.collect_patches(client, nodes).await;
        let applied = patches.len();

        for patch in patches {
            if let Some(node) = nodes.get_mut(patch.index) {
                merge(node, patch);
            }
        }

        tracing::info!("[tagmap] applied {} enrichment patches", applied);
    }

    async fn collect_patches(&self, client: &AwsClient, nodes: &[Node]) -> Vec<NodePatch> {
        let jobs: Vec<(&dyn Inspector, usize, &Node)> = self
            .inspectors
            .iter()
            .flat_map(|inspector| {
                nodes
                    .iter()
                    .enumerate()
                    .filter(move |(_, node)| inspector.accepts(node))
                    .map(move |(index, node)| (inspector.as_ref(), index, node))
            })
            .collect();

        let timeout = self.timeout;
        let futures: Vec<_> = jobs
            .into_iter()
            .map(|(inspector, index, node)| inspect_one(inspector, client, index, node, timeout))
            .collect();
        let mut patches: Vec<NodePatch> = stream::iter(futures)
            .buffer_unordered(self.max_concurrency)
            .filter_map(futures::future::ready)
            .collect()
            .await;

        patches.sort_by_key(|patch| (patch.index, patch.family));
        patches
    }
}

async fn inspect_one(
    inspector: &dyn Inspector,
    client: &AwsClient,
    index: usize,
    node: &Node,
    timeout: Duration,
) -> Option<NodePatch> {
    match tokio::time::timeout(timeout, inspector.inspect(client, node)).await {
        Ok(Ok(details)) => Some(NodePatch {
            index,
            family: inspector.family(),
            owned_keys: inspector.owned_keys(),
            details,
        }),
        Ok(Err(e)) => {
            tracing::warn!(
                "[tagmap] {} inspection of {} failed: {} ({})",
                inspector.family(),
                node.id,
                e,
                e.remediation()
            );
            None
        }
        Err(_) => {
            tracing::warn!(
                "[tagmap] {} inspection of {} timed out after {:?}",
                inspector.family(),
                node.id,
                timeout
            );
            None
        }
    }
}

/// Adds the patch's keys to the node, dropping any key the inspector does not own.
pub fn merge(node: &mut Node, patch: NodePatch) {
    for (key, value) in patch.details {
        if patch.owned_keys.contains(&key.as_str()) {
            node.details.insert(key, value);
        } else {
            tracing::warn!(
                "[tagmap] dropping undeclared key '{}' from {} inspection of {}",
                key,
                patch.family,
                node.id
            );
        }
    }
}

/// Keeps the value of an optional sub-call, logging the failure otherwise.
pub(crate) fn settle<T>(
    family: &str,
    node: &Node,
    call: &str,
    result: Result<T, DiscoveryError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                "[tagmap] {} {} for {} failed: {}",
                family,
                call,
                node.id,
                e
            );
            None
        }
    }
}

/// Repeated `<member>` children of a query API list element.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct XmlMembers<T> {
    #[serde(default)]
    pub member: Vec<T>,
}

impl<T> Default for XmlMembers<T> {
    fn default() -> Self {
        Self { member: Vec::new() }
    }
}

/// Appends `value` unless it is empty or already present.
pub(crate) fn push_unique(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|existing| existing == value) {
        values.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ServiceType;
    use crate::constants::{DETAIL_RUNTIME, DETAIL_TRIGGERS};
    use crate::testing::{MockTransport, Reply, client, node};
    use std::sync::Arc;

    struct Fixed {
        family: &'static str,
        keys: &'static [&'static str],
        service_type: ServiceType,
        patch: fn() -> Details,
    }

    #[async_trait]
    impl Inspector for Fixed {
        fn family(&self) -> &'static str {
            self.family
        }

        fn owned_keys(&self) -> &'static [&'static str] {
            self.keys
        }

        fn accepts(&self, node: &Node) -> bool {
            node.service_type == self.service_type
        }

        async fn inspect(&self, _: &AwsClient, _: &Node) -> Result<Details, DiscoveryError> {
            Ok((self.patch)())
        }
    }

    #[test]
    fn test_default_inspectors_have_disjoint_keys() {
        assert!(Enricher::new(default_inspectors()).is_ok());
    }

    #[test]
    fn test_overlapping_keys_rejected() {
        let inspectors: Vec<Box<dyn Inspector>> = vec![
            Box::new(Fixed {
                family: "a",
                keys: &[DETAIL_RUNTIME],
                service_type: ServiceType::Lambda,
                patch: Details::new,
            }),
            Box::new(Fixed {
                family: "b",
                keys: &[DETAIL_RUNTIME],
                service_type: ServiceType::Sqs,
                patch: Details::new,
            }),
        ];
        let err = Enricher::new(inspectors).err().unwrap();
        assert!(matches!(err, DiscoveryError::Configuration(_)));
    }

    #[test]
    fn test_merge_drops_undeclared_keys() {
        let mut target = node("arn:aws:lambda:us-east-1:123456789012:function:orders");
        let mut details = Details::new();
        details.insert_text(DETAIL_RUNTIME, "python3.12");
        details.insert_text("surprise", "value");

        merge(
            &mut target,
            NodePatch {
                index: 0,
                family: "lambda",
                owned_keys: &[DETAIL_RUNTIME],
                details,
            },
        );

        assert_eq!(target.details.runtime(), Some("python3.12"));
        assert!(!target.details.contains_key("surprise"));
        assert!(target.details.arn().is_some());
    }

    #[tokio::test]
    async fn test_only_accepted_nodes_are_patched() {
        let inspectors: Vec<Box<dyn Inspector>> = vec![Box::new(Fixed {
            family: "fixed",
            keys: &[DETAIL_TRIGGERS],
            service_type: ServiceType::Lambda,
            patch: || {
                let mut details = Details::new();
                details.insert_list(DETAIL_TRIGGERS, vec!["queue".to_string()]);
                details
            },
        })];
        let enricher = Enricher::new(inspectors).unwrap();
        let transport = Arc::new(MockTransport::new(|_| Reply::ok("{}")));
        let mut nodes = vec![
            node("arn:aws:lambda:us-east-1:123456789012:function:orders"),
            node("arn:aws:sqs:us-east-1:123456789012:jobs"),
        ];

        enricher.enrich(&client(transport), &mut nodes).await;

        assert_eq!(nodes[0].details.triggers(), ["queue".to_string()]);
        assert!(nodes[1].details.triggers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_leaves_node_unchanged_and_others_enriched() {
        let transport = Arc::new(MockTransport::new(|request| {
            if request.path.contains("/functions/slow/") || request.query_string.contains("slow") {
                Reply::Hang
            } else if request.path.ends_with("/configuration") {
                Reply::json(serde_json::json!({"Runtime": "nodejs20.x"}))
            } else {
                Reply::json(serde_json::json!({"EventSourceMappings": []}))
            }
        }));
        let enricher = Enricher::new(default_inspectors())
            .unwrap()
            .with_timeout(Duration::from_secs(1));
        let mut nodes = vec![
            node("arn:aws:lambda:us-east-1:123456789012:function:slow"),
            node("arn:aws:lambda:us-east-1:123456789012:function:fast"),
        ];
        let before = nodes[0].clone();

        enricher.enrich(&client(transport), &mut nodes).await;

        assert_eq!(nodes[0], before);
        assert_eq!(nodes[1].details.runtime(), Some("nodejs20.x"));
    }

    #[tokio::test]
    async fn test_failed_inspection_leaves_node_unchanged() {
        let transport = Arc::new(MockTransport::new(|_| Reply::status(403, "AccessDenied")));
        let enricher = Enricher::new(default_inspectors()).unwrap();
        let mut nodes = vec![node("arn:aws:lambda:us-east-1:123456789012:function:orders")];
        let before = nodes.clone();

        enricher.enrich(&client(transport), &mut nodes).await;

        assert_eq!(nodes, before);
    }

    #[test]
    fn test_push_unique() {
        let mut values = Vec::new();
        push_unique(&mut values, "a");
        push_unique(&mut values, "");
        push_unique(&mut values, "a");
        push_unique(&mut values, "b");
        assert_eq!(values, vec!["a", "b"]);
    }
}
