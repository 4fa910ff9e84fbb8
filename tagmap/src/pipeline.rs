// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::constants::{INSPECTION_TIMEOUT, MAX_CONCURRENT_INSPECTIONS};
use crate::discovery::discover;
use crate::enrichment::{Enricher, default_inspectors};
use crate::errors::DiscoveryError;
use crate::models::{ArchitectureResult, TagFilter};
use crate::topology;
use crate::transport::AwsClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub inspection_timeout: Duration,
    pub max_concurrent_inspections: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            inspection_timeout: INSPECTION_TIMEOUT,
            max_concurrent_inspections: MAX_CONCURRENT_INSPECTIONS,
        }
    }
}

/// Discovery, enrichment and topology inference for one account and region.
pub struct Pipeline {
    client: AwsClient,
    enricher: Enricher,
}

impl Pipeline {
    pub fn new(client: AwsClient, options: PipelineOptions) -> Result<Self, DiscoveryError> {
        let enricher = Enricher::new(default_inspectors())?
            .with_timeout(options.inspection_timeout)
            .with_max_concurrency(options.max_concurrent_inspections);
        Ok(Self { client, enricher })
    }

    /// Runs the whole pipeline, or returns [`DiscoveryError::Cancelled`] as soon
    /// as `cancel` fires. Nothing partial is returned on cancellation.
    #[tracing::instrument(skip(self, cancel), fields(region = self.client.region()))]
    pub async fn run(
        &self,
        filter: &TagFilter,
        cancel: &CancellationToken,
    ) -> Result<ArchitectureResult, DiscoveryError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!("[tagmap] discovery cancelled");
                Err(DiscoveryError::Cancelled)
            }
            result = self.run_to_completion(filter) => result,
        }
    }

    async fn run_to_completion(
        &self,
        filter: &TagFilter,
    ) -> Result<ArchitectureResult, DiscoveryError> {
        let mut nodes = discover(&self.client, filter).await?;
        if nodes.is_empty() {
            return Err(DiscoveryError::EmptyResult {
                key: filter.key.clone(),
                value: filter.value.clone(),
            });
        }

        self.enricher.enrich(&self.client, &mut nodes).await;

        let edges = topology::build(&nodes);

        Ok(ArchitectureResult { nodes, edges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, Reply, client, target};
    use serde_json::json;
    use std::sync::Arc;

    fn filter() -> TagFilter {
        TagFilter::new("app", "shop")
    }

    #[tokio::test]
    async fn test_auth_failure_stops_before_enrichment() {
        let transport = Arc::new(MockTransport::new(|_| Reply::status(403, "AccessDenied")));
        let pipeline =
            Pipeline::new(client(transport.clone()), PipelineOptions::default()).unwrap();

        let err = pipeline
            .run(&filter(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_auth());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_discovery_is_distinct_error() {
        let transport = Arc::new(MockTransport::new(|_| {
            Reply::json(json!({"ResourceTagMappingList": [
                {"ResourceARN": "arn:aws:ec2:us-east-1:123456789012:volume/vol-1", "Tags": []}
            ]}))
        }));
        let pipeline = Pipeline::new(client(transport), PipelineOptions::default()).unwrap();

        let err = pipeline
            .run(&filter(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DiscoveryError::EmptyResult {
                key: "app".to_string(),
                value: "shop".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_cancellation_discards_run() {
        let transport = Arc::new(MockTransport::new(|_| Reply::Hang));
        let pipeline = Pipeline::new(client(transport), PipelineOptions::default()).unwrap();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = pipeline.run(&filter(), &cancel).await.unwrap_err();

        assert_eq!(err, DiscoveryError::Cancelled);
    }

    #[tokio::test]
    async fn test_end_to_end_with_enrichment() {
        let transport = Arc::new(MockTransport::new(|request| match target(request) {
            Some(crate::constants::TAGGING_GET_RESOURCES_TARGET) => Reply::json(json!({
                "ResourceTagMappingList": [
                    {"ResourceARN": "arn:aws:lambda:us-east-1:123456789012:function:orders", "Tags": [{"Key": "app", "Value": "shop"}]},
                    {"ResourceARN": "arn:aws:sqs:us-east-1:123456789012:jobs", "Tags": [{"Key": "app", "Value": "shop"}]},
                    {"ResourceARN": "arn:aws:dynamodb:us-east-1:123456789012:table/ledger", "Tags": [{"Key": "app", "Value": "shop"}]}
                ]
            })),
            _ if request.path.ends_with("/configuration") => Reply::json(json!({
                "Runtime": "nodejs20.x",
                "Environment": {"Variables": {"LEDGER_TABLE": "ledger"}}
            })),
            _ => Reply::json(json!({"EventSourceMappings": [
                {"EventSourceArn": "arn:aws:sqs:us-east-1:123456789012:jobs"}
            ]})),
        }));
        let pipeline = Pipeline::new(client(transport), PipelineOptions::default()).unwrap();

        let result = pipeline.run(&filter(), &CancellationToken::new()).await.unwrap();

        assert_eq!(result.nodes.len(), 3);
        assert_eq!(result.nodes[0].details.runtime(), Some("nodejs20.x"));
        let edges: Vec<_> = result
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str(), e.label.as_deref()))
            .collect();
        assert_eq!(
            edges,
            vec![
                ("jobs", "orders", Some("trigger")),
                ("orders", "ledger", Some("LEDGER_TABLE")),
            ]
        );
    }
}
