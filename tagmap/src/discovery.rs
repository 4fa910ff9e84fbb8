// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Paginated tag query that produces the initial node set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::classifier::{classify, extract_local_name, is_significant};
use crate::constants::{
    AMZ_JSON_1_1, DETAIL_ARN, HEADER_AMZ_TARGET, HEADER_CONTENT_TYPE, RESOURCES_PER_PAGE,
    TAGGING_GET_RESOURCES_TARGET, TAGGING_SERVICE,
};
use crate::errors::DiscoveryError;
use crate::models::{Details, Node, TagFilter};
use crate::transport::AwsClient;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetResourcesRequest<'a> {
    tag_filters: [TagFilterEntry<'a>; 1],
    resources_per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TagFilterEntry<'a> {
    key: &'a str,
    values: [&'a str; 1],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetResourcesResponse {
    #[serde(default)]
    resource_tag_mapping_list: Vec<ResourceTagMapping>,
    #[serde(default)]
    pagination_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResourceTagMapping {
    #[serde(rename = "ResourceARN")]
    resource_arn: String,
    #[serde(default)]
    tags: Vec<ResourceTag>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResourceTag {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: String,
}

/// Queries the tagging API page by page until the continuation token runs out.
///
/// Any transport failure aborts the whole discovery.
#[tracing::instrument(skip(client), fields(region = client.region()))]
pub async fn discover(client: &AwsClient, filter: &TagFilter) -> Result<Vec<Node>, DiscoveryError> {
    let mut collector = NodeCollector::default();
    let mut token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch_page(client, filter, token.as_deref()).await?;
        pages += 1;

        tracing::debug!(
            "[tagmap] tagging page {} returned {} resources",
            pages,
            page.resource_tag_mapping_list.len()
        );

        for mapping in page.resource_tag_mapping_list {
            collector.add(mapping);
        }

        match page.pagination_token.filter(|next| !next.is_empty()) {
            None => break,
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                return Err(DiscoveryError::MalformedResponse(format!(
                    "tagging API returned the same pagination token twice after page {pages}"
                )));
            }
            Some(next) => token = Some(next),
        }
    }

    tracing::info!(
        "[tagmap] discovered {} resources over {} pages ({} skipped as insignificant)",
        collector.nodes.len(),
        pages,
        collector.skipped
    );

    Ok(collector.nodes)
}

async fn fetch_page(
    client: &AwsClient,
    filter: &TagFilter,
    token: Option<&str>,
) -> Result<GetResourcesResponse, DiscoveryError> {
    let body = GetResourcesRequest {
        tag_filters: [TagFilterEntry {
            key: &filter.key,
            values: [&filter.value],
        }],
        resources_per_page: RESOURCES_PER_PAGE,
        pagination_token: token,
    };
    let body = serde_json::to_string(&body)
        .map_err(|e| DiscoveryError::Configuration(format!("unable to encode tag filter: {e}")))?;

    let request = client
        .request("POST", TAGGING_SERVICE, "/")
        .with_header(HEADER_AMZ_TARGET, TAGGING_GET_RESOURCES_TARGET)
        .with_header(HEADER_CONTENT_TYPE, AMZ_JSON_1_1)
        .with_body(body);

    client.call_json(TAGGING_SERVICE, request).await
}

#[derive(Debug, Default)]
struct NodeCollector {
    nodes: Vec<Node>,
    ids: HashSet<String>,
    arns: HashSet<String>,
    skipped: usize,
}

impl NodeCollector {
    fn add(&mut self, mapping: ResourceTagMapping) {
        let arn = mapping.resource_arn;
        if !is_significant(&arn) {
            self.skipped += 1;
            return;
        }
        if !self.arns.insert(arn.clone()) {
            tracing::debug!("[tagmap] ignoring repeated resource {}", arn);
            return;
        }

        let local_name = extract_local_name(&arn);
        let id = if local_name.is_empty() || self.ids.contains(local_name) {
            arn.clone()
        } else {
            local_name.to_string()
        };
        self.ids.insert(id.clone());

        let label = name_tag(&mapping.tags)
            .unwrap_or(local_name)
            .to_string();

        let mut details = Details::new();
        for tag in mapping.tags.iter().filter(|t| !t.key.is_empty() && !t.value.is_empty()) {
            details.insert_text(tag.key.as_str(), tag.value.as_str());
        }
        details.insert_text(DETAIL_ARN, arn.as_str());

        self.nodes.push(Node {
            id,
            label,
            service_type: classify(&arn),
            details,
            parent_id: None,
        });
    }
}

fn name_tag(tags: &[ResourceTag]) -> Option<&str> {
    ["Name", "name"].iter().find_map(|wanted| {
        tags.iter()
            .find(|tag| tag.key == *wanted && !tag.value.is_empty())
            .map(|tag| tag.value.as_str())
    })
}
