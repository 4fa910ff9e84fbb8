// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Route to integration bindings for both gateway generations.
//!
//! REST APIs (`/restapis/{id}`) list resources with their methods embedded.
//! A method whose integration was not embedded is read on its own. HTTP and
//! WebSocket APIs (`/apis/{id}`) list integrations and routes separately and
//! join them on the route target `integrations/{id}`.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;

use super::{Inspector, settle};
use crate::classifier::ServiceType;
use crate::constants::{DETAIL_INTEGRATIONS, HEADER_ACCEPT};
use crate::errors::DiscoveryError;
use crate::models::{Details, Node};
use crate::transport::AwsClient;

const SERVICE: &str = "apigateway";
const JSON: &str = "application/json";
const ROUTE_TARGET_PREFIX: &str = "integrations/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GatewayApi<'a> {
    Rest(&'a str),
    Http(&'a str),
}

impl<'a> GatewayApi<'a> {
    fn from_node(node: &'a Node) -> Option<Self> {
        let arn = node.identifier()?;
        let mut segments = arn.resource.trim_start_matches('/').split('/');
        let kind = segments.next()?;
        let id = segments.next().filter(|id| !id.is_empty())?;
        if segments.next().is_some() {
            return None;
        }
        match kind {
            "restapis" => Some(Self::Rest(id)),
            "apis" => Some(Self::Http(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RestResources {
    #[serde(default)]
    item: Vec<RestResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestResource {
    #[serde(default)]
    id: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    resource_methods: BTreeMap<String, RestMethod>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestMethod {
    #[serde(default)]
    method_integration: Option<Integration>,
}

#[derive(Debug, Default, Deserialize)]
struct Integration {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpIntegration {
    #[serde(default)]
    integration_id: String,
    #[serde(default)]
    integration_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpRoute {
    #[serde(default)]
    route_key: String,
    #[serde(default)]
    target: Option<String>,
}

pub struct ApiGatewayInspector;

impl ApiGatewayInspector {
    async fn rest_integrations(
        &self,
        client: &AwsClient,
        node: &Node,
        api_id: &str,
    ) -> Result<BTreeMap<String, String>, DiscoveryError> {
        let resources: RestResources = client
            .call_json(
                SERVICE,
                client
                    .request("GET", SERVICE, &format!("/restapis/{api_id}/resources"))
                    .with_query("embed", "methods")
                    .with_query("limit", "500")
                    .with_header(HEADER_ACCEPT, JSON),
            )
            .await?;

        let mut integrations = BTreeMap::new();
        let mut missing = Vec::new();
        for resource in &resources.item {
            for (method, detail) in &resource.resource_methods {
                let route = format!("{method} {}", resource.path);
                match detail.method_integration.as_ref().and_then(|i| i.uri.as_deref()) {
                    Some(uri) if !uri.is_empty() => {
                        integrations.insert(route, uri.to_string());
                    }
                    Some(_) => {}
                    None if !resource.id.is_empty() => {
                        missing.push((route, resource.id.as_str(), method.as_str()))
                    }
                    None => {}
                }
            }
        }

        let lookups = missing.into_iter().map(|(route, resource_id, method)| async move {
            let path =
                format!("/restapis/{api_id}/resources/{resource_id}/methods/{method}/integration");
            let request = client
                .request("GET", SERVICE, &path)
                .with_header(HEADER_ACCEPT, JSON);
            (route, client.call_json::<Integration>(SERVICE, request).await)
        });

        for (route, result) in join_all(lookups).await {
            if let Some(uri) = settle(self.family(), node, "GetIntegration", result)
                .and_then(|integration| integration.uri)
                .filter(|uri| !uri.is_empty())
            {
                integrations.insert(route, uri);
            }
        }

        Ok(integrations)
    }

    async fn http_integrations(
        &self,
        client: &AwsClient,
        node: &Node,
        api_id: &str,
    ) -> Result<BTreeMap<String, String>, DiscoveryError> {
        let integrations = client.call_json::<Items<HttpIntegration>>(
            SERVICE,
            client
                .request("GET", SERVICE, &format!("/v2/apis/{api_id}/integrations"))
                .with_header(HEADER_ACCEPT, JSON),
        );
        let routes = client.call_json::<Items<HttpRoute>>(
            SERVICE,
            client
                .request("GET", SERVICE, &format!("/v2/apis/{api_id}/routes"))
                .with_header(HEADER_ACCEPT, JSON),
        );
        let (integrations, routes) = tokio::join!(integrations, routes);

        // routes alone name no target
        let integrations = integrations?;
        let routes = settle(self.family(), node, "GetRoutes", routes);

        let targets: BTreeMap<&str, &str> = integrations
            .items
            .iter()
            .filter_map(|integration| {
                let uri = integration.integration_uri.as_deref()?;
                (!uri.is_empty()).then_some((integration.integration_id.as_str(), uri))
            })
            .collect();

        let mut bindings = BTreeMap::new();
        let mut routed = HashSet::new();
        for route in routes.iter().flat_map(|routes| routes.items.iter()) {
            let Some(integration_id) = route
                .target
                .as_deref()
                .and_then(|target| target.strip_prefix(ROUTE_TARGET_PREFIX))
            else {
                continue;
            };
            if let Some(uri) = targets.get(integration_id) {
                bindings.insert(route.route_key.clone(), uri.to_string());
                routed.insert(integration_id);
            }
        }

        for (integration_id, uri) in &targets {
            if !routed.contains(integration_id) {
                bindings.insert(format!("{ROUTE_TARGET_PREFIX}{integration_id}"), uri.to_string());
            }
        }

        Ok(bindings)
    }
}

#[async_trait]
impl Inspector for ApiGatewayInspector {
    fn family(&self) -> &'static str {
        "apigateway"
    }

    fn owned_keys(&self) -> &'static [&'static str] {
        &[DETAIL_INTEGRATIONS]
    }

    fn accepts(&self, node: &Node) -> bool {
        node.service_type == ServiceType::ApiGateway && GatewayApi::from_node(node).is_some()
    }

    async fn inspect(&self, client: &AwsClient, node: &Node) -> Result<Details, DiscoveryError> {
        let integrations = match GatewayApi::from_node(node) {
            Some(GatewayApi::Rest(id)) => self.rest_integrations(client, node, id).await?,
            Some(GatewayApi::Http(id)) => self.http_integrations(client, node, id).await?,
            None => {
                return Err(DiscoveryError::Configuration(format!(
                    "{} is not a gateway API identifier",
                    node.arn()
                )));
            }
        };

        let mut details = Details::new();
        details.insert_map(DETAIL_INTEGRATIONS, integrations);
        Ok(details)
    }
}
