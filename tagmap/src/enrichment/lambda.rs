// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Inspector, push_unique, settle};
use crate::classifier::ServiceType;
use crate::constants::{DETAIL_ENV_VARS, DETAIL_RUNTIME, DETAIL_TRIGGERS};
use crate::errors::DiscoveryError;
use crate::models::{Details, Node};
use crate::transport::AwsClient;

const SERVICE: &str = "lambda";
const API_VERSION_PATH: &str = "/2015-03-31";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FunctionConfiguration {
    #[serde(default)]
    runtime: Option<String>,
    #[serde(default)]
    environment: Option<Environment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Environment {
    #[serde(default)]
    variables: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EventSourceMappings {
    #[serde(default)]
    event_source_mappings: Vec<EventSourceMapping>,
}

#[derive(Debug, Deserialize)]
struct EventSourceMapping {
    #[serde(rename = "EventSourceArn", default)]
    event_source_arn: Option<String>,
}

/// Function runtime, environment and event-source bindings.
pub struct LambdaInspector;

impl LambdaInspector {
    fn function_name(node: &Node) -> Option<&str> {
        let arn = node.identifier()?;
        arn.resource
            .strip_prefix("function:")
            .and_then(|rest| rest.split(':').next())
            .filter(|name| !name.is_empty())
    }
}

#[async_trait]
impl Inspector for LambdaInspector {
    fn family(&self) -> &'static str {
        "lambda"
    }

    fn owned_keys(&self) -> &'static [&'static str] {
        &[DETAIL_RUNTIME, DETAIL_ENV_VARS, DETAIL_TRIGGERS]
    }

    fn accepts(&self, node: &Node) -> bool {
        node.service_type == ServiceType::Lambda && Self::function_name(node).is_some()
    }

    async fn inspect(&self, client: &AwsClient, node: &Node) -> Result<Details, DiscoveryError> {
        let name = Self::function_name(node).ok_or_else(|| {
            DiscoveryError::Configuration(format!("{} is not a function identifier", node.arn()))
        })?;

        let configuration = client.call_json::<FunctionConfiguration>(
            SERVICE,
            client.request(
                "GET",
                SERVICE,
                &format!("{API_VERSION_PATH}/functions/{name}/configuration"),
            ),
        );
        let mappings = client.call_json::<EventSourceMappings>(
            SERVICE,
            client
                .request("GET", SERVICE, &format!("{API_VERSION_PATH}/event-source-mappings/"))
                .with_query("FunctionName", name),
        );
        let (configuration, mappings) = tokio::join!(configuration, mappings);

        if let (Err(e), Err(_)) = (&configuration, &mappings) {
            return Err(e.clone());
        }

        let mut details = Details::new();

        if let Some(configuration) =
            settle(self.family(), node, "GetFunctionConfiguration", configuration)
        {
            if let Some(runtime) = configuration.runtime.filter(|r| !r.is_empty()) {
                details.insert_text(DETAIL_RUNTIME, runtime);
            }
            if let Some(environment) = configuration.environment {
                details.insert_map(DETAIL_ENV_VARS, environment.variables);
            }
        }

        if let Some(mappings) = settle(self.family(), node, "ListEventSourceMappings", mappings) {
            let mut triggers = Vec::new();
            for mapping in &mappings.event_source_mappings {
                if let Some(source) = &mapping.event_source_arn {
                    push_unique(&mut triggers, source);
                }
            }
            details.insert_list(DETAIL_TRIGGERS, triggers);
        }

        Ok(details)
    }
}
