// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Task resource references recovered from state machine definitions.
//!
//! Two passes run over each definition. A visitor walks the parsed JSON and
//! applies [`FIELD_RULES`]; a pattern scan of the raw text then picks up
//! identifiers embedded in string fields the walk does not look at.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Inspector;
use crate::classifier::{ResourceIdentifier, ServiceType};
use crate::constants::{AMZ_JSON_1_0, DETAIL_TASK_RESOURCES, HEADER_AMZ_TARGET, HEADER_CONTENT_TYPE};
use crate::errors::DiscoveryError;
use crate::models::{Details, Node};
use crate::transport::AwsClient;

const SERVICE: &str = "states";
const DESCRIBE_STATE_MACHINE_TARGET: &str = "AWSStepFunctions.DescribeStateMachine";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// The field's string value is a reference.
    Reference,
    /// The field holds invocation parameters; see [`PARAMETER_FIELDS`].
    ParameterScope,
}

pub const FIELD_RULES: &[(&str, FieldRule)] = &[
    ("Resource", FieldRule::Reference),
    ("Parameters", FieldRule::ParameterScope),
    ("Arguments", FieldRule::ParameterScope),
];

/// Fields that name a resource when found inside a parameter scope.
pub const PARAMETER_FIELDS: &[&str] = &[
    "FunctionName",
    "TopicArn",
    "QueueUrl",
    "TableName",
    "StateMachineArn",
    "Bucket",
];

static EMBEDDED_ARN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"arn:aws[a-z-]*:[a-z0-9-]+:[a-z0-9-]*:[0-9]*:[A-Za-z0-9_+=,.@/:-]+").ok()
});

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DescribeStateMachineRequest<'a> {
    state_machine_arn: &'a str,
}

#[derive(Debug, Deserialize)]
struct DescribeStateMachineResponse {
    #[serde(default)]
    definition: String,
}

/// References found in `definition`, first-seen order, without duplicates.
pub fn extract_task_resources(definition: &str) -> Vec<String> {
    let mut references = References::default();

    match serde_json::from_str::<Value>(definition) {
        Ok(value) => visit(&value, false, &mut references),
        Err(e) => tracing::debug!("[tagmap] state machine definition is not JSON: {}", e),
    }

    if let Some(pattern) = EMBEDDED_ARN.as_ref() {
        for found in pattern.find_iter(definition) {
            references.push(found.as_str().trim_end_matches(':'));
        }
    }

    references.0
}

fn visit(value: &Value, in_parameters: bool, references: &mut References) {
    match value {
        Value::Object(fields) => {
            for (name, field) in fields {
                let rule = FIELD_RULES
                    .iter()
                    .find(|(rule_field, _)| *rule_field == name.as_str())
                    .map(|(_, rule)| *rule);

                match (rule, field) {
                    (Some(FieldRule::Reference), Value::String(reference)) => {
                        references.push(reference)
                    }
                    (Some(FieldRule::ParameterScope), _) => visit(field, true, references),
                    (_, Value::String(reference))
                        if in_parameters && PARAMETER_FIELDS.contains(&name.as_str()) =>
                    {
                        references.push(reference)
                    }
                    _ => visit(field, in_parameters, references),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                visit(item, in_parameters, references);
            }
        }
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }
}

#[derive(Debug, Default)]
struct References(Vec<String>);

impl References {
    fn push(&mut self, reference: &str) {
        if reference.is_empty() || reference.starts_with('$') || is_service_integration(reference) {
            return;
        }
        if !self.0.iter().any(|existing| existing == reference) {
            self.0.push(reference.to_string());
        }
    }
}

/// `arn:aws:states:::lambda:invoke` and friends name an integration, not a resource.
fn is_service_integration(reference: &str) -> bool {
    ResourceIdentifier::parse(reference).is_some_and(|arn| {
        arn.service == SERVICE && arn.region.is_empty() && arn.account.is_empty()
    })
}

pub struct StateMachineInspector;

#[async_trait]
impl Inspector for StateMachineInspector {
    fn family(&self) -> &'static str {
        "states"
    }

    fn owned_keys(&self) -> &'static [&'static str] {
        &[DETAIL_TASK_RESOURCES]
    }

    fn accepts(&self, node: &Node) -> bool {
        node.service_type == ServiceType::StepFunctions
            && node
                .identifier()
                .is_some_and(|arn| arn.resource_type() == "stateMachine")
    }

    async fn inspect(&self, client: &AwsClient, node: &Node) -> Result<Details, DiscoveryError> {
        let body = serde_json::to_string(&DescribeStateMachineRequest {
            state_machine_arn: node.arn(),
        })
        .map_err(|e| DiscoveryError::Configuration(format!("unable to encode request: {e}")))?;

        let request = client
            .request("POST", SERVICE, "/")
            .with_header(HEADER_AMZ_TARGET, DESCRIBE_STATE_MACHINE_TARGET)
            .with_header(HEADER_CONTENT_TYPE, AMZ_JSON_1_0)
            .with_body(body);
        let response: DescribeStateMachineResponse = client.call_json(SERVICE, request).await?;

        let mut details = Details::new();
        details.insert_list(DETAIL_TASK_RESOURCES, extract_task_resources(&response.definition));
        Ok(details)
    }
}
