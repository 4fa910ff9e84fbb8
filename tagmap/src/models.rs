// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tagmap_signer::Credentials;
use validator::Validate;
use zeroize::ZeroizeOnDrop;

use crate::classifier::{ResourceIdentifier, ServiceType};
use crate::constants::{
    DETAIL_ARN, DETAIL_ENV_VARS, DETAIL_INTEGRATIONS, DETAIL_ORIGINS, DETAIL_PROTECTED_RESOURCES,
    DETAIL_RUNTIME, DETAIL_SUBSCRIPTIONS, DETAIL_TARGET_GROUPS, DETAIL_TARGETS,
    DETAIL_TASK_RESOURCES, DETAIL_TRIGGERS, MAX_ACCESS_KEY_LENGTH, MAX_REGION_LENGTH,
    MAX_SECRET_KEY_LENGTH, MAX_TAG_KEY_LENGTH, MAX_TAG_VALUE_LENGTH,
};

/// One value in a node's `details` bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

/// Open-ended key/value bag attached to a node.
///
/// Tags and the original identifier are seeded at discovery; enrichment adds
/// the reserved keys from [`crate::constants`]. The typed accessors return
/// nothing when a key is missing or holds a different shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Details(BTreeMap<String, DetailValue>);

impl Details {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: DetailValue) {
        self.0.insert(key.into(), value);
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, DetailValue::Text(value.into()));
    }

    /// Empty lists are not stored.
    pub fn insert_list(&mut self, key: impl Into<String>, values: Vec<String>) {
        if !values.is_empty() {
            self.insert(key, DetailValue::List(values));
        }
    }

    /// Empty maps are not stored.
    pub fn insert_map(&mut self, key: impl Into<String>, values: BTreeMap<String, String>) {
        if !values.is_empty() {
            self.insert(key, DetailValue::Map(values));
        }
    }

    pub fn get(&self, key: &str) -> Option<&DetailValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(DetailValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn list(&self, key: &str) -> &[String] {
        match self.0.get(key) {
            Some(DetailValue::List(values)) => values,
            _ => &[],
        }
    }

    pub fn map(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        match self.0.get(key) {
            Some(DetailValue::Map(values)) => Some(values),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DetailValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn arn(&self) -> Option<&str> {
        self.text(DETAIL_ARN)
    }

    pub fn runtime(&self) -> Option<&str> {
        self.text(DETAIL_RUNTIME)
    }

    pub fn env_vars(&self) -> Option<&BTreeMap<String, String>> {
        self.map(DETAIL_ENV_VARS)
    }

    pub fn triggers(&self) -> &[String] {
        self.list(DETAIL_TRIGGERS)
    }

    pub fn integrations(&self) -> Option<&BTreeMap<String, String>> {
        self.map(DETAIL_INTEGRATIONS)
    }

    pub fn target_groups(&self) -> &[String] {
        self.list(DETAIL_TARGET_GROUPS)
    }

    pub fn targets(&self) -> &[String] {
        self.list(DETAIL_TARGETS)
    }

    pub fn task_resources(&self) -> &[String] {
        self.list(DETAIL_TASK_RESOURCES)
    }

    pub fn subscriptions(&self) -> &[String] {
        self.list(DETAIL_SUBSCRIPTIONS)
    }

    pub fn protected_resources(&self) -> &[String] {
        self.list(DETAIL_PROTECTED_RESOURCES)
    }

    pub fn origins(&self) -> &[String] {
        self.list(DETAIL_ORIGINS)
    }
}

impl FromIterator<(String, DetailValue)> for Details {
    fn from_iter<I: IntoIterator<Item = (String, DetailValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Details {
    type Item = (String, DetailValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, DetailValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub details: Details,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Node {
    /// The original identifier, falling back to the id.
    pub fn arn(&self) -> &str {
        self.details.arn().unwrap_or(&self.id)
    }

    pub fn identifier(&self) -> Option<ResourceIdentifier<'_>> {
        ResourceIdentifier::parse(self.arn())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    /// Backed by configuration read from the service.
    Verified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        label: Option<String>,
        style: Option<EdgeStyle>,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: edge_id(&source, &target),
            source,
            target,
            label,
            style,
        }
    }
}

/// `e-<source length>-<source>-<target>`.
///
/// Node ids may contain `-`, so the length keeps distinct pairs apart.
pub fn edge_id(source: &str, target: &str) -> String {
    format!("e-{}-{source}-{target}", source.len())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

impl TagFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Validate, ZeroizeOnDrop)]
pub struct DiscoverRequest {
    #[validate(length(min = 1, max = MAX_ACCESS_KEY_LENGTH))]
    pub access_key_id: String,

    #[validate(length(min = 1, max = MAX_SECRET_KEY_LENGTH))]
    pub secret_access_key: String,

    #[validate(length(min = 1, max = MAX_REGION_LENGTH))]
    #[validate(custom(function = "validate_aws_region"))]
    pub region: String,

    #[validate(length(min = 1, max = MAX_TAG_KEY_LENGTH))]
    pub tag_key: String,

    #[validate(length(max = MAX_TAG_VALUE_LENGTH))]
    pub tag_value: String,
}

impl DiscoverRequest {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.access_key_id.as_str(), self.secret_access_key.as_str())
    }

    pub fn tag_filter(&self) -> TagFilter {
        TagFilter::new(self.tag_key.as_str(), self.tag_value.as_str())
    }
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for DiscoverRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoverRequest")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("tag_key", &self.tag_key)
            .field("tag_value", &self.tag_value)
            .finish()
    }
}

/// Validates AWS region format (e.g., "us-east-1", "eu-west-2")
/// Pattern: two lowercase letters, hyphen, lowercase letters, hyphen, digits
pub fn validate_aws_region(region: &str) -> Result<(), validator::ValidationError> {
    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() < 3 {
        return Err(validator::ValidationError::new("invalid_aws_region"));
    }

    // First part: exactly 2 lowercase letters (e.g., "us", "eu", "ap")
    let first = parts[0];
    if first.len() != 2 || !first.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(validator::ValidationError::new("invalid_aws_region"));
    }

    // Middle parts: lowercase letters (e.g., "east", "gov", "southeast")
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(validator::ValidationError::new("invalid_aws_region"));
        }
    }

    // Last part: digits (e.g., "1", "2")
    let last = parts[parts.len() - 1];
    if last.is_empty() || !last.chars().all(|c| c.is_ascii_digit()) {
        return Err(validator::ValidationError::new("invalid_aws_region"));
    }

    Ok(())
}
