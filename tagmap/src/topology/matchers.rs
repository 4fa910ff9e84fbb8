// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Resolves a recorded reference to the node it names.
//!
//! [`CASCADE`] lists the matcher strategies in precedence order. Each one is
//! tried against every candidate before the next, weaker one is consulted.

use crate::classifier::{ResourceIdentifier, extract_local_name};
use crate::constants::MIN_REFERENCE_LENGTH;
use crate::models::Node;

/// Host suffixes after which only the first DNS label is kept.
const DOMAIN_SUFFIXES: &[&str] = &[
    ".amazonaws.com.cn",
    ".amazonaws.com",
    ".cloudfront.net",
    ".on.aws",
];

const INVOCATION_SUFFIX: &str = "/invocations";
const FUNCTION_PATH_MARKER: &str = "functions/";

/// A reference string taken from a node's details.
#[derive(Debug, Clone)]
pub struct Reference<'a> {
    pub raw: &'a str,
    pub lowered: String,
    pub normalized: String,
}

impl<'a> Reference<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lowered: raw.to_ascii_lowercase(),
            normalized: normalize(raw),
        }
    }
}

/// A node as seen by the matchers.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub id: &'a str,
    pub arn: &'a str,
    lowered_id: String,
    lowered_arn: String,
    normalized_id: String,
    normalized_arn: String,
    normalized_label: String,
}

impl<'a> Candidate<'a> {
    pub fn new(node: &'a Node) -> Self {
        let arn = node.arn();
        Self {
            id: &node.id,
            arn,
            lowered_id: node.id.to_ascii_lowercase(),
            lowered_arn: arn.to_ascii_lowercase(),
            normalized_id: normalize(&node.id),
            normalized_arn: normalize(arn),
            normalized_label: normalize(&node.label),
        }
    }
}

pub type Matcher = fn(&Reference<'_>, &Candidate<'_>) -> bool;

pub const CASCADE: &[(&str, Matcher)] = &[
    ("exact", exact),
    ("normalized", normalized),
    ("containment", containment),
];

/// The reference is the node's original identifier.
pub fn exact(reference: &Reference<'_>, candidate: &Candidate<'_>) -> bool {
    !reference.raw.is_empty() && reference.raw == candidate.arn
}

/// The simplified reference equals the node's simplified identifier or label.
pub fn normalized(reference: &Reference<'_>, candidate: &Candidate<'_>) -> bool {
    let wanted = reference.normalized.as_str();
    !wanted.is_empty()
        && (wanted == candidate.normalized_arn
            || wanted == candidate.normalized_id
            || wanted == candidate.normalized_label)
}

/// One side contains the other. Both sides must be long enough to mean something.
pub fn containment(reference: &Reference<'_>, candidate: &Candidate<'_>) -> bool {
    let text = reference.lowered.as_str();
    if text.chars().count() < MIN_REFERENCE_LENGTH {
        return false;
    }

    let id = candidate.lowered_id.as_str();
    let id_match = id.chars().count() >= MIN_REFERENCE_LENGTH
        && (text.contains(id) || id.contains(text));

    id_match || text.contains(candidate.lowered_arn.as_str())
}

/// The candidate set of one topology build.
pub struct Cascade<'a> {
    candidates: Vec<Candidate<'a>>,
}

impl<'a> Cascade<'a> {
    pub fn new(nodes: &'a [Node]) -> Self {
        Self {
            candidates: nodes.iter().map(Candidate::new).collect(),
        }
    }

    /// The id of the first node the strongest matching strategy accepts,
    /// never `owner` itself.
    pub fn resolve(&self, raw: &str, owner: &str) -> Option<&'a str> {
        let reference = Reference::new(raw.trim());
        CASCADE.iter().find_map(|&(name, matcher)| {
            let found = self
                .candidates
                .iter()
                .find(|candidate| candidate.id != owner && matcher(&reference, *candidate))?;
            tracing::trace!("[tagmap] {} matched {} to {}", name, raw, found.id);
            Some(found.id)
        })
    }
}

/// Simplified form of an identifier, URL, host name or plain name.
///
/// Strips the URL scheme, gateway invocation wrappers, trailing slashes and
/// well-known domain suffixes, reduces identifiers to their resource name and
/// lower-cases what is left.
pub fn normalize(raw: &str) -> String {
    let mut value = raw.trim();

    if let Some((_, rest)) = value.split_once("://") {
        value = rest;
    }
    if let Some(index) = value.rfind(FUNCTION_PATH_MARKER) {
        value = &value[index + FUNCTION_PATH_MARKER.len()..];
    }
    value = value.trim_end_matches('/');
    if let Some(stripped) = value.strip_suffix(INVOCATION_SUFFIX) {
        value = stripped;
    }

    let simplified = if let Some(arn) = ResourceIdentifier::parse(value) {
        identifier_name(&arn).to_string()
    } else if let Some((host, path)) = value.split_once('/') {
        match path.rsplit('/').find(|segment| !segment.is_empty()) {
            Some(segment) => segment.to_string(),
            None => host_name(host),
        }
    } else {
        host_name(value)
    };

    simplified.to_ascii_lowercase()
}

fn identifier_name<'a>(arn: &ResourceIdentifier<'a>) -> &'a str {
    match arn.service {
        "lambda" => arn
            .resource
            .strip_prefix("function:")
            .and_then(|rest| rest.split(':').next())
            .unwrap_or_else(|| extract_local_name(arn.resource)),
        "elasticloadbalancing" => {
            let segments: Vec<&str> = arn.resource.split('/').collect();
            match segments.as_slice() {
                ["loadbalancer", "app" | "net" | "gwy", name, ..] => *name,
                ["loadbalancer", name, ..] | ["targetgroup", name, ..] => *name,
                _ => extract_local_name(arn.resource),
            }
        }
        _ => extract_local_name(arn.resource),
    }
}

fn host_name(host: &str) -> String {
    let host = host.split(':').next().unwrap_or(host);

    let Some(suffix) = DOMAIN_SUFFIXES.iter().find(|suffix| host.ends_with(*suffix)) else {
        return host.to_string();
    };

    let first = host
        .strip_suffix(*suffix)
        .and_then(|rest| rest.split('.').next())
        .unwrap_or(host);

    if host.contains(".elb.") {
        // generated balancer names end in a random suffix
        let name = first.strip_prefix("internal-").unwrap_or(first);
        return name.rsplit_once('-').map_or(name, |(name, _)| name).to_string();
    }

    first.to_string()
}
