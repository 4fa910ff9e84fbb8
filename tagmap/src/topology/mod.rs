// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Infers edges from enriched nodes.
//!
//! [`build`] is pure: the same node set always yields the same edges in the
//! same order. References recorded under the keys in [`REFERENCE_SOURCES`]
//! become verified edges through the [`matchers::Cascade`]; afterwards the
//! rules in [`fallback::FALLBACK_RULES`] connect nodes that inspection left
//! unconnected.

use std::collections::HashSet;

use crate::constants::{
    DETAIL_ENV_VARS, DETAIL_INTEGRATIONS, DETAIL_ORIGINS, DETAIL_PROTECTED_RESOURCES,
    DETAIL_SUBSCRIPTIONS, DETAIL_TARGET_GROUPS, DETAIL_TARGETS, DETAIL_TASK_RESOURCES,
    DETAIL_TRIGGERS, MIN_REFERENCE_LENGTH,
};
use crate::models::{Edge, EdgeStyle, Node};

pub mod fallback;
pub mod matchers;

use matchers::Cascade;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The referenced node points at the owner.
    Incoming,
    /// The owner points at the referenced node.
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLabel {
    Fixed(&'static str),
    /// The map entry's key, e.g. the environment variable name.
    EntryKey,
}

/// Shape the references are stored in. Values of any other shape are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    List,
    /// Only the map values are references.
    Map,
}

/// A `details` key whose values name other nodes.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceSource {
    pub key: &'static str,
    pub shape: Shape,
    pub label: EdgeLabel,
    pub direction: Direction,
    /// Free-text values below the minimum reference length are skipped.
    pub free_text: bool,
}

const fn list(key: &'static str, label: &'static str, direction: Direction) -> ReferenceSource {
    ReferenceSource {
        key,
        shape: Shape::List,
        label: EdgeLabel::Fixed(label),
        direction,
        free_text: false,
    }
}

pub const REFERENCE_SOURCES: &[ReferenceSource] = &[
    list(DETAIL_TRIGGERS, "trigger", Direction::Incoming),
    ReferenceSource {
        key: DETAIL_ENV_VARS,
        shape: Shape::Map,
        label: EdgeLabel::EntryKey,
        direction: Direction::Outgoing,
        free_text: true,
    },
    ReferenceSource {
        key: DETAIL_INTEGRATIONS,
        shape: Shape::Map,
        label: EdgeLabel::Fixed("invokes"),
        direction: Direction::Outgoing,
        free_text: false,
    },
    list(DETAIL_TARGET_GROUPS, "routes", Direction::Outgoing),
    list(DETAIL_TARGETS, "routes", Direction::Outgoing),
    list(DETAIL_TASK_RESOURCES, "task", Direction::Outgoing),
    list(DETAIL_SUBSCRIPTIONS, "publishes", Direction::Outgoing),
    list(DETAIL_PROTECTED_RESOURCES, "protects", Direction::Outgoing),
    list(DETAIL_ORIGINS, "origin", Direction::Outgoing),
];

impl ReferenceSource {
    /// `(label, reference)` pairs recorded on `node` under this key.
    fn references<'a>(&self, node: &'a Node) -> Vec<(String, &'a str)> {
        let label = |entry_key: &str| match self.label {
            EdgeLabel::Fixed(label) => label.to_string(),
            EdgeLabel::EntryKey => entry_key.to_string(),
        };

        match self.shape {
            Shape::List => node
                .details
                .list(self.key)
                .iter()
                .map(|value| (label(self.key), value.as_str()))
                .collect(),
            Shape::Map => node
                .details
                .map(self.key)
                .into_iter()
                .flatten()
                .map(|(key, value)| (label(key.as_str()), value.as_str()))
                .collect(),
        }
    }
}

/// Edges kept so far. Rejects self-loops, unknown endpoints and repeated
/// ordered pairs; the first edge for a pair wins.
#[derive(Debug)]
pub struct EdgeSet<'a> {
    node_ids: HashSet<&'a str>,
    pairs: HashSet<(String, String)>,
    edges: Vec<Edge>,
}

impl<'a> EdgeSet<'a> {
    pub fn new(nodes: &'a [Node]) -> Self {
        Self {
            node_ids: nodes.iter().map(|node| node.id.as_str()).collect(),
            pairs: HashSet::new(),
            edges: Vec::new(),
        }
    }

    pub fn insert(&mut self, edge: Edge) -> bool {
        if edge.source == edge.target
            || !self.node_ids.contains(edge.source.as_str())
            || !self.node_ids.contains(edge.target.as_str())
        {
            return false;
        }
        if !self.pairs.insert((edge.source.clone(), edge.target.clone())) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }
}

/// Converts enrichment metadata into a deduplicated edge list.
pub fn build(nodes: &[Node]) -> Vec<Edge> {
    let cascade = Cascade::new(nodes);
    let mut edges = EdgeSet::new(nodes);

    for node in nodes {
        for reference_source in REFERENCE_SOURCES {
            for (label, reference) in reference_source.references(node) {
                if reference_source.free_text
                    && reference.trim().chars().count() < MIN_REFERENCE_LENGTH
                {
                    continue;
                }
                let Some(other) = cascade.resolve(reference, &node.id) else {
                    continue;
                };
                let (source, target) = match reference_source.direction {
                    Direction::Incoming => (other, node.id.as_str()),
                    Direction::Outgoing => (node.id.as_str(), other),
                };
                edges.insert(Edge::new(source, target, Some(label), Some(EdgeStyle::Verified)));
            }
        }
    }

    let verified = edges.edges().len();
    fallback::apply(nodes, &mut edges);

    tracing::info!(
        "[tagmap] inferred {} verified and {} fallback edges across {} nodes",
        verified,
        edges.edges().len() - verified,
        nodes.len()
    );

    edges.into_edges()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DetailValue;
    use crate::testing::node;
    use std::collections::BTreeMap;

    const GATEWAY: &str = "arn:aws:apigateway:us-east-1::/restapis/a1b2c3";
    const FUNCTION: &str = "arn:aws:lambda:us-east-1:123456789012:function:orders";
    const QUEUE: &str = "arn:aws:sqs:us-east-1:123456789012:jobs";
    const TABLE: &str = "arn:aws:dynamodb:us-east-1:123456789012:table/orders-table";

    fn with_list(mut target: Node, key: &str, values: &[&str]) -> Node {
        target
            .details
            .insert_list(key, values.iter().map(|v| v.to_string()).collect());
        target
    }

    fn with_map(mut target: Node, key: &str, entries: &[(&str, &str)]) -> Node {
        let map: BTreeMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        target.details.insert_map(key, map);
        target
    }

    #[test]
    fn test_gateway_integration_yields_single_invokes_edge() {
        let nodes = vec![
            with_map(node(GATEWAY), DETAIL_INTEGRATIONS, &[("GET /orders", "orders")]),
            node(FUNCTION),
        ];

        let edges = build(&nodes);

        assert_eq!(
            edges,
            vec![Edge {
                id: "e-6-a1b2c3-orders".to_string(),
                source: "a1b2c3".to_string(),
                target: "orders".to_string(),
                label: Some("invokes".to_string()),
                style: Some(EdgeStyle::Verified),
            }]
        );
    }

    #[test]
    fn test_trigger_points_at_function() {
        let nodes = vec![with_list(node(FUNCTION), DETAIL_TRIGGERS, &[QUEUE]), node(QUEUE)];

        let edges = build(&nodes);

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, "jobs");
        assert_eq!(edges[0].target, "orders");
        assert_eq!(edges[0].label.as_deref(), Some("trigger"));
    }

    #[test]
    fn test_env_vars_label_edges_with_variable_name() {
        let nodes = vec![
            with_map(
                node(FUNCTION),
                DETAIL_ENV_VARS,
                &[("TABLE_NAME", "orders-table"), ("STAGE", "dev"), ("QUEUE_URL", "https://sqs.us-east-1.amazonaws.com/123456789012/jobs")],
            ),
            node(TABLE),
            node(QUEUE),
        ];

        let edges = build(&nodes);

        let labels: Vec<_> = edges
            .iter()
            .map(|e| (e.target.as_str(), e.label.as_deref()))
            .collect();
        assert!(labels.contains(&("orders-table", Some("TABLE_NAME"))));
        assert!(labels.contains(&("jobs", Some("QUEUE_URL"))));
        assert!(edges.iter().all(|e| e.source == "orders"));
    }

    #[test]
    fn test_short_env_values_never_match() {
        let nodes = vec![
            with_map(node(FUNCTION), DETAIL_ENV_VARS, &[("Q", "job")]),
            node("arn:aws:sqs:us-east-1:123456789012:job"),
        ];

        assert!(build(&nodes).is_empty());
    }

    #[test]
    fn test_no_self_loops_or_duplicate_pairs() {
        let nodes = vec![
            with_map(
                with_list(node(FUNCTION), DETAIL_TRIGGERS, &[FUNCTION, QUEUE]),
                DETAIL_ENV_VARS,
                &[("SELF", FUNCTION), ("QUEUE_ARN", QUEUE), ("QUEUE_COPY", QUEUE)],
            ),
            with_list(node(QUEUE), DETAIL_SUBSCRIPTIONS, &[FUNCTION]),
        ];

        let edges = build(&nodes);

        assert!(edges.iter().all(|e| e.source != e.target));
        let mut pairs = HashSet::new();
        assert!(edges.iter().all(|e| pairs.insert((e.source.clone(), e.target.clone()))));
        // trigger jobs -> orders, env orders -> jobs (first label wins)
        assert_eq!(edges.len(), 2);
        let outgoing = edges.iter().find(|e| e.source == "orders").unwrap();
        assert_eq!(outgoing.label.as_deref(), Some("QUEUE_ARN"));
    }

    #[test]
    fn test_build_is_idempotent() {
        let nodes = vec![
            with_map(node(GATEWAY), DETAIL_INTEGRATIONS, &[("GET /orders", FUNCTION)]),
            with_list(node(FUNCTION), DETAIL_TRIGGERS, &[QUEUE]),
            node(QUEUE),
            node(TABLE),
            node("arn:aws:ec2:us-east-1:123456789012:instance/i-0abc"),
        ];

        assert_eq!(build(&nodes), build(&nodes));
    }

    #[test]
    fn test_unresolved_references_are_ignored() {
        let nodes = vec![with_list(node(FUNCTION), DETAIL_TRIGGERS, &["arn:aws:sqs:us-east-1:123456789012:elsewhere"])];
        assert!(build(&nodes).is_empty());
    }

    #[test]
    fn test_mismatched_detail_shape_yields_no_edges() {
        let mut owner = node(FUNCTION);
        owner.details.insert(
            DETAIL_TRIGGERS,
            DetailValue::Map(BTreeMap::from([("source".to_string(), QUEUE.to_string())])),
        );
        owner
            .details
            .insert(DETAIL_ENV_VARS, DetailValue::Text(QUEUE.to_string()));
        let nodes = vec![owner, node(QUEUE)];
        assert!(build(&nodes).is_empty());
    }

    #[test]
    fn test_edge_set_rejects_unknown_endpoints() {
        let nodes = vec![node(FUNCTION)];
        let mut edges = EdgeSet::new(&nodes);
        assert!(!edges.insert(Edge::new("orders", "ghost", None, None)));
        assert!(!edges.insert(Edge::new("orders", "orders", None, None)));
        assert!(edges.edges().is_empty());
    }
}
