// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Heuristic edges for well-known shapes inspection did not cover.
//!
//! Guards look only at verified edges, so a fallback edge never suppresses
//! another fallback and never overrides verified connectivity. Fallback
//! edges carry no label and no style.

use std::collections::HashSet;

use crate::classifier::ServiceType;
use crate::models::{Edge, EdgeStyle, Node};

use super::EdgeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// The source has no verified outgoing edge.
    NoVerifiedOutgoing,
    /// The source has no verified edge in either direction.
    NoVerifiedEdges,
}

#[derive(Debug, Clone, Copy)]
pub struct FallbackRule {
    pub name: &'static str,
    pub source: fn(&Node) -> bool,
    pub target: fn(&Node) -> bool,
    pub guard: Guard,
}

pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        name: "load balancer to instance",
        source: |node| node.service_type == ServiceType::LoadBalancer,
        target: |node| node.service_type == ServiceType::Ec2,
        guard: Guard::NoVerifiedOutgoing,
    },
    FallbackRule {
        name: "gateway to function",
        source: |node| node.service_type == ServiceType::ApiGateway,
        target: |node| node.service_type == ServiceType::Lambda,
        guard: Guard::NoVerifiedOutgoing,
    },
    FallbackRule {
        name: "compute to data",
        source: |node| node.service_type.is_compute(),
        target: |node| node.service_type.is_data(),
        guard: Guard::NoVerifiedEdges,
    },
];

struct VerifiedEdges {
    outgoing: HashSet<String>,
    touched: HashSet<String>,
}

impl VerifiedEdges {
    fn from_edges(edges: &[Edge]) -> Self {
        let mut outgoing = HashSet::new();
        let mut touched = HashSet::new();
        for edge in edges.iter().filter(|e| e.style == Some(EdgeStyle::Verified)) {
            outgoing.insert(edge.source.clone());
            touched.insert(edge.source.clone());
            touched.insert(edge.target.clone());
        }
        Self { outgoing, touched }
    }

    fn allows(&self, guard: Guard, node: &Node) -> bool {
        match guard {
            Guard::NoVerifiedOutgoing => !self.outgoing.contains(&node.id),
            Guard::NoVerifiedEdges => !self.touched.contains(&node.id),
        }
    }
}

/// Adds the fallback edges whose guard holds.
pub fn apply(nodes: &[Node], edges: &mut EdgeSet<'_>) {
    let verified = VerifiedEdges::from_edges(edges.edges());

    for rule in FALLBACK_RULES {
        for source in nodes
            .iter()
            .filter(|node| (rule.source)(node) && verified.allows(rule.guard, node))
        {
            for target in nodes.iter().filter(|node| (rule.target)(node)) {
                if edges.insert(Edge::new(source.id.as_str(), target.id.as_str(), None, None)) {
                    tracing::debug!(
                        "[tagmap] {} fallback {} -> {}",
                        rule.name,
                        source.id,
                        target.id
                    );
                }
            }
        }
    }
}
