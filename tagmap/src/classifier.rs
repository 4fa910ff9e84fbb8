// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Resource identifier parsing and classification.
//!
//! Identifiers follow the `arn:partition:service:region:account:resource`
//! layout. The resource part may itself contain `:` or `/` separators
//! (`function:orders`, `instance/i-0abc`, `/restapis/a1b2c3`).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A parsed resource identifier borrowing from the original string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceIdentifier<'a> {
    pub partition: &'a str,
    pub service: &'a str,
    pub region: &'a str,
    pub account: &'a str,
    pub resource: &'a str,
}

impl<'a> ResourceIdentifier<'a> {
    pub fn parse(identifier: &'a str) -> Option<Self> {
        let mut parts = identifier.splitn(6, ':');
        if parts.next()? != "arn" {
            return None;
        }

        Some(Self {
            partition: parts.next()?,
            service: parts.next()?,
            region: parts.next()?,
            account: parts.next()?,
            resource: parts.next()?,
        })
    }

    /// The leading token of the resource part: `instance` for
    /// `instance/i-0abc`, `function` for `function:orders`, `restapis` for
    /// `/restapis/a1b2c3`.
    pub fn resource_type(&self) -> &'a str {
        let resource = self.resource.trim_start_matches('/');
        resource
            .split(['/', ':'])
            .next()
            .unwrap_or(resource)
    }
}

/// Coarse service label attached to every node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceType {
    Ec2,
    Vpc,
    SecurityGroup,
    Subnet,
    LoadBalancer,
    TargetGroup,
    Lambda,
    ApiGateway,
    StepFunctions,
    Sns,
    Sqs,
    Waf,
    CloudFront,
    S3,
    Rds,
    DynamoDb,
    Unknown,
    Other(String),
}

impl ServiceType {
    pub fn label(&self) -> &str {
        match self {
            Self::Ec2 => "EC2",
            Self::Vpc => "EC2/VPC",
            Self::SecurityGroup => "EC2/SECURITY-GROUP",
            Self::Subnet => "EC2/SUBNET",
            Self::LoadBalancer => "ELASTICLOADBALANCING",
            Self::TargetGroup => "ELASTICLOADBALANCING/TARGETGROUP",
            Self::Lambda => "LAMBDA",
            Self::ApiGateway => "APIGATEWAY",
            Self::StepFunctions => "STATES",
            Self::Sns => "SNS",
            Self::Sqs => "SQS",
            Self::Waf => "WAFV2",
            Self::CloudFront => "CLOUDFRONT",
            Self::S3 => "S3",
            Self::Rds => "RDS",
            Self::DynamoDb => "DYNAMODB",
            Self::Unknown => "UNKNOWN",
            Self::Other(label) => label,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "EC2" => Self::Ec2,
            "EC2/VPC" => Self::Vpc,
            "EC2/SECURITY-GROUP" => Self::SecurityGroup,
            "EC2/SUBNET" => Self::Subnet,
            "ELASTICLOADBALANCING" => Self::LoadBalancer,
            "ELASTICLOADBALANCING/TARGETGROUP" => Self::TargetGroup,
            "LAMBDA" => Self::Lambda,
            "APIGATEWAY" => Self::ApiGateway,
            "STATES" => Self::StepFunctions,
            "SNS" => Self::Sns,
            "SQS" => Self::Sqs,
            "WAFV2" => Self::Waf,
            "CLOUDFRONT" => Self::CloudFront,
            "S3" => Self::S3,
            "RDS" => Self::Rds,
            "DYNAMODB" => Self::DynamoDb,
            "UNKNOWN" | "" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_compute(&self) -> bool {
        matches!(self, Self::Ec2 | Self::Lambda)
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Rds | Self::DynamoDb)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ServiceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ServiceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Maps an identifier to its service label.
///
/// The third segment is the service namespace; the EC2 and load-balancing
/// namespaces are refined by their resource type.
pub fn classify(identifier: &str) -> ServiceType {
    let Some(arn) = ResourceIdentifier::parse(identifier) else {
        return ServiceType::Unknown;
    };

    match arn.service {
        "ec2" => match arn.resource_type() {
            "vpc" => ServiceType::Vpc,
            "security-group" => ServiceType::SecurityGroup,
            "subnet" => ServiceType::Subnet,
            _ => ServiceType::Ec2,
        },
        "elasticloadbalancing" => match arn.resource_type() {
            "targetgroup" => ServiceType::TargetGroup,
            _ => ServiceType::LoadBalancer,
        },
        "" => ServiceType::Unknown,
        service => ServiceType::from_label(&service.to_ascii_uppercase()),
    }
}

/// A class of low-signal resource that never becomes a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Matches the service namespace and the leading resource-type token.
    ResourceType {
        service: &'static str,
        resource_type: &'static str,
    },
    /// Matches the service namespace and a fragment anywhere in the resource.
    ResourceInfix {
        service: &'static str,
        infix: &'static str,
    },
    /// Function qualifiers that are bare version numbers (`function:name:7`).
    NumericFunctionVersion,
}

impl Exclusion {
    pub fn matches(&self, arn: &ResourceIdentifier<'_>) -> bool {
        match *self {
            Self::ResourceType {
                service,
                resource_type,
            } => arn.service == service && arn.resource_type() == resource_type,
            Self::ResourceInfix { service, infix } => {
                arn.service == service && arn.resource.contains(infix)
            }
            Self::NumericFunctionVersion => {
                arn.service == "lambda"
                    && arn
                        .resource
                        .strip_prefix("function:")
                        .and_then(|rest| rest.split_once(':'))
                        .is_some_and(|(_, qualifier)| {
                            !qualifier.is_empty() && qualifier.chars().all(|c| c.is_ascii_digit())
                        })
            }
        }
    }
}

const fn resource_type(service: &'static str, resource_type: &'static str) -> Exclusion {
    Exclusion::ResourceType {
        service,
        resource_type,
    }
}

pub const EXCLUSIONS: &[Exclusion] = &[
    resource_type("ec2", "snapshot"),
    resource_type("ec2", "image"),
    resource_type("ec2", "volume"),
    resource_type("ec2", "network-interface"),
    resource_type("ec2", "security-group"),
    resource_type("ec2", "subnet"),
    resource_type("ec2", "route-table"),
    resource_type("ec2", "internet-gateway"),
    resource_type("ec2", "egress-only-internet-gateway"),
    resource_type("ec2", "natgateway"),
    resource_type("ec2", "vpn-gateway"),
    resource_type("ec2", "customer-gateway"),
    resource_type("ec2", "dhcp-options"),
    resource_type("ec2", "launch-template"),
    resource_type("rds", "snapshot"),
    resource_type("rds", "cluster-snapshot"),
    resource_type("backup", "backup-vault"),
    resource_type("elasticloadbalancing", "listener-rule"),
    resource_type("lambda", "layer"),
    resource_type("ecs", "task-definition"),
    resource_type("codedeploy", "deploymentgroup"),
    resource_type("iam", "policy"),
    resource_type("iam", "role"),
    resource_type("cloudwatch", "alarm"),
    resource_type("events", "rule"),
    Exclusion::ResourceInfix {
        service: "apigateway",
        infix: "/deployments/",
    },
    Exclusion::ResourceInfix {
        service: "apigateway",
        infix: "/stages/",
    },
    Exclusion::NumericFunctionVersion,
];

/// Returns false for implementation artifacts that carry no architectural
/// meaning on their own. Unparseable identifiers are kept.
pub fn is_significant(identifier: &str) -> bool {
    match ResourceIdentifier::parse(identifier) {
        Some(arn) => !EXCLUSIONS.iter().any(|exclusion| exclusion.matches(&arn)),
        None => true,
    }
}

/// The final `:` segment, narrowed to the part after its last `/`.
pub fn extract_local_name(identifier: &str) -> &str {
    let last = identifier.rsplit(':').next().unwrap_or(identifier);
    match last.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => last,
    }
}
