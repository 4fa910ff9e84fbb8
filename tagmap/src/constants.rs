// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const INSPECTION_TIMEOUT: Duration = Duration::from_secs(15);
pub const MAX_CONCURRENT_INSPECTIONS: usize = 8;

/// Page size sent with every tagging query.
pub const RESOURCES_PER_PAGE: u32 = 50;
pub const MAX_SUBSCRIPTION_PAGES: usize = 20;

/// Free-text references shorter than this never produce an edge.
pub const MIN_REFERENCE_LENGTH: usize = 4;

pub const MAX_ERROR_BODY_CHARS: usize = 500;
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024; // 64 KiB

pub const TAGGING_SERVICE: &str = "tagging";
pub const TAGGING_GET_RESOURCES_TARGET: &str = "ResourceGroupsTaggingAPI_20170126.GetResources";
pub const AMZ_JSON_1_0: &str = "application/x-amz-json-1.0";
pub const AMZ_JSON_1_1: &str = "application/x-amz-json-1.1";
pub const HEADER_AMZ_TARGET: &str = "X-Amz-Target";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_ACCEPT: &str = "Accept";

/// Region global services (CloudFront) are signed for.
pub const GLOBAL_SIGNING_REGION: &str = "us-east-1";

// Reserved `details` keys. Tag names land in the same map.
pub const DETAIL_ARN: &str = "arn";
pub const DETAIL_RUNTIME: &str = "runtime";
pub const DETAIL_ENV_VARS: &str = "envVars";
pub const DETAIL_TRIGGERS: &str = "triggers";
pub const DETAIL_INTEGRATIONS: &str = "integrations";
pub const DETAIL_TARGET_GROUPS: &str = "targetGroups";
pub const DETAIL_TARGETS: &str = "targets";
pub const DETAIL_TASK_RESOURCES: &str = "taskResources";
pub const DETAIL_SUBSCRIPTIONS: &str = "subscriptions";
pub const DETAIL_PROTECTED_RESOURCES: &str = "protectedResources";
pub const DETAIL_ORIGINS: &str = "origins";

// Validation constants for DiscoverRequest
pub const MAX_ACCESS_KEY_LENGTH: u64 = 128;
pub const MAX_SECRET_KEY_LENGTH: u64 = 256;
pub const MAX_REGION_LENGTH: u64 = 64;
pub const MAX_TAG_KEY_LENGTH: u64 = 128;
pub const MAX_TAG_VALUE_LENGTH: u64 = 256;
