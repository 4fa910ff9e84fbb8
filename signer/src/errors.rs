// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("configuration error: {0}")]
    Configuration(String),
}
