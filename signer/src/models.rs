// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::BTreeMap;
use std::fmt;

use zeroize::ZeroizeOnDrop;

use crate::constants::HEADER_AUTHORIZATION;

/// Long-lived access key pair used to sign requests.
#[derive(Clone, ZeroizeOnDrop)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub(crate) fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

/// Session tokens are dropped: only static keys are supported.
impl From<aws_credential_types::Credentials> for Credentials {
    fn from(credential: aws_credential_types::Credentials) -> Self {
        Self::new(credential.access_key_id(), credential.secret_access_key())
    }
}

/// Region and service namespace the signature is scoped to.
#[derive(Debug, Clone, Copy)]
pub struct SigningParams<'a> {
    pub credentials: &'a Credentials,
    pub region: &'a str,
    pub service: &'a str,
}

/// An outbound request before signing.
///
/// `path` must already be in its wire form; the signer derives the canonical
/// URI from it. Header names may be given in any case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignableRequest {
    pub method: String,
    pub host: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl SignableRequest {
    pub fn new(method: &str, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            host: host.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// A request carrying a complete, ready-to-send header set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: String,
    pub host: String,
    pub path: String,
    /// Canonical (sorted, encoded) query string, empty when there is none.
    pub query_string: String,
    /// Lower-cased header names, including `host`, `x-amz-date` and `authorization`.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl SignedRequest {
    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(HEADER_AUTHORIZATION).map(String::as_str)
    }

    pub fn path_and_query(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }
}
