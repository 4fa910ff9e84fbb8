// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Canonical request construction.
//!
//! ```text
//! METHOD \n
//! canonical-uri \n
//! canonical-query \n
//! canonical-headers \n      (one "name:value\n" per header)
//! signed-headers \n
//! payload-hash
//! ```

use std::collections::BTreeMap;

use crate::utils::uri_encode;

/// Encodes every path segment; an empty path becomes `/`.
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }

    let encoded = path
        .split('/')
        .map(uri_encode)
        .collect::<Vec<_>>()
        .join("/");

    if encoded.starts_with('/') {
        encoded
    } else {
        format!("/{encoded}")
    }
}

/// Encodes names and values, then sorts by encoded name (and value on ties).
pub fn canonical_query_string(query: &BTreeMap<String, String>) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(key, value)| (uri_encode(key), uri_encode(value)))
        .collect();
    pairs.sort();

    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lower-cased, whitespace-normalized headers kept in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalHeaders {
    entries: BTreeMap<String, String>,
}

impl CanonicalHeaders {
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut canonical = Self::default();
        for (name, value) in headers {
            canonical.insert(name, value);
        }
        canonical
    }

    /// Later inserts win over earlier ones with the same lower-cased name.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.entries
            .insert(name.trim().to_ascii_lowercase(), normalize_value(value));
    }

    /// `name1;name2;...` in sorted order.
    pub fn signed_headers(&self) -> String {
        self.entries.keys().cloned().collect::<Vec<_>>().join(";")
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn block(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect()
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.entries
    }
}

fn normalize_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn canonical_request(
    method: &str,
    canonical_uri: &str,
    canonical_query: &str,
    headers: &CanonicalHeaders,
    payload_hash: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        canonical_uri,
        canonical_query,
        headers.block(),
        headers.signed_headers(),
        payload_hash
    )
}
