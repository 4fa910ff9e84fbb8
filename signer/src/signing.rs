// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Signature Version 4 request signing.
//!
//! Signing runs in four phases: canonicalize the query string, canonicalize
//! the headers, hash the payload into a canonical request, then derive a
//! scoped signing key and sign the string-to-sign with it. For a fixed
//! timestamp the output is byte-for-byte reproducible, which is what
//! [`sign_at`] exists for.

use chrono::{DateTime, Utc};
use data_encoding::HEXLOWER;
use zeroize::Zeroizing;

use crate::canonical::{CanonicalHeaders, canonical_query_string, canonical_request, canonical_uri};
use crate::constants::{
    ALGORITHM, AMZ_DATE_FORMAT, DATE_STAMP_FORMAT, HEADER_AMZ_DATE, HEADER_AUTHORIZATION,
    HEADER_HOST, SCOPE_TERMINATOR, SECRET_KEY_PREFIX,
};
use crate::errors::SigningError;
use crate::models::{SignableRequest, SignedRequest, SigningParams};
use crate::utils::{hmac_sha256, sha256_hex};

/// Signs `request` with the current time.
pub fn sign(
    params: &SigningParams<'_>,
    request: SignableRequest,
) -> Result<SignedRequest, SigningError> {
    sign_at(params, request, Utc::now())
}

/// Signs `request` as of `timestamp`.
///
/// # Errors
///
/// Returns [`SigningError::Configuration`] if the access key, secret key,
/// region, service or host is empty.
pub fn sign_at(
    params: &SigningParams<'_>,
    request: SignableRequest,
    timestamp: DateTime<Utc>,
) -> Result<SignedRequest, SigningError> {
    validate(params, &request)?;

    let amz_date = timestamp.format(AMZ_DATE_FORMAT).to_string();
    let date_stamp = timestamp.format(DATE_STAMP_FORMAT).to_string();

    let query_string = canonical_query_string(&request.query);

    let mut headers = CanonicalHeaders::from_headers(
        request
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str())),
    );
    headers.insert(HEADER_HOST, &request.host);
    headers.insert(HEADER_AMZ_DATE, &amz_date);

    let payload_hash = sha256_hex(request.body.as_bytes());
    let method = request.method.to_ascii_uppercase();
    let canonical = canonical_request(
        &method,
        &canonical_uri(&request.path),
        &query_string,
        &headers,
        &payload_hash,
    );

    tracing::trace!("[signer] canonical request:\n{}", canonical);

    let scope = credential_scope(&date_stamp, params.region, params.service);
    let to_sign = string_to_sign(&amz_date, &scope, &canonical);
    let key = signing_key(
        params.credentials.secret_access_key(),
        &date_stamp,
        params.region,
        params.service,
    );
    let signature = HEXLOWER.encode(&hmac_sha256(&key, to_sign.as_bytes()));

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM,
        params.credentials.access_key_id(),
        scope,
        headers.signed_headers(),
        signature
    );

    let mut headers = headers.into_map();
    headers.insert(HEADER_AUTHORIZATION.to_string(), authorization);

    Ok(SignedRequest {
        method,
        host: request.host,
        path: if request.path.is_empty() {
            "/".to_string()
        } else {
            request.path
        },
        query_string,
        headers,
        body: request.body,
    })
}

fn validate(params: &SigningParams<'_>, request: &SignableRequest) -> Result<(), SigningError> {
    let checks = [
        ("access key", params.credentials.access_key_id()),
        ("secret key", params.credentials.secret_access_key()),
        ("region", params.region),
        ("service", params.service),
        ("host", request.host.as_str()),
    ];

    for (name, value) in checks {
        if value.trim().is_empty() {
            return Err(SigningError::Configuration(format!("{name} must not be empty")));
        }
    }

    Ok(())
}

pub fn credential_scope(date_stamp: &str, region: &str, service: &str) -> String {
    format!("{date_stamp}/{region}/{service}/{SCOPE_TERMINATOR}")
}

pub fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        sha256_hex(canonical_request.as_bytes())
    )
}

/// Chains date, region, service and the scope terminator through HMAC-SHA256,
/// seeded with the secret key.
pub fn signing_key(
    secret_access_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Zeroizing<Vec<u8>> {
    let seed = Zeroizing::new(format!("{SECRET_KEY_PREFIX}{secret_access_key}"));
    let k_date = Zeroizing::new(hmac_sha256(seed.as_bytes(), date_stamp.as_bytes()));
    let k_region = Zeroizing::new(hmac_sha256(&k_date, region.as_bytes()));
    let k_service = Zeroizing::new(hmac_sha256(&k_region, service.as_bytes()));
    Zeroizing::new(hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes()))
}
