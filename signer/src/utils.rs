// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use aws_lc_rs::{digest, hmac};
use data_encoding::HEXLOWER;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except the RFC 3986 unreserved characters gets escaped.
const URI_ESCAPED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[inline]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ESCAPED).to_string()
}

#[inline]
pub fn sha256_hex(data: &[u8]) -> String {
    HEXLOWER.encode(digest::digest(&digest::SHA256, data).as_ref())
}

#[inline]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::sign(&key, data).as_ref().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EMPTY_PAYLOAD_HASH;

    #[test]
    fn test_sha256_hex_empty() {
        assert_eq!(sha256_hex(b""), EMPTY_PAYLOAD_HASH);
    }

    #[test]
    fn test_uri_encode_keeps_unreserved() {
        assert_eq!(uri_encode("AZaz09-_.~"), "AZaz09-_.~");
    }

    #[test]
    fn test_uri_encode_escapes_reserved() {
        assert_eq!(uri_encode("a b/c:d=e"), "a%20b%2Fc%3Ad%3De");
        assert_eq!(uri_encode("arn:aws:sns"), "arn%3Aaws%3Asns");
    }

    #[test]
    fn test_uri_encode_multibyte() {
        assert_eq!(uri_encode("é"), "%C3%A9");
    }

    #[test]
    fn test_hmac_sha256_length() {
        assert_eq!(hmac_sha256(b"key", b"data").len(), 32);
    }
}
