// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const SCOPE_TERMINATOR: &str = "aws4_request";
pub const SECRET_KEY_PREFIX: &str = "AWS4";

pub const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
pub const DATE_STAMP_FORMAT: &str = "%Y%m%d";

pub const HEADER_HOST: &str = "host";
pub const HEADER_AMZ_DATE: &str = "x-amz-date";
pub const HEADER_AUTHORIZATION: &str = "authorization";

// sha256("")
pub const EMPTY_PAYLOAD_HASH: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
