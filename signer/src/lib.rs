// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # tagmap signer
//!
//! AWS Signature Version 4 signing for the requests `tagmap` sends to the
//! resource tagging API and the per-service configuration APIs.
//!
//! ## Modules
//!
//! - [`canonical`]: canonical URI, query string, headers and request
//! - [`constants`]: algorithm identifiers and header names
//! - [`errors`]: signing errors
//! - [`models`]: credentials and request types
//! - [`signing`]: signing key derivation and the `Authorization` header
//! - [`utils`]: hashing, HMAC and URI encoding helpers
//!
//! ## Security Considerations
//!
//! - Secret keys and derived signing keys are zeroized on drop
//! - `Debug` output of [`Credentials`] never contains key material

pub mod canonical;
pub mod constants;
pub mod errors;
pub mod models;
pub mod signing;
pub mod utils;

pub use errors::SigningError;
pub use models::{Credentials, SignableRequest, SignedRequest, SigningParams};
pub use signing::{sign, sign_at};
