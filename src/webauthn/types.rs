//! # WebAuthn API Types
//!
//! Request/response types for the two auth endpoints. Both endpoints take a
//! JSON body carrying a `step` field; the body is decoded once at the
//! boundary into a tagged enum, so handlers match on a typed request
//! instead of sniffing fields.

use serde::{Deserialize, Serialize};

/// Request body of `POST /api/auth/register`, dispatched on `step`.
///
/// ## Example JSON
/// ```json
/// { "step": "generate-options", "email": "a@x.com" }
/// { "step": "verify-registration", "email": "a@x.com", "response": { ... } }
/// ```
#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum RegisterRequest {
    /// Step 1: issue creation options and a fresh challenge.
    GenerateOptions { email: String },

    /// Step 2: verify the attestation produced by the authenticator.
    ///
    /// The attestation is accepted as raw JSON and handed to the
    /// verification library for parsing and validation.
    VerifyRegistration {
        email: String,
        response: serde_json::Value,
    },
}

/// Request body of `POST /api/auth/login`, dispatched on `step`.
#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum LoginRequest {
    /// Step 1: issue request options with the account's allow-list.
    GenerateOptions { email: String },

    /// Step 2: verify the signed assertion.
    ///
    /// `email` is optional: discoverable credentials carry the account's
    /// user handle inside the assertion, so the client normally doesn't
    /// need to repeat the address.
    VerifyAuthentication {
        #[serde(default)]
        email: Option<String>,
        response: serde_json::Value,
    },
}

/// Successful verify-* response: the freshly minted session token for the
/// verified account.
#[derive(Debug, Serialize)]
pub struct VerifiedResponse {
    pub verified: bool,
    pub token: String,
    pub email: String,
}
