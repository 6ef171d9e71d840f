//! # WebAuthn Module
//!
//! Passwordless authentication: the two-step challenge–response protocol
//! behind passkey registration and login.
//!
//! ## Submodules
//! - `types`: request/response types, dispatched on the `step` field
//! - `registration`: creating a new account with its first passkey
//! - `authentication`: logging in with a stored passkey
//!
//! ## Flow Overview
//!
//! ### Registration
//! 1. Client POSTs `step: "generate-options"` with an email
//! 2. Server stores a fresh challenge for that email and returns options
//! 3. Client performs the platform ceremony (Touch ID, Windows Hello, ...)
//! 4. Client POSTs `step: "verify-registration"` with the attestation
//! 5. Server verifies it, persists the account + credential, mints a token
//!
//! ### Authentication
//! 1. Client POSTs `step: "generate-options"` with an email
//! 2. Server builds an allow-list from every stored credential and stores
//!    a fresh challenge for that email
//! 3. Client signs the challenge with its authenticator
//! 4. Client POSTs `step: "verify-authentication"` with the assertion
//! 5. Server verifies the signature, writes back the signature counter and
//!    mints a token

pub mod authentication;
pub mod registration;
pub mod types;
