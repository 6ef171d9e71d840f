//! # HTTP Request Handlers
//!
//! One submodule per API surface:
//! - `health`: liveness endpoint
//! - `auth`: the two step-dispatched WebAuthn endpoints
//! - `users`: current-user profile (token protected)
//! - `posts`: blog listing and upload
//! - `newsletter`: newsletter opt-in
//! - `contact`: contact form with validation and rate limiting
//! - `chat`: proxy to the hosted assistant
//!
//! Handlers extract the request, call the relevant db/webauthn/client
//! logic, and return `AppResult<Json<_>>`; error mapping lives in
//! `crate::error`.

pub mod auth;
pub mod chat;
pub mod contact;
pub mod health;
pub mod newsletter;
pub mod posts;
pub mod users;
