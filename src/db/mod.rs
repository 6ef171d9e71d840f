//! # Database Module
//!
//! All persistence lives here, one submodule per table/concept:
//! - `models`: row structs and constructors
//! - `users`: user accounts, keyed by email
//! - `credentials`: stored passkey public keys
//! - `challenges`: outstanding WebAuthn challenges (registration & login)
//! - `posts`: blog posts
//! - `newsletter`: newsletter subscribers
//! - `contacts`: contact-form messages

pub mod challenges;
pub mod contacts;
pub mod credentials;
pub mod models;
pub mod newsletter;
pub mod posts;
pub mod users;
