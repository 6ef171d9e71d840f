//! # Database Models
//!
//! Row structs mapping to the SQLite tables, plus their constructors.
//! Timestamps are stored as RFC3339 TEXT (SQLite keeps timestamps as text
//! anyway, and the strings serialize straight into JSON responses).

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long an issued WebAuthn challenge stays valid.
const CHALLENGE_TTL_MINUTES: i64 = 5;

/// Derive the WebAuthn user handle for an email address.
///
/// The handle is a UUIDv5 of the email, so the same account always gets the
/// same handle and an assertion's `userHandle` can be mapped back to the
/// account without any per-session state.
pub fn user_uuid_for_email(email: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, email.as_bytes())
}

/// User account, keyed by email.
///
/// Created together with its first credential on the first successful
/// registration; `registered_at` is set once and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Email address, primary key, stored case-sensitively.
    pub email: String,

    /// Deterministic WebAuthn user handle (UUIDv5 of the email).
    pub user_uuid: String,

    /// When the account was first registered (RFC3339 timestamp).
    pub registered_at: String,
}

impl User {
    pub fn new(email: String) -> Self {
        let user_uuid = user_uuid_for_email(&email).to_string();
        Self {
            email,
            user_uuid,
            registered_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Stored passkey credential.
///
/// Only the public half is ever stored; the private key never leaves the
/// user's authenticator. The `public_key` column holds the verifier's
/// serialized credential as base64 text, opaque to everything but the
/// verification library.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredCredential {
    /// Credential ID as reported by the authenticator (base64url).
    pub id: String,

    /// Owning account.
    pub user_email: String,

    /// Serialized verifier credential, base64 text.
    pub public_key: String,

    /// Signature counter. Increments with each use; a counter that goes
    /// backwards indicates a cloned authenticator.
    pub counter: i64,

    /// Transport hints as a JSON array, e.g. `["internal","hybrid"]`.
    pub transports: Option<String>,

    /// When the credential was registered (RFC3339 timestamp).
    pub created_at: String,

    /// Last successful authentication with this credential.
    pub last_used_at: Option<String>,
}

impl StoredCredential {
    pub fn new(
        id: String,
        user_email: String,
        public_key: String,
        counter: i64,
        transports: Option<String>,
    ) -> Self {
        Self {
            id,
            user_email,
            public_key,
            counter,
            transports,
            created_at: Utc::now().to_rfc3339(),
            last_used_at: None,
        }
    }
}

/// Outstanding registration challenge for one email.
///
/// One row per email: issuing a new challenge replaces the previous one, so
/// only the most recently issued challenge can ever verify. Rows expire
/// after five minutes; verification deletes the row (challenges are
/// single-use).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationChallenge {
    /// Email the challenge was issued for.
    pub email: String,

    /// Serialized verification state (the challenge itself plus expected
    /// RP ID/origin), handed back to the library at verify time.
    pub state: Vec<u8>,

    pub created_at: String,

    /// After this instant the challenge cannot be used.
    pub expires_at: String,
}

impl RegistrationChallenge {
    pub fn new(email: String, state: Vec<u8>) -> Self {
        let now = Utc::now();
        let expires = now + Duration::minutes(CHALLENGE_TTL_MINUTES);

        Self {
            email,
            state,
            created_at: now.to_rfc3339(),
            expires_at: expires.to_rfc3339(),
        }
    }
}

/// Outstanding authentication challenge for one email.
///
/// Same lifecycle as [`RegistrationChallenge`]; kept as a separate table
/// because the serialized state types differ (assertion vs attestation).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthenticationChallenge {
    pub email: String,
    pub state: Vec<u8>,
    pub created_at: String,
    pub expires_at: String,
}

impl AuthenticationChallenge {
    pub fn new(email: String, state: Vec<u8>) -> Self {
        let now = Utc::now();
        let expires = now + Duration::minutes(CHALLENGE_TTL_MINUTES);

        Self {
            email,
            state,
            created_at: now.to_rfc3339(),
            expires_at: expires.to_rfc3339(),
        }
    }
}

/// Blog post.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,

    pub title: String,

    /// URL slug derived from the title at upload time.
    pub slug: String,

    pub excerpt: Option<String>,

    /// Post body, Markdown already parsed/validated client-side.
    pub content: String,

    /// Tags as a JSON array string.
    pub tags: String,

    /// Email of the authenticated uploader.
    pub author_email: Option<String>,

    pub created_at: String,
}

impl Post {
    pub fn new(
        title: String,
        slug: String,
        excerpt: Option<String>,
        content: String,
        tags: Vec<String>,
        author_email: Option<String>,
        created_at: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            slug,
            excerpt,
            content,
            tags: serde_json::to_string(&tags).unwrap_or_else(|_| "[]".to_string()),
            author_email,
            created_at: created_at.unwrap_or_else(|| Utc::now().to_rfc3339()),
        }
    }
}

/// Newsletter subscriber. The address arrives already encrypted client-side;
/// the ciphertext doubles as the dedupe key.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subscriber {
    pub id: String,
    pub encrypted: String,
    pub subscribed_at: String,
}

impl Subscriber {
    pub fn new(encrypted: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            encrypted,
            subscribed_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Contact-form message, stored after validation and sanitization.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub message: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Submitting client's IP, kept for abuse follow-up.
    pub ip: String,
    pub created_at: String,
}

impl ContactMessage {
    pub fn new(
        name: String,
        message: String,
        email: Option<String>,
        phone: Option<String>,
        ip: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            message,
            email,
            phone,
            ip,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
