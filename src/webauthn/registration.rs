//! # Passkey Registration Logic
//!
//! Server side of the two-step registration ceremony. Step 1 issues a fresh
//! challenge for the email; step 2 verifies the attestation and persists
//! the new account together with its first credential.
//!
//! The challenge is stored per email with a short expiry, so concurrent
//! registrations for different addresses don't interfere and an abandoned
//! ceremony can't be replayed later.

use crate::db::models::{user_uuid_for_email, StoredCredential, User};
use crate::db::{challenges, credentials, users};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use base64::prelude::*;
use serde_json::Value;
use webauthn_rs::prelude::*;

/// Step 1: issue registration options for a new account.
///
/// Fails with "User already exists" when the email is taken. The WebAuthn
/// user handle is derived deterministically from the email, so step 2 (and
/// later logins) can map the handle back to the account.
///
/// Returns the `CreationChallengeResponse` the client feeds into
/// `navigator.credentials.create()`; its challenge is also stored for the
/// email, replacing any previously issued one.
pub async fn start_registration(
    state: &AppState,
    email: &str,
) -> AppResult<CreationChallengeResponse> {
    if users::exists(&state.db, email).await? {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let user_handle = user_uuid_for_email(email);

    // No exclude list: this is the account's first passkey.
    let (ccr, reg_state) = state
        .webauthn
        .start_passkey_registration(user_handle, email, email, None)?;

    // The serialized state carries the challenge plus the expected RP
    // ID/origin; step 2 needs it to verify the attestation.
    let state_bytes = serde_json::to_vec(&reg_state)?;
    challenges::save_registration_challenge(&state.db, email, &state_bytes).await?;

    Ok(ccr)
}

/// Step 2: verify the attestation and persist the account.
///
/// On success the account is created with exactly one credential and the
/// caller receives a freshly minted session token. The token is minted
/// *before* anything is persisted: if minting fails, no orphaned account is
/// left behind. The duplicate-email check is enforced by the primary key,
/// not a prior read, so two racing registrations can't both succeed.
///
/// ## Errors
/// - BadRequest: no live challenge for the email, malformed attestation,
///   failed cryptographic verification, or the email got registered in the
///   meantime
/// - Internal: token minting failed
pub async fn finish_registration(
    state: &AppState,
    email: &str,
    response: &Value,
) -> AppResult<String> {
    let challenge = challenges::get_registration_challenge(&state.db, email).await?;

    let reg_state: PasskeyRegistration = serde_json::from_slice(&challenge.state)?;

    let reg_credential: RegisterPublicKeyCredential = serde_json::from_value(response.clone())
        .map_err(|_| AppError::BadRequest("Invalid registration response".to_string()))?;

    // Cryptographic verification: challenge freshness, signature, RP
    // ID/origin, attestation format. Failure maps to 400.
    let passkey = state
        .webauthn
        .finish_passkey_registration(&reg_credential, &reg_state)?;

    let token = state.tokens.mint(email)?;

    let credential_id = BASE64_URL_SAFE_NO_PAD.encode(passkey.cred_id());
    let public_key = BASE64_STANDARD.encode(serde_json::to_vec(&passkey)?);

    // Transport hints from the client, or "internal" for a platform
    // authenticator that reported none.
    let transports = match &reg_credential.response.transports {
        Some(transports) => serde_json::to_string(transports)?,
        None => serde_json::to_string(&["internal"])?,
    };

    let user = User::new(email.to_string());
    let credential = StoredCredential::new(
        credential_id,
        email.to_string(),
        public_key,
        0,
        Some(transports),
    );

    // Account and first credential land together or not at all.
    let mut tx = state.db.begin().await?;

    users::create_user(&mut *tx, &user).await.map_err(|e| match e {
        AppError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            AppError::BadRequest("User already exists".to_string())
        }
        other => other,
    })?;
    credentials::save_credential(&mut *tx, &credential).await?;

    tx.commit().await?;

    // Challenges are single-use; a leftover row would only expire anyway.
    challenges::delete_registration_challenge(&state.db, email).await?;

    tracing::info!(email, "Registered new passkey account");

    Ok(token)
}
