use crate::db::{challenges, credentials, users};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use base64::prelude::*;
use serde_json::Value;
use uuid::Uuid;
use webauthn_rs::prelude::*;

/// Step 1: issue authentication options for a known account.
///
/// 404 when the email has no account or no stored credentials — never an
/// empty allow-list. The allow-list covers every stored credential, so any
/// of the user's registered authenticators can answer.
pub async fn start_authentication(
    state: &AppState,
    email: &str,
) -> AppResult<RequestChallengeResponse> {
    let user = users::find_by_email(&state.db, email).await.map_err(not_registered)?;

    let stored_creds = credentials::find_by_email(&state.db, &user.email).await?;
    if stored_creds.is_empty() {
        return Err(AppError::NotFound(
            "User not found or no credentials registered".to_string(),
        ));
    }

    let passkeys = deserialize_passkeys(&stored_creds)?;

    let (rcr, auth_state) = state.webauthn.start_passkey_authentication(&passkeys)?;

    let state_bytes = serde_json::to_vec(&auth_state)?;
    challenges::save_authentication_challenge(&state.db, &user.email, &state_bytes).await?;

    Ok(rcr)
}

/// Step 2: verify the signed assertion and mint a session token.
///
/// The account is resolved from the assertion's `userHandle` (the
/// deterministic handle stored at registration) or, failing that, from the
/// optional `email` field. With the account known, the email's outstanding
/// challenge is loaded and handed to the verification library together
/// with the assertion.
///
/// On success the matched credential's signature counter is written back —
/// the counter is what detects cloned authenticators, so skipping the
/// write-back would blind that check. Returns the verified email and a
/// fresh session token.
pub async fn finish_authentication(
    state: &AppState,
    email: Option<&str>,
    response: &Value,
) -> AppResult<(String, String)> {
    let credential: PublicKeyCredential = serde_json::from_value(response.clone())
        .map_err(|_| AppError::BadRequest("Invalid authentication response".to_string()))?;

    let email = resolve_email(state, email, &credential).await?;

    let challenge = challenges::get_authentication_challenge(&state.db, &email).await?;
    let auth_state: PasskeyAuthentication = serde_json::from_slice(&challenge.state)?;

    let auth_result = state
        .webauthn
        .finish_passkey_authentication(&credential, &auth_state)?;

    // Counter write-back for the credential that actually answered.
    let credential_id = BASE64_URL_SAFE_NO_PAD.encode(auth_result.cred_id());
    let stored = credentials::find_by_id(&state.db, &credential_id).await?;

    let mut passkey: Passkey = serde_json::from_slice(&BASE64_STANDARD.decode(&stored.public_key).map_err(
        |_| AppError::Internal("Stored credential is not valid base64".to_string()),
    )?)?;
    let _ = passkey.update_credential(&auth_result);

    let public_key = BASE64_STANDARD.encode(serde_json::to_vec(&passkey)?);
    credentials::update_after_authentication(
        &state.db,
        &credential_id,
        auth_result.counter() as i64,
        &public_key,
    )
    .await?;

    challenges::delete_authentication_challenge(&state.db, &email).await?;

    let token = state.tokens.mint(&email)?;

    tracing::info!(email, credential_id, "Passkey authentication succeeded");

    Ok((email, token))
}

/// Map the account behind an assertion.
///
/// Preference order: explicit email from the request body, then the
/// assertion's `userHandle`. A client that skipped generate-options ends up
/// here with neither resolvable state nor challenge, which reads as
/// "Challenge not found" — same answer it would get one step later.
async fn resolve_email(
    state: &AppState,
    email: Option<&str>,
    credential: &PublicKeyCredential,
) -> AppResult<String> {
    if let Some(email) = email {
        return Ok(email.to_string());
    }

    let handle = credential
        .response
        .user_handle
        .as_ref()
        .and_then(|h| Uuid::from_slice(h.as_ref()).ok())
        .ok_or_else(|| AppError::BadRequest("Challenge not found".to_string()))?;

    let user = users::find_by_user_uuid(&state.db, &handle.to_string())
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::BadRequest("Challenge not found".to_string()),
            other => other,
        })?;

    Ok(user.email)
}

fn deserialize_passkeys(stored: &[crate::db::models::StoredCredential]) -> AppResult<Vec<Passkey>> {
    stored
        .iter()
        .map(|cred| {
            let bytes = BASE64_STANDARD.decode(&cred.public_key).map_err(|_| {
                AppError::Internal("Stored credential is not valid base64".to_string())
            })?;
            Ok(serde_json::from_slice(&bytes)?)
        })
        .collect()
}

fn not_registered(e: AppError) -> AppError {
    match e {
        AppError::NotFound(_) => {
            AppError::NotFound("User not found or no credentials registered".to_string())
        }
        other => other,
    }
}
