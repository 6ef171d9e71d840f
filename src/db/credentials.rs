//! # Credential Database Operations
//!
//! CRUD for stored passkey credentials. Only public keys are stored —
//! private keys never leave the user's device.

use crate::db::models::StoredCredential;
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sqlx::SqlitePool;

/// Save a new passkey credential. Takes any executor so registration can
/// insert the user and its first credential atomically.
pub async fn save_credential<'e>(
    executor: impl sqlx::SqliteExecutor<'e>,
    credential: &StoredCredential,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO credentials
         (id, user_email, public_key, counter, transports, created_at, last_used_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&credential.id)
    .bind(&credential.user_email)
    .bind(&credential.public_key)
    .bind(credential.counter)
    .bind(&credential.transports)
    .bind(&credential.created_at)
    .bind(&credential.last_used_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// All credentials registered to an account, oldest first (registration
/// order). Empty vector if the user has none.
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Vec<StoredCredential>> {
    let credentials = sqlx::query_as::<_, StoredCredential>(
        "SELECT * FROM credentials WHERE user_email = ? ORDER BY created_at",
    )
    .bind(email)
    .fetch_all(pool)
    .await?;

    Ok(credentials)
}

pub async fn find_by_id(pool: &SqlitePool, credential_id: &str) -> AppResult<StoredCredential> {
    let credential =
        sqlx::query_as::<_, StoredCredential>("SELECT * FROM credentials WHERE id = ?")
            .bind(credential_id)
            .fetch_one(pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    AppError::NotFound(format!("Credential '{}' not found", credential_id))
                }
                _ => AppError::Database(e),
            })?;

    Ok(credential)
}

/// Write back the state of a credential after a successful authentication:
/// the new signature counter, the re-serialized verifier credential and the
/// last-used timestamp. Skipping this write-back would defeat cloned-
/// authenticator detection over time.
pub async fn update_after_authentication(
    pool: &SqlitePool,
    credential_id: &str,
    new_counter: i64,
    public_key: &str,
) -> AppResult<()> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE credentials
         SET counter = ?, public_key = ?, last_used_at = ?
         WHERE id = ?",
    )
    .bind(new_counter)
    .bind(public_key)
    .bind(now)
    .bind(credential_id)
    .execute(pool)
    .await?;

    Ok(())
}
