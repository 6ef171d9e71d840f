//! # Challenge Storage
//!
//! Outstanding WebAuthn challenges, one row per email and ceremony kind.
//! Issuing a new challenge for an email replaces the previous one, so at
//! most one challenge per account is ever live — verifying against a
//! superseded or expired challenge fails. Keying by email (instead of a
//! process-global slot) keeps concurrent users from clobbering each other
//! and works across server instances sharing the database.

use crate::db::models::{AuthenticationChallenge, RegistrationChallenge};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sqlx::SqlitePool;

// Registration challenge operations

pub async fn save_registration_challenge(
    pool: &SqlitePool,
    email: &str,
    state: &[u8],
) -> AppResult<()> {
    let challenge = RegistrationChallenge::new(email.to_string(), state.to_vec());

    sqlx::query(
        "INSERT INTO registration_challenges (email, state, created_at, expires_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(email) DO UPDATE SET
             state = excluded.state,
             created_at = excluded.created_at,
             expires_at = excluded.expires_at",
    )
    .bind(&challenge.email)
    .bind(&challenge.state)
    .bind(&challenge.created_at)
    .bind(&challenge.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_registration_challenge(
    pool: &SqlitePool,
    email: &str,
) -> AppResult<RegistrationChallenge> {
    let challenge = sqlx::query_as::<_, RegistrationChallenge>(
        "SELECT * FROM registration_challenges WHERE email = ?",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::BadRequest("Challenge not found".to_string()),
        _ => AppError::Database(e),
    })?;

    check_expiry(&challenge.expires_at)?;

    Ok(challenge)
}

pub async fn delete_registration_challenge(pool: &SqlitePool, email: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM registration_challenges WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await?;

    Ok(())
}

// Authentication challenge operations

pub async fn save_authentication_challenge(
    pool: &SqlitePool,
    email: &str,
    state: &[u8],
) -> AppResult<()> {
    let challenge = AuthenticationChallenge::new(email.to_string(), state.to_vec());

    sqlx::query(
        "INSERT INTO authentication_challenges (email, state, created_at, expires_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(email) DO UPDATE SET
             state = excluded.state,
             created_at = excluded.created_at,
             expires_at = excluded.expires_at",
    )
    .bind(&challenge.email)
    .bind(&challenge.state)
    .bind(&challenge.created_at)
    .bind(&challenge.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_authentication_challenge(
    pool: &SqlitePool,
    email: &str,
) -> AppResult<AuthenticationChallenge> {
    let challenge = sqlx::query_as::<_, AuthenticationChallenge>(
        "SELECT * FROM authentication_challenges WHERE email = ?",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::BadRequest("Challenge not found".to_string()),
        _ => AppError::Database(e),
    })?;

    check_expiry(&challenge.expires_at)?;

    Ok(challenge)
}

pub async fn delete_authentication_challenge(pool: &SqlitePool, email: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM authentication_challenges WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete expired challenges of both kinds. Run periodically so abandoned
/// ceremonies don't accumulate.
pub async fn cleanup_expired_challenges(pool: &SqlitePool) -> AppResult<()> {
    let now = Utc::now().to_rfc3339();

    sqlx::query("DELETE FROM registration_challenges WHERE expires_at < ?")
        .bind(&now)
        .execute(pool)
        .await?;

    sqlx::query("DELETE FROM authentication_challenges WHERE expires_at < ?")
        .bind(&now)
        .execute(pool)
        .await?;

    Ok(())
}

fn check_expiry(expires_at: &str) -> AppResult<()> {
    let expires_at = chrono::DateTime::parse_from_rfc3339(expires_at)
        .map_err(|_| AppError::Internal("Invalid expiration timestamp".to_string()))?;

    if Utc::now() > expires_at {
        return Err(AppError::BadRequest("Challenge expired".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        // One connection: every connection to sqlite::memory: is its own db.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn reissue_replaces_previous_challenge() {
        let pool = test_pool().await;

        save_registration_challenge(&pool, "a@x.com", b"first").await.unwrap();
        save_registration_challenge(&pool, "a@x.com", b"second").await.unwrap();

        let stored = get_registration_challenge(&pool, "a@x.com").await.unwrap();
        assert_eq!(stored.state, b"second");

        // Other accounts are untouched.
        save_registration_challenge(&pool, "b@x.com", b"other").await.unwrap();
        let stored = get_registration_challenge(&pool, "a@x.com").await.unwrap();
        assert_eq!(stored.state, b"second");
    }

    #[tokio::test]
    async fn missing_challenge_is_reported() {
        let pool = test_pool().await;

        let err = get_authentication_challenge(&pool, "nobody@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m == "Challenge not found"));
    }

    #[tokio::test]
    async fn expired_challenge_is_rejected_and_cleaned_up() {
        let pool = test_pool().await;
        save_authentication_challenge(&pool, "a@x.com", b"state").await.unwrap();

        // Backdate the expiry.
        let past = (Utc::now() - chrono::Duration::minutes(10)).to_rfc3339();
        sqlx::query("UPDATE authentication_challenges SET expires_at = ?")
            .bind(&past)
            .execute(&pool)
            .await
            .unwrap();

        let err = get_authentication_challenge(&pool, "a@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m == "Challenge expired"));

        cleanup_expired_challenges(&pool).await.unwrap();
        let err = get_authentication_challenge(&pool, "a@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m == "Challenge not found"));
    }
}
