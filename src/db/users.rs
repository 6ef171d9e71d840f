use crate::db::models::User;
use crate::error::{AppError, AppResult};
use sqlx::SqlitePool;

/// Insert a new user row. Takes any executor so registration can run it
/// inside the same transaction as the credential insert.
///
/// A duplicate email violates the primary key; the caller decides how to
/// report that.
pub async fn create_user<'e>(
    executor: impl sqlx::SqliteExecutor<'e>,
    user: &User,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO users (email, user_uuid, registered_at)
         VALUES (?, ?, ?)",
    )
    .bind(&user.email)
    .bind(&user.user_uuid)
    .bind(&user.registered_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("User '{}' not found", email)),
            _ => AppError::Database(e),
        })?;

    Ok(user)
}

/// Look up a user by WebAuthn user handle. Used to resolve the account
/// behind an assertion's `userHandle`.
pub async fn find_by_user_uuid(pool: &SqlitePool, user_uuid: &str) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_uuid = ?")
        .bind(user_uuid)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("User not found".to_string()),
            _ => AppError::Database(e),
        })?;

    Ok(user)
}

pub async fn exists(pool: &SqlitePool, email: &str) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}
