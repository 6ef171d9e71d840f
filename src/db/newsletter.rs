use crate::db::models::Subscriber;
use crate::error::AppResult;
use sqlx::SqlitePool;

/// Check whether this (client-side encrypted) address is already on the
/// list. The ciphertext is the dedupe key.
pub async fn find_by_encrypted(
    pool: &SqlitePool,
    encrypted: &str,
) -> AppResult<Option<Subscriber>> {
    let subscriber = sqlx::query_as::<_, Subscriber>(
        "SELECT * FROM newsletter_subscribers WHERE encrypted = ?",
    )
    .bind(encrypted)
    .fetch_optional(pool)
    .await?;

    Ok(subscriber)
}

pub async fn subscribe(pool: &SqlitePool, subscriber: &Subscriber) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO newsletter_subscribers (id, encrypted, subscribed_at)
         VALUES (?, ?, ?)",
    )
    .bind(&subscriber.id)
    .bind(&subscriber.encrypted)
    .bind(&subscriber.subscribed_at)
    .execute(pool)
    .await?;

    Ok(())
}
