use crate::db::models::ContactMessage;
use crate::error::AppResult;
use sqlx::SqlitePool;

pub async fn save_message(pool: &SqlitePool, message: &ContactMessage) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO contact_messages (id, name, message, email, phone, ip, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&message.id)
    .bind(&message.name)
    .bind(&message.message)
    .bind(&message.email)
    .bind(&message.phone)
    .bind(&message.ip)
    .bind(&message.created_at)
    .execute(pool)
    .await?;

    Ok(())
}
