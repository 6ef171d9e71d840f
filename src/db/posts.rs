use crate::db::models::Post;
use crate::error::AppResult;
use sqlx::SqlitePool;

pub async fn create_post(pool: &SqlitePool, post: &Post) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO posts (id, title, slug, excerpt, content, tags, author_email, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&post.id)
    .bind(&post.title)
    .bind(&post.slug)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.tags)
    .bind(&post.author_email)
    .bind(&post.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// All posts, most recent first.
pub async fn list_posts(pool: &SqlitePool) -> AppResult<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>("SELECT * FROM posts ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;

    Ok(posts)
}
