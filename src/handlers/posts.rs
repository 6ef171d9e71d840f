//! Blog endpoints: public listing plus token-protected upload of a parsed
//! Markdown post.

use crate::db::models::Post;
use crate::db::posts;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::state::AppState;
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const MAX_TITLE_LEN: usize = 200;

/// Upload payload: frontmatter fields already parsed out of the Markdown
/// file client-side.
#[derive(Debug, Deserialize)]
pub struct UploadPostRequest {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional frontmatter date (RFC3339); defaults to upload time.
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub created_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        // Tags are stored as a JSON array string.
        let tags = serde_json::from_str(&post.tags).unwrap_or_default();
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            content: post.content,
            tags,
            author: post.author_email,
            created_at: post.created_at,
        }
    }
}

/// GET /api/posts — all posts, most recent first.
pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let posts: Vec<PostResponse> = posts::list_posts(&state.db)
        .await?
        .into_iter()
        .map(PostResponse::from)
        .collect();

    Ok(Json(json!({ "posts": posts })))
}

/// POST /api/posts/upload — store a new post for the authenticated author.
pub async fn upload_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<UploadPostRequest>,
) -> AppResult<Json<Value>> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    if req.title.len() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(format!(
            "Title is too long (max {} characters)",
            MAX_TITLE_LEN
        )));
    }
    if req.content.trim().is_empty() {
        return Err(AppError::BadRequest("Content is required".to_string()));
    }

    let slug = slugify(&req.title);
    let post = Post::new(
        req.title,
        slug,
        req.excerpt,
        req.content,
        req.tags,
        Some(auth.email),
        req.date,
    );

    posts::create_post(&state.db, &post).await?;

    tracing::info!(id = %post.id, slug = %post.slug, "Stored new blog post");

    Ok(Json(json!({
        "success": true,
        "post": PostResponse::from(post),
    })))
}

/// Derive a URL slug from a post title: lowercase, alphanumeric runs
/// joined by single hyphens.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;

    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Rust -- & WebAuthn!"), "rust-webauthn");
    }

    #[test]
    fn slugify_trims_edges() {
        assert_eq!(slugify("  ¿Qué es WebAuthn?  "), "qué-es-webauthn");
    }
}
