//! Newsletter opt-in. The address arrives already encrypted client-side;
//! the server only deduplicates and stores the ciphertext.

use crate::db::models::Subscriber;
use crate::db::newsletter;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub encrypted: Option<String>,
}

/// POST /api/newsletter/subscribe
///
/// Idempotent: subscribing an already-known ciphertext answers 200 with
/// "Already subscribed" instead of an error.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> AppResult<Json<Value>> {
    let encrypted = req
        .encrypted
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Encrypted email required".to_string()))?;

    if newsletter::find_by_encrypted(&state.db, &encrypted).await?.is_some() {
        return Ok(Json(json!({
            "success": true,
            "message": "Already subscribed"
        })));
    }

    let subscriber = Subscriber::new(encrypted);
    newsletter::subscribe(&state.db, &subscriber).await?;

    tracing::info!(id = %subscriber.id, "New newsletter subscriber");

    Ok(Json(json!({ "success": true })))
}
