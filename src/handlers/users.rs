//! Current-user profile endpoint (token protected).

use crate::db::{credentials, users};
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::state::AppState;
use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

/// GET /api/users/me
///
/// Profile of the bearer-token subject. Credential IDs and public keys are
/// deliberately not returned.
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> AppResult<Json<Value>> {
    let user = users::find_by_email(&state.db, &auth.email).await?;
    let credential_count = credentials::find_by_email(&state.db, &user.email).await?.len();

    Ok(Json(json!({
        "email": user.email,
        "registeredAt": user.registered_at,
        "credentials": credential_count,
    })))
}
