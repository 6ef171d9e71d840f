use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

/// Identity of the verified bearer-token subject, inserted into request
/// extensions for protected handlers.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub email: String,
}

/// Reject requests without a valid `Authorization: Bearer <token>` header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let email = state.tokens.verify(token)?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { email });

    Ok(next.run(request).await)
}
