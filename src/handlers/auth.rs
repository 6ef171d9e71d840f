use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::webauthn::types::*;
use crate::webauthn::{authentication, registration};
use axum::{extract::State, Json};
use serde_json::Value;

// The body is taken as raw JSON and decoded into the step-tagged enum here,
// so an unknown or missing step maps to a clean 400 instead of an extractor
// rejection.

/// POST /api/auth/register — passkey registration, both steps.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let request: RegisterRequest = serde_json::from_value(body)
        .map_err(|_| AppError::BadRequest("Invalid step".to_string()))?;

    match request {
        RegisterRequest::GenerateOptions { email } => {
            let ccr = registration::start_registration(&state, &email).await?;
            Ok(Json(serde_json::to_value(ccr)?))
        }
        RegisterRequest::VerifyRegistration { email, response } => {
            let token = registration::finish_registration(&state, &email, &response).await?;
            Ok(Json(serde_json::to_value(VerifiedResponse {
                verified: true,
                token,
                email,
            })?))
        }
    }
}

/// POST /api/auth/login — passkey authentication, both steps.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let request: LoginRequest = serde_json::from_value(body)
        .map_err(|_| AppError::BadRequest("Invalid step".to_string()))?;

    match request {
        LoginRequest::GenerateOptions { email } => {
            let rcr = authentication::start_authentication(&state, &email).await?;
            Ok(Json(serde_json::to_value(rcr)?))
        }
        LoginRequest::VerifyAuthentication { email, response } => {
            let (email, token) =
                authentication::finish_authentication(&state, email.as_deref(), &response).await?;
            Ok(Json(serde_json::to_value(VerifiedResponse {
                verified: true,
                token,
                email,
            })?))
        }
    }
}
