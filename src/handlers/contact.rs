//! Contact-form endpoint: validation, sanitization, per-IP rate limiting
//! and storage of the message.

use crate::db::contacts;
use crate::db::models::ContactMessage;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, Json};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::OnceLock;

const MAX_NAME_LEN: usize = 100;
const MAX_MESSAGE_LEN: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub message: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// POST /api/contact
pub async fn save_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ContactRequest>,
) -> AppResult<Json<Value>> {
    let name = req
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Name is required".to_string()))?;
    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Message is required".to_string()))?;

    if name.len() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Name is too long (max {} characters)",
            MAX_NAME_LEN
        )));
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(AppError::BadRequest(format!(
            "Message is too long (max {} characters)",
            MAX_MESSAGE_LEN
        )));
    }

    if let Some(email) = &req.email {
        if !email.is_empty() && !is_valid_email(email) {
            return Err(AppError::BadRequest("Invalid email format".to_string()));
        }
    }
    if let Some(phone) = &req.phone {
        if !phone.is_empty() && !is_valid_phone(phone) {
            return Err(AppError::BadRequest("Invalid phone format".to_string()));
        }
    }

    let ip = client_ip(&headers);

    if !state.contact_limiter.check(&ip) {
        return Err(AppError::RateLimited(
            "Too many attempts. Please wait an hour before trying again.".to_string(),
        ));
    }

    let contact = ContactMessage::new(
        sanitize(&name),
        sanitize(&message),
        req.email.filter(|e| !e.is_empty()).map(|e| sanitize(&e)),
        req.phone.filter(|p| !p.is_empty()).map(|p| sanitize(&p)),
        ip,
    );

    contacts::save_message(&state.db, &contact).await?;

    tracing::info!(id = %contact.id, "Stored contact message");

    Ok(Json(json!({
        "success": true,
        "message": "Thanks! Your message has been sent.",
        "contactId": contact.id,
    })))
}

/// Client IP for rate limiting: first hop of `x-forwarded-for`, then
/// `client-ip`, then "unknown".
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("client-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
    re.is_match(email)
}

fn is_valid_phone(phone: &str) -> bool {
    static PHONE_RE: OnceLock<Regex> = OnceLock::new();
    let re = PHONE_RE.get_or_init(|| {
        Regex::new(r"^\+?\(?[0-9]{1,4}\)?[-\s.]?\(?[0-9]{1,4}\)?[-\s.]?[0-9]{1,9}$").unwrap()
    });
    re.is_match(phone)
}

/// Strip HTML tags and trim. Storage-side hardening only; the values are
/// never rendered unescaped anywhere in this service.
fn sanitize(text: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    re.replace_all(text, "").trim().to_string()
}
