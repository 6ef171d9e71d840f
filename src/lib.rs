//! # Portfolio Backend API
//!
//! Backend for a personal portfolio site. The interesting part is the
//! passwordless WebAuthn/passkey flow (`webauthn` module); around it sit a
//! blog listing/upload API, a newsletter opt-in, a rate-limited contact
//! form and a proxy to a hosted conversational assistant.
//!
//! The router is built here so the integration tests can drive the exact
//! same application the binary serves.

pub mod assistant;   // Hosted-assistant API client
pub mod config;      // Environment-variable configuration
pub mod db;          // Database operations (users, credentials, challenges, posts, ...)
pub mod error;       // Error handling and HTTP mapping
pub mod handlers;    // HTTP route handlers
pub mod middleware;  // Bearer-token auth guard
pub mod rate_limit;  // In-memory per-IP limiter
pub mod state;       // Shared application state
pub mod tokens;      // Session token mint/verify
pub mod webauthn;    // WebAuthn registration/authentication logic

use crate::handlers::auth::{login, register};
use crate::handlers::chat::chat;
use crate::handlers::contact::save_contact;
use crate::handlers::health::health_check;
use crate::handlers::newsletter::subscribe;
use crate::handlers::posts::{list_posts, upload_post};
use crate::handlers::users::get_current_user;
use crate::state::AppState;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// CORS is deliberately permissive: the API serves a public site and every
/// endpoint is either public or bearer-token protected. Unknown methods on
/// known paths answer 405; preflight OPTIONS is handled by the CORS layer.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes that require a valid session token.
    let protected_routes = Router::new()
        .route("/api/users/me", get(get_current_user))
        .route("/api/posts/upload", post(upload_post))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        // Passwordless auth: both endpoints dispatch on the body's `step`
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        // Blog
        .route("/api/posts", get(list_posts))
        // Newsletter opt-in
        .route("/api/newsletter/subscribe", post(subscribe))
        // Contact form
        .route("/api/contact", post(save_contact))
        // Assistant chat proxy
        .route("/api/chat", post(chat))
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
