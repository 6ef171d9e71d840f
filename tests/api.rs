//! End-to-end tests driving the full router against an in-memory SQLite
//! database. Positive-path WebAuthn ceremonies need a real authenticator,
//! so those are exercised up to the point where an attestation/assertion
//! would be required; everything around them is covered here.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use portfolio_api::db::models::User;
use portfolio_api::db::{challenges, users};
use portfolio_api::rate_limit::RateLimiter;
use portfolio_api::state::AppState;
use portfolio_api::tokens::TokenIssuer;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use webauthn_rs::prelude::*;

const TEST_SECRET: &str = "integration-test-secret";

/// Fresh application state over an in-memory database.
///
/// The pool is capped at one connection: each connection to
/// `sqlite::memory:` gets its own database, so a larger pool would scatter
/// the tables.
async fn test_state() -> AppState {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&db).await.unwrap();

    let rp_origin = Url::parse("http://localhost:8080").unwrap();
    let webauthn = WebauthnBuilder::new("localhost", &rp_origin)
        .unwrap()
        .rp_name("Portfolio Test")
        .build()
        .unwrap();

    AppState {
        db,
        webauthn: Arc::new(webauthn),
        tokens: TokenIssuer::new(TEST_SECRET, 3600),
        assistant: None,
        contact_limiter: Arc::new(RateLimiter::new(3, Duration::from_secs(3600))),
    }
}

async fn test_app() -> (Router, AppState) {
    let state = test_state().await;
    (portfolio_api::app(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

/// A syntactically valid assertion: base64url fields decode, but there is
/// no ceremony behind it.
fn dummy_assertion() -> Value {
    json!({
        "id": "dGVzdA",
        "rawId": "dGVzdA",
        "response": {
            "authenticatorData": "",
            "clientDataJSON": "",
            "signature": "",
            "userHandle": null
        },
        "extensions": {},
        "type": "public-key"
    })
}

#[tokio::test]
async fn health_check_works() {
    let (app, _) = test_app().await;

    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn registration_options_issue_a_challenge() {
    let (app, _) = test_app().await;

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        json!({ "step": "generate-options", "email": "new@example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let challenge = body["publicKey"]["challenge"].as_str().unwrap();
    assert!(!challenge.is_empty());
    assert_eq!(body["publicKey"]["rp"]["id"], "localhost");
}

#[tokio::test]
async fn reissued_registration_challenge_replaces_the_first() {
    let (app, state) = test_app().await;
    let email = "repeat@example.com";
    let body = json!({ "step": "generate-options", "email": email });

    let (_, first) = post_json(&app, "/api/auth/register", body.clone()).await;
    let (_, second) = post_json(&app, "/api/auth/register", body).await;

    assert_ne!(
        first["publicKey"]["challenge"],
        second["publicKey"]["challenge"]
    );

    // Only the most recent challenge is stored for the email.
    let stored = challenges::get_registration_challenge(&state.db, email)
        .await
        .unwrap();
    let state_json: Value = serde_json::from_slice(&stored.state).unwrap();
    assert!(state_json
        .to_string()
        .contains(second["publicKey"]["challenge"].as_str().unwrap()));
}

#[tokio::test]
async fn registration_options_reject_existing_user() {
    let (app, state) = test_app().await;
    users::create_user(&state.db, &User::new("taken@example.com".to_string()))
        .await
        .unwrap();

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        json!({ "step": "generate-options", "email": "taken@example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn verify_registration_without_challenge_fails() {
    let (app, _) = test_app().await;

    let (status, body) = post_json(
        &app,
        "/api/auth/register",
        json!({
            "step": "verify-registration",
            "email": "nobody@example.com",
            "response": {}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Challenge not found");
}

#[tokio::test]
async fn login_options_for_unknown_user_are_404() {
    let (app, _) = test_app().await;

    let (status, body) = post_json(
        &app,
        "/api/auth/login",
        json!({ "step": "generate-options", "email": "ghost@example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found or no credentials registered");
}

#[tokio::test]
async fn login_options_for_user_without_credentials_are_404() {
    let (app, state) = test_app().await;
    // Account row exists but no credential was ever stored.
    users::create_user(&state.db, &User::new("bare@example.com".to_string()))
        .await
        .unwrap();

    let (status, body) = post_json(
        &app,
        "/api/auth/login",
        json!({ "step": "generate-options", "email": "bare@example.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found or no credentials registered");
}

#[tokio::test]
async fn verify_authentication_without_challenge_fails() {
    let (app, _) = test_app().await;

    let (status, body) = post_json(
        &app,
        "/api/auth/login",
        json!({
            "step": "verify-authentication",
            "email": "nobody@example.com",
            "response": dummy_assertion()
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Challenge not found");
}

#[tokio::test]
async fn verify_authentication_without_any_identity_fails() {
    let (app, _) = test_app().await;

    // No email and a null userHandle: the account can't be resolved.
    let (status, body) = post_json(
        &app,
        "/api/auth/login",
        json!({
            "step": "verify-authentication",
            "response": dummy_assertion()
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Challenge not found");
}

#[tokio::test]
async fn unknown_step_is_rejected() {
    let (app, _) = test_app().await;

    for body in [
        json!({ "step": "make-coffee", "email": "a@x.com" }),
        json!({ "email": "a@x.com" }),
    ] {
        let (status, response) = post_json(&app, "/api/auth/register", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "Invalid step");
    }
}

#[tokio::test]
async fn newsletter_subscription_is_idempotent() {
    let (app, _) = test_app().await;
    let body = json!({ "encrypted": "YWJjZGVmZ2hpamtsbW5vcA" });

    let (status, first) = post_json(&app, "/api/newsletter/subscribe", body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);

    let (status, second) = post_json(&app, "/api/newsletter/subscribe", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["success"], true);
    assert_eq!(second["message"], "Already subscribed");
}

#[tokio::test]
async fn newsletter_requires_encrypted_payload() {
    let (app, _) = test_app().await;

    let (status, body) = post_json(&app, "/api/newsletter/subscribe", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Encrypted email required");
}

#[tokio::test]
async fn contact_form_stores_a_message() {
    let (app, _) = test_app().await;

    let (status, body) = post_json(
        &app,
        "/api/contact",
        json!({
            "name": "Ada",
            "message": "Hello there",
            "email": "ada@example.com"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(!body["contactId"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn contact_form_validates_input() {
    let (app, _) = test_app().await;

    let (status, body) = post_json(&app, "/api/contact", json!({ "message": "hi" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name is required");

    let (status, body) = post_json(
        &app,
        "/api/contact",
        json!({ "name": "Ada", "message": "hi", "email": "not-an-email" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email format");
}

#[tokio::test]
async fn contact_form_rate_limits_per_ip() {
    let (app, _) = test_app().await;
    let body = json!({ "name": "Ada", "message": "Hello again" });

    for _ in 0..3 {
        let request = Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    let request = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, response) = send(&app, request).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response["error"],
        "Too many attempts. Please wait an hour before trying again."
    );

    // A different client is unaffected.
    let request = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "198.51.100.4")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn post_listing_starts_empty() {
    let (app, _) = test_app().await;

    let (status, body) = get(&app, "/api/posts").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn post_upload_requires_a_token() {
    let (app, _state) = test_app().await;
    let payload = json!({ "title": "Untitled", "content": "body" });

    let (status, _) = post_json(&app, "/api/posts/upload", payload.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/api/posts/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");

    // A token signed with a different secret is also rejected.
    let forged = TokenIssuer::new("other-secret", 3600)
        .mint("author@example.com")
        .unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/posts/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", forged))
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_upload_and_listing_round_trip() {
    let (app, state) = test_app().await;
    let token = state.tokens.mint("author@example.com").unwrap();

    let payload = json!({
        "title": "WebAuthn in Practice",
        "content": "# Heading\n\nBody text.",
        "excerpt": "A short summary",
        "tags": ["webauthn", "rust"]
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/posts/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["post"]["slug"], "webauthn-in-practice");
    assert_eq!(body["post"]["author"], "author@example.com");

    let (status, listing) = get(&app, "/api/posts").await;
    assert_eq!(status, StatusCode::OK);
    let posts = listing["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "WebAuthn in Practice");
    assert_eq!(posts[0]["tags"], json!(["webauthn", "rust"]));
}

#[tokio::test]
async fn post_upload_validates_title_and_content() {
    let (app, state) = test_app().await;
    let token = state.tokens.mint("author@example.com").unwrap();

    for (payload, expected) in [
        (json!({ "title": "  ", "content": "body" }), "Title is required"),
        (json!({ "title": "Hi", "content": "" }), "Content is required"),
    ] {
        let request = Request::builder()
            .method("POST")
            .uri("/api/posts/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(payload.to_string()))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], expected);
    }
}

#[tokio::test]
async fn current_user_profile_requires_and_honors_token() {
    let (app, state) = test_app().await;
    users::create_user(&state.db, &User::new("me@example.com".to_string()))
        .await
        .unwrap();

    let (status, _) = get(&app, "/api/users/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = state.tokens.mint("me@example.com").unwrap();
    let request = Request::builder()
        .uri("/api/users/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "me@example.com");
    assert_eq!(body["credentials"], 0);
}

#[tokio::test]
async fn chat_requires_configuration_and_a_message() {
    let (app, _) = test_app().await;

    let (status, body) = post_json(&app, "/api/chat", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message is required");

    // No assistant credentials configured in tests.
    let (status, body) = post_json(&app, "/api/chat", json!({ "message": "hi" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Server configuration error");
}
