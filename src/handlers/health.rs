//! Liveness endpoint for load balancers and monitoring.

use axum::Json;
use serde_json::{json, Value};

/// GET /health — always 200 while the process is up.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "portfolio-api"
    }))
}
