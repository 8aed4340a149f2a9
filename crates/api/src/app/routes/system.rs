use axum::{http::StatusCode, response::Response, Json};
use serde_json::{json, Value};

use crate::app::errors::json_error;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": chrono::Utc::now() }))
}

pub async fn info() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth",
            "clients": "/api/clients",
            "products": "/api/products",
            "proposals": "/api/proposals",
            "followups": "/api/followups",
            "activities": "/api/activities",
            "users": "/api/users",
        }
    }))
}

pub async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "route not found")
}
