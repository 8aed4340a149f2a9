//! Consistent error responses: `{"error": <code>, "message": <text>}`.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use jarvis_activity::Audited;
use jarvis_auth::{AuthError, AuthzError};
use jarvis_core::DomainError;
use jarvis_infra::{CONFLICT_MESSAGE, INVALID_REFERENCE_MESSAGE, ServiceError, StoreError};

/// Set on a successful mutation whose activity record could not be written.
pub const AUDIT_STATUS_HEADER: &str = "x-audit-status";

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found() -> Self {
        Self::Service(ServiceError::not_found())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err)
    }
}

macro_rules! via_service_error {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ApiError {
                fn from(err: $t) -> Self {
                    Self::Service(err.into())
                }
            }
        )*
    };
}

via_service_error!(AuthError, AuthzError, DomainError, StoreError);

fn internal(detail: &dyn core::fmt::Display) -> Response {
    tracing::error!(error = %detail, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error")
}

fn store_error(err: StoreError) -> Response {
    match err {
        StoreError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", CONFLICT_MESSAGE),
        StoreError::InvalidReference(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_reference", INVALID_REFERENCE_MESSAGE)
        }
        StoreError::TenantIsolation(detail) => {
            tracing::error!(%detail, "tenant isolation violation reached the API");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error")
        }
        other @ (StoreError::Decode(_) | StoreError::Backend(_)) => internal(&other),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
            ApiError::Service(err) => match err {
                ServiceError::Unauthenticated => {
                    json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
                }
                ServiceError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "insufficient permissions"),
                ServiceError::TenantInactive => json_error(
                    StatusCode::FORBIDDEN,
                    "account_inactive",
                    "account inactive or suspended",
                ),
                ServiceError::Domain(DomainError::Validation(msg) | DomainError::InvalidId(msg)) => {
                    json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
                }
                ServiceError::Domain(DomainError::NotFound) => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
                ServiceError::Domain(DomainError::Conflict(msg)) => json_error(StatusCode::CONFLICT, "conflict", msg),
                ServiceError::Domain(DomainError::TenantIsolation(detail)) => {
                    tracing::error!(%detail, "tenant isolation violation reached the API");
                    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error")
                }
                ServiceError::Store(err) => store_error(err),
                ServiceError::Internal(detail) => internal(&detail),
            },
        }
    }
}

/// Success response for an audited mutation.
pub fn audited<T: Serialize>(status: StatusCode, result: Audited<T>) -> Response {
    let failed = result.audit_failed();
    let mut response = (status, axum::Json(result.value)).into_response();
    if failed {
        response
            .headers_mut()
            .insert(AUDIT_STATUS_HEADER, HeaderValue::from_static("failed"));
    }
    response
}
