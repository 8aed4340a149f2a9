//! Request DTOs and extractors that report failures as JSON errors.

use axum::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use jarvis_auth::Role;
use jarvis_core::{EntityId, EntityType, UserId};
use jarvis_followups::agenda;
use jarvis_query::Pagination;

use super::errors::ApiError;

/// JSON body; a malformed body is a 400 `validation_error`.
pub struct Body<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Body<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Ok(Body(value))
    }
}

/// Query string; unknown keys are ignored, malformed values are a 400.
pub struct Params<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Params<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Ok(Params(value))
    }
}

pub fn parse_entity_id(raw: &str) -> Result<EntityId, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request("invalid id"))
}

pub fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request("invalid user id"))
}

pub fn parse_entity_type(raw: &str) -> Result<EntityType, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request("unknown entity type"))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.limit, self.offset)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AgendaQuery {
    pub assigned_to: Option<UserId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AgendaQuery {
    pub fn pagination(&self) -> Pagination {
        agenda::agenda_page(self.limit, self.offset)
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkClientsRequest {
    pub clients: Vec<JsonValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}
