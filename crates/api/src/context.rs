//! Per-request values handlers extract.

use std::net::SocketAddr;

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use jarvis_activity::RequestMeta;

/// Network details of the caller, recorded with audited actions.
///
/// The address comes from the first `x-forwarded-for` hop when present,
/// otherwise from the socket peer.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta(pub RequestMeta);

fn header(parts: &Parts, name: impl axum::http::header::AsHeaderName) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientMeta {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = header(parts, "x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|hop| hop.trim().to_string()))
            .filter(|hop| !hop.is_empty());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(ClientMeta(RequestMeta {
            ip_address: forwarded.or(peer),
            user_agent: header(parts, USER_AGENT),
        }))
    }
}
