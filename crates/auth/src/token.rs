//! Signed, time-limited identity assertions (HS256 JWT).

use chrono::{DateTime, Duration, Timelike, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use jarvis_core::{TenantId, UserId};

use crate::{AuthError, JwtClaims, Role, validate_claims};

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Process-wide token settings. Rotating the secret invalidates every
/// outstanding token.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// What a token asserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub subject: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies bearer tokens.
///
/// Stateless: validity is signature + time window only. There is no
/// revocation list, so a token outlives a logout until it expires; the
/// identity resolver still rejects deactivated accounts on every request.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // The time window is checked by `validate_claims` against an explicit
        // clock, so the library only checks structure and signature.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: config.ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, request: TokenRequest) -> Result<IssuedToken, AuthError> {
        self.issue_at(request, Utc::now())
    }

    pub fn issue_at(&self, request: TokenRequest, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        // Claims carry whole seconds; the reported expiry must match them.
        let now = now.with_nanosecond(0).unwrap_or(now);
        let claims = JwtClaims {
            sub: request.subject,
            tenant_id: request.tenant_id,
            role: request.role,
            issued_at: now,
            expires_at: now + self.ttl,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Fails closed: structure, signature and time-window problems all yield
    /// [`AuthError::Unauthenticated`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::Unauthenticated
        })?;

        validate_claims(&data.claims, now).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::Unauthenticated
        })?;

        Ok(data.claims)
    }
}

/// Parse a `"Bearer <token>"` header value.
///
/// Absent or malformed headers yield `None`; deciding that the caller is
/// unauthenticated is left to whoever requires an identity.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let mut parts = header?.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;

    if parts.next().is_some() || scheme != "Bearer" || token.is_empty() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&TokenConfig::new(secret).with_ttl(Duration::seconds(3600)))
    }

    fn request() -> TokenRequest {
        TokenRequest {
            subject: UserId::new(),
            tenant_id: TenantId::new(),
            role: Role::ADMIN,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn issued_token_verifies_with_same_claims() {
        let svc = service("s3cret");
        let req = request();
        let issued = svc.issue_at(req.clone(), t0()).unwrap();

        let claims = svc.verify_at(&issued.token, t0() + Duration::seconds(1)).unwrap();
        assert_eq!(claims.sub, req.subject);
        assert_eq!(claims.tenant_id, req.tenant_id);
        assert_eq!(claims.role, Role::ADMIN);
        assert_eq!(claims.expires_at, issued.expires_at);
    }

    #[test]
    fn token_is_valid_just_before_expiry_and_rejected_just_after() {
        let svc = service("s3cret");
        let issued = svc.issue_at(request(), t0()).unwrap();
        let expiry = issued.expires_at;

        assert!(svc.verify_at(&issued.token, expiry - Duration::seconds(1)).is_ok());
        assert_eq!(
            svc.verify_at(&issued.token, expiry + Duration::seconds(1)),
            Err(AuthError::Unauthenticated)
        );
    }

    #[test]
    fn reported_expiry_matches_signed_expiry_for_sub_second_issue_time() {
        let svc = service("s3cret");
        let now = t0() + Duration::milliseconds(700);
        let issued = svc.issue_at(request(), now).unwrap();

        assert_eq!(issued.expires_at, t0() + Duration::seconds(3600));
        let claims = svc
            .verify_at(&issued.token, issued.expires_at - Duration::milliseconds(100))
            .unwrap();
        assert_eq!(claims.expires_at, issued.expires_at);
    }

    #[test]
    fn default_ttl_is_one_day() {
        let svc = TokenService::new(&TokenConfig::new("s3cret"));
        let issued = svc.issue_at(request(), t0()).unwrap();
        assert_eq!(issued.expires_at - t0(), Duration::hours(24));
    }

    #[test]
    fn rotated_secret_invalidates_tokens() {
        let issued = service("old").issue_at(request(), t0()).unwrap();
        assert_eq!(
            service("new").verify_at(&issued.token, t0()),
            Err(AuthError::Unauthenticated)
        );
    }

    #[test]
    fn tampered_payload_fails_closed() {
        let svc = service("s3cret");
        let issued = svc.issue_at(request(), t0()).unwrap();
        let other = svc.issue_at(request(), t0()).unwrap();

        // Splice the payload of one token onto the signature of another.
        let a: Vec<&str> = issued.token.split('.').collect();
        let b: Vec<&str> = other.token.split('.').collect();
        let forged = format!("{}.{}.{}", a[0], b[1], a[2]);

        assert_eq!(svc.verify_at(&forged, t0()), Err(AuthError::Unauthenticated));
        assert_eq!(svc.verify_at("garbage", t0()), Err(AuthError::Unauthenticated));
        assert_eq!(svc.verify_at("", t0()), Err(AuthError::Unauthenticated));
    }

    #[test]
    fn extract_bearer_accepts_only_two_part_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_bearer(None), None);
        assert_eq!(extract_bearer(Some("")), None);
        assert_eq!(extract_bearer(Some("Bearer")), None);
        assert_eq!(extract_bearer(Some("Bearer ")), None);
        assert_eq!(extract_bearer(Some("Basic abc")), None);
        assert_eq!(extract_bearer(Some("bearer abc")), None);
        assert_eq!(extract_bearer(Some("Bearer abc extra")), None);
    }
}
