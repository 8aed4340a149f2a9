use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use jarvis_core::{TenantId, UserId};

use crate::Role;

/// JWT claims model.
///
/// Timestamps travel as the registered `iat`/`exp` numeric claims (seconds
/// since the epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the identity the token was issued to.
    pub sub: UserId,

    /// Tenant the identity belonged to at issuance.
    pub tenant_id: TenantId,

    /// Role at issuance. Authorization uses the live role from the directory.
    pub role: Role,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of already-decoded claims.
///
/// A token is valid on `[issued_at, expires_at)`.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn claims(issued_at: DateTime<Utc>, ttl: Duration) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            tenant_id: TenantId::new(),
            role: Role::USER,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    #[test]
    fn window_is_half_open() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let c = claims(t0, Duration::seconds(60));

        assert_eq!(validate_claims(&c, t0), Ok(()));
        assert_eq!(validate_claims(&c, t0 + Duration::seconds(59)), Ok(()));
        assert_eq!(
            validate_claims(&c, t0 + Duration::seconds(60)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&c, t0 - Duration::seconds(1)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let c = claims(t0, Duration::seconds(-5));
        assert_eq!(validate_claims(&c, t0), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn timestamps_serialize_as_registered_claims() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let c = claims(t0, Duration::hours(24));
        let json = serde_json::to_value(&c).unwrap();

        assert_eq!(json["iat"], 1_700_000_000);
        assert_eq!(json["exp"], 1_700_086_400);
        assert_eq!(json["role"], "user");
    }
}
