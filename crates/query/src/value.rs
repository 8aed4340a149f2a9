//! Typed query parameters.

use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use jarvis_core::{EntityId, TenantId, UserId};

/// A positional parameter or a column value read from a row.
///
/// Scalars carry an `Option` so that a NULL keeps its SQL type when bound
/// (an untyped NULL cannot be inserted into a `uuid` column).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Uuid(Option<Uuid>),
    Timestamp(Option<DateTime<Utc>>),
    TextArray(Vec<String>),
    Json(serde_json::Value),
}

impl SqlValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(Some(value.into()))
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Bool(v) => v.is_none(),
            Self::Int(v) => v.is_none(),
            Self::Float(v) => v.is_none(),
            Self::Text(v) => v.is_none(),
            Self::Uuid(v) => v.is_none(),
            Self::Timestamp(v) => v.is_none(),
            Self::TextArray(_) => false,
            Self::Json(v) => v.is_null(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// SQL comparison between two non-null values of the same type.
    ///
    /// `None` when either side is NULL or the types differ, mirroring SQL
    /// where such comparisons are never true.
    pub fn compare(&self, other: &SqlValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(Some(a)), Self::Bool(Some(b))) => Some(a.cmp(b)),
            (Self::Int(Some(a)), Self::Int(Some(b))) => Some(a.cmp(b)),
            (Self::Float(Some(a)), Self::Float(Some(b))) => a.partial_cmp(b),
            (Self::Int(Some(a)), Self::Float(Some(b))) => (*a as f64).partial_cmp(b),
            (Self::Float(Some(a)), Self::Int(Some(b))) => a.partial_cmp(&(*b as f64)),
            (Self::Text(Some(a)), Self::Text(Some(b))) => Some(a.cmp(b)),
            (Self::Uuid(Some(a)), Self::Uuid(Some(b))) => Some(a.cmp(b)),
            (Self::Timestamp(Some(a)), Self::Timestamp(Some(b))) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

macro_rules! impl_from_scalar {
    ($variant:ident, $t:ty) => {
        impl From<$t> for SqlValue {
            fn from(value: $t) -> Self {
                Self::$variant(Some(value.into()))
            }
        }

        impl From<Option<$t>> for SqlValue {
            fn from(value: Option<$t>) -> Self {
                Self::$variant(value.map(Into::into))
            }
        }
    };
}

impl_from_scalar!(Bool, bool);
impl_from_scalar!(Int, i64);
impl_from_scalar!(Int, i32);
impl_from_scalar!(Float, f64);
impl_from_scalar!(Text, String);
impl_from_scalar!(Text, &str);
impl_from_scalar!(Uuid, Uuid);
impl_from_scalar!(Timestamp, DateTime<Utc>);

macro_rules! impl_from_id {
    ($t:ty) => {
        impl From<$t> for SqlValue {
            fn from(value: $t) -> Self {
                Self::Uuid(Some(*value.as_uuid()))
            }
        }

        impl From<Option<$t>> for SqlValue {
            fn from(value: Option<$t>) -> Self {
                Self::Uuid(value.map(|id| *id.as_uuid()))
            }
        }
    };
}

impl_from_id!(EntityId);
impl_from_id!(TenantId);
impl_from_id!(UserId);

impl From<Vec<String>> for SqlValue {
    fn from(value: Vec<String>) -> Self {
        Self::TextArray(value)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_never_compare() {
        assert_eq!(SqlValue::Int(None).compare(&SqlValue::Int(Some(1))), None);
        assert_eq!(SqlValue::text("a").compare(&SqlValue::Int(Some(1))), None);
        assert_eq!(
            SqlValue::text("a").compare(&SqlValue::text("b")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn typed_nulls_keep_their_type() {
        let v: SqlValue = Option::<EntityId>::None.into();
        assert_eq!(v, SqlValue::Uuid(None));
        assert!(v.is_null());
        assert!(!SqlValue::TextArray(vec![]).is_null());
    }
}
