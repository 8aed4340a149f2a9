use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jarvis_core::{ActivityId, EntityId, EntityType, TenantId, UserId};

use crate::Action;

/// Client network details captured with security-relevant events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A persisted, immutable audit entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub id: ActivityId,
    pub tenant_id: TenantId,
    /// `None` for system actions.
    #[serde(rename = "user_id")]
    pub actor_id: Option<UserId>,
    pub entity_type: EntityType,
    /// `None` for collection-level actions such as a bulk import.
    pub entity_id: Option<EntityId>,
    #[serde(flatten)]
    pub action: Action,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An activity to append. The tenant is supplied separately, from the
/// request's context.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub actor_id: Option<UserId>,
    pub entity_type: EntityType,
    pub entity_id: Option<EntityId>,
    pub action: Action,
    pub meta: RequestMeta,
}

impl NewActivity {
    pub fn new(entity_type: EntityType, action: Action) -> Self {
        Self {
            actor_id: None,
            entity_type,
            entity_id: None,
            action,
            meta: RequestMeta::default(),
        }
    }

    pub fn by(mut self, actor: UserId) -> Self {
        self.actor_id = Some(actor);
        self
    }

    pub fn on(mut self, entity_id: impl Into<EntityId>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_meta(mut self, meta: RequestMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn into_record(self, id: ActivityId, tenant_id: TenantId, created_at: DateTime<Utc>) -> ActivityRecord {
        ActivityRecord {
            id,
            tenant_id,
            actor_id: self.actor_id,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            action: self.action,
            ip_address: self.meta.ip_address,
            user_agent: self.meta.user_agent,
            created_at,
        }
    }
}
