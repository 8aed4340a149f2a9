use serde::{Deserialize, Serialize};

use jarvis_core::{TenantContext, TenantId, TenantScoped, UserId};

use crate::Role;

/// An authenticated principal, as read from the live directory.
///
/// Only [`crate::IdentityResolver`] produces these for request handling; its
/// tenant is the single source of the request's [`TenantContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Identity {
    pub fn tenant_context(&self) -> TenantContext {
        TenantContext::new(self.tenant_id)
    }
}

impl TenantScoped for Identity {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
