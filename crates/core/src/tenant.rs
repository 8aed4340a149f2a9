//! Per-request tenant scope.

use crate::TenantId;

/// Tenant context for a request.
///
/// Immutable once built. The API layer builds it from the resolved identity
/// (never from request fields) and every repository and audit call takes it
/// by reference, so a data access without a tenant is a compile error rather
/// than a runtime bug.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TenantContext {
    tenant_id: TenantId,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Whether a row owned by `owner` is visible under this scope.
    pub fn admits(&self, owner: TenantId) -> bool {
        self.tenant_id == owner
    }
}

/// Marks types that carry the tenant they belong to.
pub trait TenantScoped {
    fn tenant_id(&self) -> TenantId;

    fn visible_in(&self, ctx: &TenantContext) -> bool {
        ctx.admits(self.tenant_id())
    }
}
