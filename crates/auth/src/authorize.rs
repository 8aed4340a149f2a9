use thiserror::Error;

use crate::{Identity, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden")]
    Forbidden,
}

/// Role gate for role-restricted operations.
///
/// - No IO
/// - No panics
/// - Exact set membership, no role inheritance
///
/// Takes a resolved [`Identity`], so an unauthenticated caller can never get
/// this far; it is rejected upstream as unauthenticated, not forbidden.
pub fn require_role(identity: &Identity, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.iter().any(|role| role == &identity.role) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %identity.user_id,
            role = %identity.role,
            "role gate denied"
        );
        Err(AuthzError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use jarvis_core::{TenantId, UserId};

    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: UserId::new(),
            tenant_id: TenantId::new(),
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            role,
        }
    }

    #[test]
    fn user_is_forbidden_on_admin_gate() {
        assert_eq!(
            require_role(&identity(Role::USER), &[Role::ADMIN]),
            Err(AuthzError::Forbidden)
        );
    }

    #[test]
    fn admin_passes_admin_gate() {
        assert_eq!(require_role(&identity(Role::ADMIN), &[Role::ADMIN]), Ok(()));
    }

    #[test]
    fn no_implicit_hierarchy() {
        // admin is not implicitly a member of a user-only gate
        assert_eq!(
            require_role(&identity(Role::ADMIN), &[Role::USER]),
            Err(AuthzError::Forbidden)
        );
        assert_eq!(
            require_role(&identity(Role::ADMIN), &[Role::USER, Role::ADMIN]),
            Ok(())
        );
    }

    #[test]
    fn custom_roles_match_exactly() {
        let manager = identity(Role::new("manager"));
        assert_eq!(require_role(&manager, &[Role::new("manager")]), Ok(()));
        assert_eq!(
            require_role(&manager, &[Role::new("Manager")]),
            Err(AuthzError::Forbidden)
        );
    }
}
