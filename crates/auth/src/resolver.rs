//! The single point where a network credential becomes a trusted,
//! tenant-scoped principal.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use jarvis_core::UserId;

use crate::{AuthError, Identity, TokenService, extract_bearer};

/// Live identity lookup backing [`IdentityResolver`].
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// The identity for `user_id`, only if the user is active and belongs to
    /// an active tenant. Inactive and nonexistent users both yield `None`.
    async fn find_active(&self, user_id: UserId) -> Result<Option<Identity>, AuthError>;
}

#[async_trait]
impl<D> IdentityDirectory for Arc<D>
where
    D: IdentityDirectory + ?Sized,
{
    async fn find_active(&self, user_id: UserId) -> Result<Option<Identity>, AuthError> {
        (**self).find_active(user_id).await
    }
}

/// Verifies a bearer token and re-reads the identity it names.
#[derive(Clone)]
pub struct IdentityResolver {
    tokens: Arc<TokenService>,
    directory: Arc<dyn IdentityDirectory>,
}

impl IdentityResolver {
    pub fn new(tokens: Arc<TokenService>, directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { tokens, directory }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Resolve from a raw `Authorization` header value.
    pub async fn resolve_header(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let token = extract_bearer(header).ok_or(AuthError::Unauthenticated)?;
        self.resolve(token).await
    }

    pub async fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        self.resolve_at(token, Utc::now()).await
    }

    pub async fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let claims = self.tokens.verify_at(token, now)?;

        let identity = self
            .directory
            .find_active(claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::debug!(user_id = %claims.sub, "token subject not found or inactive");
                AuthError::Unauthenticated
            })?;

        if identity.tenant_id != claims.tenant_id {
            tracing::warn!(
                user_id = %claims.sub,
                token_tenant = %claims.tenant_id,
                "token tenant does not match the identity's tenant"
            );
            return Err(AuthError::Unauthenticated);
        }

        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use chrono::Duration;
    use jarvis_core::TenantId;

    use super::*;
    use crate::{Role, TokenConfig, TokenRequest};

    #[derive(Default)]
    struct FakeDirectory {
        users: RwLock<HashMap<UserId, (Identity, bool)>>,
    }

    impl FakeDirectory {
        fn insert(&self, identity: Identity, active: bool) {
            self.users
                .write()
                .unwrap()
                .insert(identity.user_id, (identity, active));
        }
    }

    #[async_trait]
    impl IdentityDirectory for FakeDirectory {
        async fn find_active(&self, user_id: UserId) -> Result<Option<Identity>, AuthError> {
            Ok(self
                .users
                .read()
                .unwrap()
                .get(&user_id)
                .filter(|(_, active)| *active)
                .map(|(identity, _)| identity.clone()))
        }
    }

    fn identity(tenant_id: TenantId) -> Identity {
        Identity {
            user_id: UserId::new(),
            tenant_id,
            email: "bia@example.com".to_string(),
            name: "Bia".to_string(),
            role: Role::USER,
        }
    }

    fn setup() -> (IdentityResolver, Arc<TokenService>, Arc<FakeDirectory>) {
        let tokens = Arc::new(TokenService::new(
            &TokenConfig::new("test-secret").with_ttl(Duration::minutes(10)),
        ));
        let directory = Arc::new(FakeDirectory::default());
        let resolver = IdentityResolver::new(tokens.clone(), directory.clone());
        (resolver, tokens, directory)
    }

    fn token_for(tokens: &TokenService, identity: &Identity) -> String {
        tokens
            .issue(TokenRequest {
                subject: identity.user_id,
                tenant_id: identity.tenant_id,
                role: identity.role.clone(),
            })
            .unwrap()
            .token
    }

    #[tokio::test]
    async fn resolves_active_identity_and_its_tenant() {
        let (resolver, tokens, directory) = setup();
        let who = identity(TenantId::new());
        directory.insert(who.clone(), true);

        let header = format!("Bearer {}", token_for(&tokens, &who));
        let resolved = resolver.resolve_header(Some(&header)).await.unwrap();

        assert_eq!(resolved, who);
        assert_eq!(resolved.tenant_context().tenant_id(), who.tenant_id);
    }

    #[tokio::test]
    async fn deactivated_and_unknown_users_look_the_same() {
        let (resolver, tokens, directory) = setup();
        let inactive = identity(TenantId::new());
        directory.insert(inactive.clone(), false);
        let unknown = identity(TenantId::new());

        let a = resolver.resolve(&token_for(&tokens, &inactive)).await;
        let b = resolver.resolve(&token_for(&tokens, &unknown)).await;

        assert_eq!(a, Err(AuthError::Unauthenticated));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn tenant_comes_from_directory_not_token() {
        let (resolver, tokens, directory) = setup();
        let who = identity(TenantId::new());
        directory.insert(who.clone(), true);

        // A validly signed token that claims a different tenant.
        let forged = tokens
            .issue(TokenRequest {
                subject: who.user_id,
                tenant_id: TenantId::new(),
                role: Role::ADMIN,
            })
            .unwrap();

        assert_eq!(
            resolver.resolve(&forged.token).await,
            Err(AuthError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn live_role_wins_over_token_role() {
        let (resolver, tokens, directory) = setup();
        let who = identity(TenantId::new());
        directory.insert(who.clone(), true);

        let stale = tokens
            .issue(TokenRequest {
                subject: who.user_id,
                tenant_id: who.tenant_id,
                role: Role::ADMIN,
            })
            .unwrap();

        let resolved = resolver.resolve(&stale.token).await.unwrap();
        assert_eq!(resolved.role, Role::USER);
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_unauthenticated() {
        let (resolver, _, _) = setup();
        assert_eq!(resolver.resolve_header(None).await, Err(AuthError::Unauthenticated));
        assert_eq!(
            resolver.resolve_header(Some("Token abc")).await,
            Err(AuthError::Unauthenticated)
        );
    }
}
