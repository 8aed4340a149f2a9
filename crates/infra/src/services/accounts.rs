//! Registration, login and user administration.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use jarvis_activity::{Action, Audited, Auditor, NewActivity, RequestMeta};
use jarvis_auth::{Identity, IssuedToken, PasswordHasher, Role, TokenRequest, TokenService};
use jarvis_core::{DomainError, EntityId, EntityType, TenantContext, TenantId, UserId};
use jarvis_products::{Product, default_catalog};
use jarvis_query::{Page, Pagination, Resource};

use super::ServiceError;
use super::slug::subdomain_for;
use crate::{AccountStore, ResourceStore, Tenant, User, UserChange};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub company_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Company registration number.
    #[serde(default, alias = "cnpj")]
    pub document: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Narrows the lookup to one tenant when the same email exists in several.
    #[serde(default)]
    pub subdomain: Option<String>,
}

/// A user created by a tenant admin.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Issued credentials plus who they belong to.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_at: chrono::DateTime<Utc>,
    pub user: User,
    pub tenant: Tenant,
}

impl Session {
    fn new(issued: IssuedToken, user: User, tenant: Tenant) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
            tenant,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: User,
    pub tenant: Tenant,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.ends_with('.') => Ok(()),
        _ => Err(DomainError::validation("valid email is required")),
    }
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn required(value: &str, field: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn validate_role(role: &Role) -> Result<(), DomainError> {
    if *role == Role::ADMIN || *role == Role::USER {
        Ok(())
    } else {
        Err(DomainError::validation(format!("unknown role: {role}")))
    }
}

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    products: Arc<dyn ResourceStore<Product>>,
    auditor: Auditor,
    tokens: Arc<TokenService>,
    passwords: Arc<dyn PasswordHasher>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        products: Arc<dyn ResourceStore<Product>>,
        auditor: Auditor,
        tokens: Arc<TokenService>,
        passwords: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            accounts,
            products,
            auditor,
            tokens,
            passwords,
        }
    }

    fn issue(&self, user: &User) -> Result<IssuedToken, ServiceError> {
        Ok(self.tokens.issue(TokenRequest {
            subject: user.id,
            tenant_id: user.tenant_id,
            role: user.role.clone(),
        })?)
    }

    fn build_user(
        &self,
        tenant_id: TenantId,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
        phone: Option<String>,
    ) -> Result<User, ServiceError> {
        let name = required(name, "name")?;
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;
        let now = Utc::now();

        Ok(User {
            id: UserId::new(),
            tenant_id,
            name,
            email,
            password_hash: self.passwords.hash(password)?,
            role,
            phone,
            active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates a tenant, seeds its product catalogue and its first admin,
    /// and signs the admin in.
    ///
    /// The steps are not transactional: a failure after the tenant insert
    /// leaves an empty tenant behind.
    #[instrument(skip_all, fields(company = %request.company_name), err)]
    pub async fn register(&self, request: RegisterRequest, meta: RequestMeta) -> Result<Audited<Session>, ServiceError> {
        let company_name = required(&request.company_name, "company_name")?;
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;

        if self.accounts.email_registered(&email).await? {
            return Err(DomainError::conflict("email already registered").into());
        }

        let now = Utc::now();
        let tenant = self
            .accounts
            .insert_tenant(Tenant {
                id: TenantId::new(),
                name: company_name.clone(),
                subdomain: subdomain_for(&company_name, now.timestamp_millis()),
                document: request.document,
                plan: "free".to_string(),
                active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        let ctx = TenantContext::new(tenant.id);

        let admin = self.build_user(
            tenant.id,
            &request.name,
            &email,
            &request.password,
            Role::ADMIN,
            request.phone,
        )?;
        let admin = self.accounts.insert_user(&ctx, admin).await?;

        for product in default_catalog() {
            let row = Product::create(EntityId::new(), &ctx, admin.id, now, product);
            self.products.insert(&ctx, row).await?;
        }
        tracing::info!(tenant_id = %tenant.id, subdomain = %tenant.subdomain, "tenant registered");

        let session = Session::new(self.issue(&admin)?, admin.clone(), tenant);
        let activity = NewActivity::new(
            EntityType::User,
            Action::Registered {
                email: admin.email.clone(),
                company_name,
            },
        )
        .by(admin.id)
        .on(admin.id)
        .with_meta(meta);
        Ok(self.auditor.attach(&ctx, session, activity).await)
    }

    /// Unknown email and wrong password fail identically.
    #[instrument(skip_all, err)]
    pub async fn login(&self, request: LoginRequest, meta: RequestMeta) -> Result<Audited<Session>, ServiceError> {
        let email = normalize_email(&request.email);
        let mut candidates = self.accounts.active_users_by_email(&email).await?;

        if let Some(subdomain) = request.subdomain.as_deref().filter(|s| !s.trim().is_empty()) {
            let Some(tenant) = self.accounts.tenant_by_subdomain(subdomain.trim()).await? else {
                return Err(ServiceError::Unauthenticated);
            };
            candidates.retain(|u| u.tenant_id == tenant.id);
        }

        let Some(user) = candidates
            .into_iter()
            .find(|u| self.passwords.verify(&request.password, &u.password_hash))
        else {
            tracing::debug!("login rejected");
            return Err(ServiceError::Unauthenticated);
        };

        let tenant = match self.accounts.tenant(user.tenant_id).await? {
            Some(tenant) if tenant.active => tenant,
            _ => return Err(ServiceError::TenantInactive),
        };
        let ctx = TenantContext::new(tenant.id);

        let user = self
            .accounts
            .update_user(&ctx, user.id, UserChange::LoggedIn(Utc::now()))
            .await?
            .unwrap_or(user);

        let session = Session::new(self.issue(&user)?, user.clone(), tenant);
        let activity = NewActivity::new(EntityType::User, Action::Login { email: user.email })
            .by(user.id)
            .on(user.id)
            .with_meta(meta);
        Ok(self.auditor.attach(&ctx, session, activity).await)
    }

    pub async fn me(&self, identity: &Identity) -> Result<Profile, ServiceError> {
        let user = self
            .accounts
            .active_user(identity.user_id)
            .await?
            .ok_or(ServiceError::Unauthenticated)?;
        let tenant = self
            .accounts
            .tenant(identity.tenant_id)
            .await?
            .ok_or(ServiceError::Unauthenticated)?;
        Ok(Profile { user, tenant })
    }

    pub async fn list_users(&self, ctx: &TenantContext, page: Pagination) -> Result<Page<User>, ServiceError> {
        Ok(self.accounts.list_users(ctx, page).await?)
    }

    #[instrument(skip_all, fields(tenant_id = %ctx.tenant_id()), err)]
    pub async fn create_user(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        meta: RequestMeta,
        new: NewUser,
    ) -> Result<Audited<User>, ServiceError> {
        let role = new.role.unwrap_or(Role::USER);
        validate_role(&role)?;
        let user = self.build_user(ctx.tenant_id(), &new.name, &new.email, &new.password, role, new.phone)?;
        let user = self.accounts.insert_user(ctx, user).await?;

        let activity = NewActivity::new(
            EntityType::User,
            Action::Created {
                name: user.name.clone(),
                reference: Some(user.email.clone()),
            },
        )
        .by(actor)
        .on(user.id)
        .with_meta(meta);
        Ok(self.auditor.attach(ctx, user, activity).await)
    }

    #[instrument(skip_all, fields(tenant_id = %ctx.tenant_id(), user_id = %id), err)]
    pub async fn change_role(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        meta: RequestMeta,
        id: UserId,
        role: Role,
    ) -> Result<Audited<User>, ServiceError> {
        validate_role(&role)?;
        let user = self
            .accounts
            .update_user(ctx, id, UserChange::Role(role.clone()))
            .await?
            .ok_or_else(ServiceError::not_found)?;

        let activity = NewActivity::new(
            EntityType::User,
            Action::RoleChanged {
                role: role.as_str().to_string(),
            },
        )
        .by(actor)
        .on(user.id)
        .with_meta(meta);
        Ok(self.auditor.attach(ctx, user, activity).await)
    }

    /// Users are never removed; deactivation also ends their sessions at the
    /// next request.
    #[instrument(skip_all, fields(tenant_id = %ctx.tenant_id(), user_id = %id), err)]
    pub async fn deactivate(
        &self,
        ctx: &TenantContext,
        actor: UserId,
        meta: RequestMeta,
        id: UserId,
    ) -> Result<Audited<User>, ServiceError> {
        if id == actor {
            return Err(DomainError::validation("cannot deactivate yourself").into());
        }
        let user = self
            .accounts
            .update_user(ctx, id, UserChange::Deactivate)
            .await?
            .ok_or_else(ServiceError::not_found)?;

        let activity = NewActivity::new(
            EntityType::User,
            Action::Deactivated {
                email: user.email.clone(),
            },
        )
        .by(actor)
        .on(user.id)
        .with_meta(meta);
        Ok(self.auditor.attach(ctx, user, activity).await)
    }
}
