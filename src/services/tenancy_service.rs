// src/services/tenancy_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{db_utils::set_tenant_scope, error::AppError},
    db::{user_repo::NewUser, TenantRepository, UserRepository},
    models::{
        auth::UserRole,
        tenancy::{CreateTenantPayload, OnboardingResponse, Tenant, TenantPublicInfo, UpdateTenantPayload},
    },
    services::auth::{hash_password, AuthService},
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    auth_service: AuthService,
    db_pool: PgPool,
}

impl TenantService {
    pub fn new(
        tenant_repo: TenantRepository,
        user_repo: UserRepository,
        auth_service: AuthService,
        db_pool: PgPool,
    ) -> Self {
        Self { tenant_repo, user_repo, auth_service, db_pool }
    }

    /// Creates the tenant and its first admin atomically and signs the admin in.
    pub async fn onboard(&self, payload: CreateTenantPayload) -> Result<OnboardingResponse, AppError> {
        payload.validate()?;

        let password_hash = hash_password(&payload.admin_password).await?;
        let features = payload.features.clone().unwrap_or_default();

        // 1. Tenant and its first admin commit together
        let mut tx = self.db_pool.begin().await?;

        let tenant = self
            .tenant_repo
            .create_tenant(&mut *tx, &payload.name, &payload.subdomain, &payload.branding, &features)
            .await?;

        // 2. Row-level security scope must be set before the admin row is written
        set_tenant_scope(&mut *tx, tenant.id).await?;

        let user = self
            .user_repo
            .create(
                &mut *tx,
                tenant.id,
                NewUser {
                    email: &payload.admin_email,
                    password_hash: &password_hash,
                    first_name: &payload.admin_first_name,
                    last_name: &payload.admin_last_name,
                    role: UserRole::Admin,
                    department: None,
                    permissions: &[],
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant.id, subdomain = %tenant.subdomain, "tenant onboarded");

        // 3. Log the admin straight in
        let token = self.auth_service.create_token(&user)?;
        Ok(OnboardingResponse { token, user, tenant })
    }

    /// Any tenant holding the subdomain, active or not.
    pub async fn find_any(&self, subdomain: &str) -> Result<Option<Tenant>, AppError> {
        self.tenant_repo.find_by_subdomain(subdomain).await
    }

    pub async fn lookup(&self, subdomain: &str) -> Result<TenantPublicInfo, AppError> {
        self.tenant_repo
            .find_by_subdomain(subdomain)
            .await?
            .filter(|t| t.is_active)
            .map(TenantPublicInfo::from)
            .ok_or_else(|| AppError::not_found("Tenant"))
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payload: UpdateTenantPayload,
    ) -> Result<Tenant, AppError> {
        payload.validate()?;

        let tenant = self
            .tenant_repo
            .update_tenant(
                &mut *conn,
                tenant_id,
                payload.name.as_deref(),
                payload.branding.as_ref(),
                payload.features.as_ref(),
                payload.is_active,
            )
            .await?
            .ok_or_else(|| AppError::not_found("Tenant"))?;

        tracing::info!(tenant_id = %tenant.id, active = tenant.is_active, "tenant settings updated");
        Ok(tenant)
    }
}
