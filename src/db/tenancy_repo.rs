// src/db/tenancy_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tenancy::{Branding, Features, Tenant},
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    pub async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE subdomain = lower($1)")
            .bind(subdomain)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        subdomain: &str,
        branding: &Branding,
        features: &Features,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, subdomain, branding, features)
            VALUES ($1, lower($2), $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(subdomain)
        .bind(Json(branding))
        .bind(Json(features))
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!("The subdomain '{}' is already taken.", subdomain));
                }
            }
            AppError::DatabaseError(e)
        })
    }

    pub async fn update_tenant<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        branding: Option<&Branding>,
        features: Option<&Features>,
        is_active: Option<bool>,
    ) -> Result<Option<Tenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants SET
                name = COALESCE($2, name),
                branding = COALESCE($3, branding),
                features = COALESCE($4, features),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(branding.map(Json))
        .bind(features.map(Json))
        .bind(is_active)
        .fetch_optional(executor)
        .await?;
        Ok(tenant)
    }
}
