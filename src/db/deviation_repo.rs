// src/db/deviation_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::scoped,
    models::{
        deviations::{CreateDeviationPayload, Deviation, DeviationFilter, DeviationStatus, UpdateDeviationPayload},
        workflow::CountEntry,
    },
};

const TABLE: &str = "deviations";

#[derive(Clone, Default)]
pub struct DeviationRepository;

impl DeviationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &DeviationFilter,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Deviation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deviations = sqlx::query_as::<_, Deviation>(
            r#"
            SELECT * FROM deviations
            WHERE tenant_id = $1
              AND ($2::deviation_status IS NULL OR status = $2)
              AND ($3::deviation_severity IS NULL OR severity = $3)
              AND ($4::text IS NULL OR category = $4)
              AND ($5::text IS NULL
                   OR title ILIKE '%' || $5 || '%'
                   OR deviation_number ILIKE '%' || $5 || '%')
            ORDER BY detected_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(tenant_id)
        .bind(filter.status)
        .bind(filter.severity)
        .bind(&filter.category)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(deviations)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        for_update: bool,
    ) -> Result<Option<Deviation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if for_update {
            "SELECT * FROM deviations WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        } else {
            "SELECT * FROM deviations WHERE tenant_id = $1 AND id = $2"
        };
        let deviation = sqlx::query_as::<_, Deviation>(sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(deviation)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        deviation_number: &str,
        payload: &CreateDeviationPayload,
        user_id: Uuid,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deviation = sqlx::query_as::<_, Deviation>(
            r#"
            INSERT INTO deviations (
                tenant_id, deviation_number, title, description, severity, category,
                occurred_at, detected_at, location, product_affected, immediate_action,
                assigned_to, created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, NOW()), $9, $10, $11, $12, $13, $13)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(deviation_number)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.severity)
        .bind(&payload.category)
        .bind(payload.occurred_at)
        .bind(payload.detected_at)
        .bind(&payload.location)
        .bind(&payload.product_affected)
        .bind(&payload.immediate_action)
        .bind(payload.assigned_to)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(deviation)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateDeviationPayload,
        user_id: Uuid,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deviation = sqlx::query_as::<_, Deviation>(
            r#"
            UPDATE deviations SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                severity = COALESCE($5, severity),
                category = COALESCE($6, category),
                occurred_at = COALESCE($7, occurred_at),
                location = COALESCE($8, location),
                product_affected = COALESCE($9, product_affected),
                immediate_action = COALESCE($10, immediate_action),
                root_cause = COALESCE($11, root_cause),
                investigation_summary = COALESCE($12, investigation_summary),
                assigned_to = COALESCE($13, assigned_to),
                verification_comments = COALESCE($14, verification_comments),
                updated_by = $15,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.severity)
        .bind(&payload.category)
        .bind(payload.occurred_at)
        .bind(&payload.location)
        .bind(&payload.product_affected)
        .bind(&payload.immediate_action)
        .bind(&payload.root_cause)
        .bind(&payload.investigation_summary)
        .bind(payload.assigned_to)
        .bind(&payload.verification_comments)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(deviation)
    }

    /// Moving to `closed` stamps `closed_at`/`closed_by`.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: DeviationStatus,
        verification_comments: Option<&str>,
        user_id: Uuid,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let closing = status == DeviationStatus::Closed;
        let deviation = sqlx::query_as::<_, Deviation>(
            r#"
            UPDATE deviations SET
                status = $3,
                verification_comments = COALESCE($4, verification_comments),
                closed_at = CASE WHEN $5 THEN NOW() ELSE closed_at END,
                closed_by = CASE WHEN $5 THEN $6 ELSE closed_by END,
                updated_by = $6,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .bind(verification_comments)
        .bind(closing)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(deviation)
    }

    pub async fn link_capa<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        capa_id: Uuid,
        user_id: Uuid,
    ) -> Result<Deviation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deviation = sqlx::query_as::<_, Deviation>(
            r#"
            UPDATE deviations SET
                linked_capa_id = $3,
                status = 'capa_in_progress',
                updated_by = $4,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(capa_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(deviation)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        scoped::delete_by_id(executor, TABLE, tenant_id, id).await
    }

    pub async fn count_by_status<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<CountEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        scoped::count_by(executor, TABLE, "status", tenant_id).await
    }

    pub async fn count_by_severity<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<CountEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        scoped::count_by(executor, TABLE, "severity", tenant_id).await
    }
}
