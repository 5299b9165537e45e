// src/db/change_control_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::scoped,
    models::{
        change_controls::{
            ChangeControl, ChangeControlFilter, ChangeControlStatus, CreateChangeControlPayload,
            UpdateChangeControlPayload,
        },
        workflow::CountEntry,
    },
};

const TABLE: &str = "change_controls";

#[derive(Clone, Default)]
pub struct ChangeControlRepository;

impl ChangeControlRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &ChangeControlFilter,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChangeControl>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let changes = sqlx::query_as::<_, ChangeControl>(
            r#"
            SELECT * FROM change_controls
            WHERE tenant_id = $1
              AND ($2::change_control_status IS NULL OR status = $2)
              AND ($3::priority_level IS NULL OR risk_level = $3)
              AND ($4::change_type IS NULL OR change_type = $4)
              AND ($5::text IS NULL
                   OR title ILIKE '%' || $5 || '%'
                   OR change_number ILIKE '%' || $5 || '%')
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(tenant_id)
        .bind(filter.status)
        .bind(filter.risk_level)
        .bind(filter.change_type)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(changes)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        for_update: bool,
    ) -> Result<Option<ChangeControl>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if for_update {
            "SELECT * FROM change_controls WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        } else {
            "SELECT * FROM change_controls WHERE tenant_id = $1 AND id = $2"
        };
        let change = sqlx::query_as::<_, ChangeControl>(sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(change)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        change_number: &str,
        payload: &CreateChangeControlPayload,
        user_id: Uuid,
    ) -> Result<ChangeControl, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let change = sqlx::query_as::<_, ChangeControl>(
            r#"
            INSERT INTO change_controls (
                tenant_id, change_number, title, description, change_type, justification,
                risk_level, impact_assessment, affected_systems, target_date, created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'Low'::priority_level), $8, $9, $10, $11, $11)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(change_number)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.change_type)
        .bind(&payload.justification)
        .bind(payload.risk_level)
        .bind(&payload.impact_assessment)
        .bind(&payload.affected_systems)
        .bind(payload.target_date)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(change)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateChangeControlPayload,
        user_id: Uuid,
    ) -> Result<ChangeControl, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let change = sqlx::query_as::<_, ChangeControl>(
            r#"
            UPDATE change_controls SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                change_type = COALESCE($5, change_type),
                justification = COALESCE($6, justification),
                risk_level = COALESCE($7, risk_level),
                impact_assessment = COALESCE($8, impact_assessment),
                affected_systems = COALESCE($9, affected_systems),
                target_date = COALESCE($10, target_date),
                implementation_notes = COALESCE($11, implementation_notes),
                verification_notes = COALESCE($12, verification_notes),
                updated_by = $13,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.change_type)
        .bind(&payload.justification)
        .bind(payload.risk_level)
        .bind(&payload.impact_assessment)
        .bind(&payload.affected_systems)
        .bind(payload.target_date)
        .bind(&payload.implementation_notes)
        .bind(&payload.verification_notes)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(change)
    }

    /// `approved` stamps the approver, `completed` stamps `completed_at`.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: ChangeControlStatus,
        user_id: Uuid,
    ) -> Result<ChangeControl, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let approving = status == ChangeControlStatus::Approved;
        let completing = status == ChangeControlStatus::Completed;
        let change = sqlx::query_as::<_, ChangeControl>(
            r#"
            UPDATE change_controls SET
                status = $3,
                approved_by = CASE WHEN $4 THEN $6 ELSE approved_by END,
                approved_at = CASE WHEN $4 THEN NOW() ELSE approved_at END,
                completed_at = CASE WHEN $5 THEN NOW() ELSE completed_at END,
                updated_by = $6,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .bind(approving)
        .bind(completing)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(change)
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

    pub async fn count_by_risk<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<CountEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        scoped::count_by(executor, TABLE, "risk_level", tenant_id).await
    }
}
