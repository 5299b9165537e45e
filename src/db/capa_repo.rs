// src/db/capa_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::scoped,
    models::{
        capas::{Capa, CapaFilter, CapaStatus, EffectivenessResult, NewCapa, UpdateCapaPayload},
        workflow::CountEntry,
    },
};

const TABLE: &str = "capas";

#[derive(Clone, Default)]
pub struct CapaRepository;

impl CapaRepository {
    pub fn new() -> Self {
        Self
    }

    /// `overdue_before` keeps open CAPAs whose due date is earlier than it.
    #[allow(clippy::too_many_arguments)]
    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &CapaFilter,
        search: Option<String>,
        overdue_before: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Capa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let capas = sqlx::query_as::<_, Capa>(
            r#"
            SELECT * FROM capas
            WHERE tenant_id = $1
              AND ($2::capa_status IS NULL OR status = $2)
              AND ($3::capa_type IS NULL OR capa_type = $3)
              AND ($4::priority_level IS NULL OR priority = $4)
              AND ($5::text IS NULL OR source = $5)
              AND ($6::text IS NULL
                   OR title ILIKE '%' || $6 || '%'
                   OR capa_number ILIKE '%' || $6 || '%')
              AND ($7::date IS NULL
                   OR (due_date < $7 AND status NOT IN ('completed', 'cancelled')))
            ORDER BY created_at DESC
            LIMIT $8 OFFSET $9
            "#,
        )
        .bind(tenant_id)
        .bind(filter.status)
        .bind(filter.capa_type)
        .bind(filter.priority)
        .bind(&filter.source)
        .bind(search)
        .bind(overdue_before)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(capas)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        for_update: bool,
    ) -> Result<Option<Capa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if for_update {
            "SELECT * FROM capas WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        } else {
            "SELECT * FROM capas WHERE tenant_id = $1 AND id = $2"
        };
        let capa = sqlx::query_as::<_, Capa>(sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(capa)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        capa_number: &str,
        new_capa: &NewCapa,
        user_id: Uuid,
    ) -> Result<Capa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let capa = sqlx::query_as::<_, Capa>(
            r#"
            INSERT INTO capas (
                tenant_id, capa_number, title, description, capa_type, source, source_reference,
                deviation_id, priority, root_cause, assigned_to, due_date, created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(capa_number)
        .bind(&new_capa.title)
        .bind(&new_capa.description)
        .bind(new_capa.capa_type)
        .bind(&new_capa.source)
        .bind(&new_capa.source_reference)
        .bind(new_capa.deviation_id)
        .bind(new_capa.priority)
        .bind(&new_capa.root_cause)
        .bind(new_capa.assigned_to)
        .bind(new_capa.due_date)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(capa)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateCapaPayload,
        user_id: Uuid,
    ) -> Result<Capa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let capa = sqlx::query_as::<_, Capa>(
            r#"
            UPDATE capas SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                capa_type = COALESCE($5, capa_type),
                priority = COALESCE($6, priority),
                root_cause = COALESCE($7, root_cause),
                action_plan = COALESCE($8, action_plan),
                assigned_to = COALESCE($9, assigned_to),
                due_date = COALESCE($10, due_date),
                updated_by = $11,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.capa_type)
        .bind(payload.priority)
        .bind(&payload.root_cause)
        .bind(&payload.action_plan)
        .bind(payload.assigned_to)
        .bind(payload.due_date)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(capa)
    }

    /// Moving to `completed` stamps `completed_at`.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: CapaStatus,
        user_id: Uuid,
    ) -> Result<Capa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let completing = status == CapaStatus::Completed;
        let capa = sqlx::query_as::<_, Capa>(
            r#"
            UPDATE capas SET
                status = $3,
                completed_at = CASE WHEN $4 THEN NOW() ELSE completed_at END,
                updated_by = $5,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .bind(completing)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(capa)
    }

    pub async fn record_effectiveness<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        result: EffectivenessResult,
        comments: Option<&str>,
        user_id: Uuid,
    ) -> Result<Capa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let capa = sqlx::query_as::<_, Capa>(
            r#"
            UPDATE capas SET
                effectiveness_check_result = $3,
                effectiveness_comments = $4,
                verified_by = $5,
                updated_by = $5,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(result)
        .bind(comments)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(capa)
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

    pub async fn count_by_priority<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<CountEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        scoped::count_by(executor, TABLE, "priority", tenant_id).await
    }
}
