// src/db/audit_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::scoped,
    models::{
        audits::{Audit, AuditFilter, AuditFindingsPayload, AuditStatus, CreateAuditPayload, UpdateAuditPayload},
        workflow::CountEntry,
    },
};

const TABLE: &str = "audits";

#[derive(Clone, Default)]
pub struct AuditRepository;

impl AuditRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &AuditFilter,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Audit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let audits = sqlx::query_as::<_, Audit>(
            r#"
            SELECT * FROM audits
            WHERE tenant_id = $1
              AND ($2::audit_status IS NULL OR status = $2)
              AND ($3::audit_type IS NULL OR audit_type = $3)
              AND ($4::text IS NULL
                   OR title ILIKE '%' || $4 || '%'
                   OR audit_number ILIKE '%' || $4 || '%')
            ORDER BY scheduled_date DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(tenant_id)
        .bind(filter.status)
        .bind(filter.audit_type)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(audits)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        for_update: bool,
    ) -> Result<Option<Audit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if for_update {
            "SELECT * FROM audits WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        } else {
            "SELECT * FROM audits WHERE tenant_id = $1 AND id = $2"
        };
        let audit = sqlx::query_as::<_, Audit>(sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(audit)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        audit_number: &str,
        payload: &CreateAuditPayload,
        user_id: Uuid,
    ) -> Result<Audit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let audit = sqlx::query_as::<_, Audit>(
            r#"
            INSERT INTO audits (
                tenant_id, audit_number, title, audit_type, scope, auditee, lead_auditor,
                scheduled_date, created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(audit_number)
        .bind(&payload.title)
        .bind(payload.audit_type)
        .bind(&payload.scope)
        .bind(&payload.auditee)
        .bind(&payload.lead_auditor)
        .bind(payload.scheduled_date)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(audit)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateAuditPayload,
        user_id: Uuid,
    ) -> Result<Audit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let audit = sqlx::query_as::<_, Audit>(
            r#"
            UPDATE audits SET
                title = COALESCE($3, title),
                audit_type = COALESCE($4, audit_type),
                scope = COALESCE($5, scope),
                auditee = COALESCE($6, auditee),
                lead_auditor = COALESCE($7, lead_auditor),
                scheduled_date = COALESCE($8, scheduled_date),
                summary = COALESCE($9, summary),
                updated_by = $10,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&payload.title)
        .bind(payload.audit_type)
        .bind(&payload.scope)
        .bind(&payload.auditee)
        .bind(&payload.lead_auditor)
        .bind(payload.scheduled_date)
        .bind(&payload.summary)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(audit)
    }

    pub async fn set_findings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        findings: &AuditFindingsPayload,
        user_id: Uuid,
    ) -> Result<Audit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let audit = sqlx::query_as::<_, Audit>(
            r#"
            UPDATE audits SET
                critical_findings = $3,
                major_findings = $4,
                minor_findings = $5,
                observations = $6,
                updated_by = $7,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(findings.critical)
        .bind(findings.major)
        .bind(findings.minor)
        .bind(findings.observations)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(audit)
    }

    /// Reaching `completed` stamps `completed_date` with today's date.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: AuditStatus,
        user_id: Uuid,
    ) -> Result<Audit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let completing = status == AuditStatus::Completed;
        let audit = sqlx::query_as::<_, Audit>(
            r#"
            UPDATE audits SET
                status = $3,
                completed_date = CASE WHEN $4 THEN CURRENT_DATE ELSE completed_date END,
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
        Ok(audit)
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

    pub async fn count_by_type<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<CountEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        scoped::count_by(executor, TABLE, "audit_type", tenant_id).await
    }
}
