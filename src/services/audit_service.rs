// src/services/audit_service.rs

use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        numbering::{next_number, AUDIT_PREFIX},
        pagination,
    },
    db::{
        history_repo::{StatusChange, ENTITY_AUDIT},
        AuditRepository, HistoryRepository,
    },
    models::{
        audits::{
            Audit, AuditFilter, AuditFindingsPayload, AuditStatusPayload, CreateAuditPayload, UpdateAuditPayload,
        },
        auth::User,
        workflow::{ModuleStats, StatusHistoryEntry, WorkflowStatus},
    },
};

#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditRepository,
    history_repo: HistoryRepository,
}

impl AuditService {
    pub fn new(audit_repo: AuditRepository, history_repo: HistoryRepository) -> Self {
        Self { audit_repo, history_repo }
    }

    pub async fn list(&self, conn: &mut PgConnection, tenant_id: Uuid, filter: &AuditFilter) -> Result<Vec<Audit>, AppError> {
        let (limit, offset) = pagination::page(filter.limit, filter.offset);
        self.audit_repo
            .list(&mut *conn, tenant_id, filter, pagination::search_term(&filter.search), limit, offset)
            .await
    }

    pub async fn stats(&self, conn: &mut PgConnection, tenant_id: Uuid) -> Result<ModuleStats, AppError> {
        let by_status = self.audit_repo.count_by_status(&mut *conn, tenant_id).await?;
        let by_type = self.audit_repo.count_by_type(&mut *conn, tenant_id).await?;
        Ok(ModuleStats::new(by_status, by_type))
    }

    pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<Audit, AppError> {
        self.find(conn, tenant_id, id, false).await
    }

    pub async fn history(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, AppError> {
        self.find(conn, tenant_id, id, false).await?;
        self.history_repo.list(&mut *conn, tenant_id, ENTITY_AUDIT, id).await
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        payload: CreateAuditPayload,
    ) -> Result<Audit, AppError> {
        payload.validate()?;

        let number = next_number(&mut *conn, tenant_id, AUDIT_PREFIX).await?;
        let audit = self.audit_repo.create(&mut *conn, tenant_id, &number, &payload, user.id).await?;

        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_AUDIT,
                    entity_id: audit.id,
                    from_status: None,
                    to_status: audit.status.as_str(),
                    comment: None,
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(audit = %audit.audit_number, tenant_id = %tenant_id, "audit planned");
        Ok(audit)
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: UpdateAuditPayload,
    ) -> Result<Audit, AppError> {
        payload.validate()?;

        let current = self.find(conn, tenant_id, id, true).await?;
        if current.status.is_terminal() {
            return Err(AppError::BusinessRule(format!(
                "Audit {} is closed and can no longer be edited.",
                current.audit_number
            )));
        }

        self.audit_repo.update(&mut *conn, tenant_id, id, &payload, user.id).await
    }

    pub async fn set_findings(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: AuditFindingsPayload,
    ) -> Result<Audit, AppError> {
        payload.validate()?;

        let current = self.find(conn, tenant_id, id, true).await?;
        if current.status.findings_locked() {
            return Err(AppError::BusinessRule(format!(
                "Findings of audit {} are locked once it is {}.",
                current.audit_number,
                current.status.as_str()
            )));
        }

        self.audit_repo.set_findings(&mut *conn, tenant_id, id, &payload, user.id).await
    }

    pub async fn change_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: AuditStatusPayload,
    ) -> Result<Audit, AppError> {
        let current = self.find(conn, tenant_id, id, true).await?;
        current.status.ensure_transition(payload.status)?;

        let audit = self.audit_repo.set_status(&mut *conn, tenant_id, id, payload.status, user.id).await?;

        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_AUDIT,
                    entity_id: id,
                    from_status: Some(current.status.as_str()),
                    to_status: audit.status.as_str(),
                    comment: payload.comment.as_deref(),
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(
            audit = %audit.audit_number,
            from = current.status.as_str(),
            to = audit.status.as_str(),
            findings = audit.total_findings(),
            "audit status changed"
        );
        Ok(audit)
    }

    pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.audit_repo.delete(&mut *conn, tenant_id, id).await? {
            return Err(AppError::not_found("Audit"));
        }
        Ok(())
    }

    async fn find(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid, for_update: bool) -> Result<Audit, AppError> {
        self.audit_repo
            .find_by_id(&mut *conn, tenant_id, id, for_update)
            .await?
            .ok_or_else(|| AppError::not_found("Audit"))
    }
}
