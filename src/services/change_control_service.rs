// src/services/change_control_service.rs

use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        numbering::{next_number, CHANGE_CONTROL_PREFIX},
        pagination,
    },
    db::{
        history_repo::{StatusChange, ENTITY_CHANGE_CONTROL},
        ChangeControlRepository, HistoryRepository,
    },
    middleware::rbac::QUALITY_APPROVE,
    models::{
        auth::User,
        change_controls::{
            ChangeControl, ChangeControlFilter, ChangeControlStatus, ChangeControlStatusPayload,
            CreateChangeControlPayload, UpdateChangeControlPayload,
        },
        workflow::{ModuleStats, StatusHistoryEntry, WorkflowStatus},
    },
};

/// Decisions taken at the approval gate need `quality:approve`.
fn is_approval_decision(from: ChangeControlStatus, to: ChangeControlStatus) -> bool {
    from == ChangeControlStatus::ApprovalPending
        && matches!(to, ChangeControlStatus::Approved | ChangeControlStatus::Rejected)
}

#[derive(Clone)]
pub struct ChangeControlService {
    change_repo: ChangeControlRepository,
    history_repo: HistoryRepository,
}

impl ChangeControlService {
    pub fn new(change_repo: ChangeControlRepository, history_repo: HistoryRepository) -> Self {
        Self { change_repo, history_repo }
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        filter: &ChangeControlFilter,
    ) -> Result<Vec<ChangeControl>, AppError> {
        let (limit, offset) = pagination::page(filter.limit, filter.offset);
        self.change_repo
            .list(&mut *conn, tenant_id, filter, pagination::search_term(&filter.search), limit, offset)
            .await
    }

    pub async fn stats(&self, conn: &mut PgConnection, tenant_id: Uuid) -> Result<ModuleStats, AppError> {
        let by_status = self.change_repo.count_by_status(&mut *conn, tenant_id).await?;
        let by_risk = self.change_repo.count_by_risk(&mut *conn, tenant_id).await?;
        Ok(ModuleStats::new(by_status, by_risk))
    }

    pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<ChangeControl, AppError> {
        self.find(conn, tenant_id, id, false).await
    }

    pub async fn history(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, AppError> {
        self.find(conn, tenant_id, id, false).await?;
        self.history_repo.list(&mut *conn, tenant_id, ENTITY_CHANGE_CONTROL, id).await
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        payload: CreateChangeControlPayload,
    ) -> Result<ChangeControl, AppError> {
        payload.validate()?;

        let number = next_number(&mut *conn, tenant_id, CHANGE_CONTROL_PREFIX).await?;
        let change = self.change_repo.create(&mut *conn, tenant_id, &number, &payload, user.id).await?;

        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_CHANGE_CONTROL,
                    entity_id: change.id,
                    from_status: None,
                    to_status: change.status.as_str(),
                    comment: None,
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(change = %change.change_number, tenant_id = %tenant_id, "change control initiated");
        Ok(change)
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: UpdateChangeControlPayload,
    ) -> Result<ChangeControl, AppError> {
        payload.validate()?;

        let current = self.find(conn, tenant_id, id, true).await?;
        if current.status.is_terminal() {
            return Err(AppError::BusinessRule(format!(
                "Change control {} is {} and can no longer be edited.",
                current.change_number,
                current.status.as_str()
            )));
        }

        self.change_repo.update(&mut *conn, tenant_id, id, &payload, user.id).await
    }

    pub async fn change_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: ChangeControlStatusPayload,
    ) -> Result<ChangeControl, AppError> {
        let current = self.find(conn, tenant_id, id, true).await?;
        current.status.ensure_transition(payload.status)?;

        if is_approval_decision(current.status, payload.status) && !user.has_permission(QUALITY_APPROVE) {
            return Err(AppError::Forbidden(format!(
                "You need the '{}' permission to decide on change controls.",
                QUALITY_APPROVE
            )));
        }

        let change = self
            .change_repo
            .set_status(&mut *conn, tenant_id, id, payload.status, user.id)
            .await?;

        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_CHANGE_CONTROL,
                    entity_id: id,
                    from_status: Some(current.status.as_str()),
                    to_status: change.status.as_str(),
                    comment: payload.comment.as_deref(),
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(
            change = %change.change_number,
            from = current.status.as_str(),
            to = change.status.as_str(),
            "change control status changed"
        );
        Ok(change)
    }

    pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.change_repo.delete(&mut *conn, tenant_id, id).await? {
            return Err(AppError::not_found("Change control"));
        }
        Ok(())
    }

    async fn find(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        for_update: bool,
    ) -> Result<ChangeControl, AppError> {
        self.change_repo
            .find_by_id(&mut *conn, tenant_id, id, for_update)
            .await?
            .ok_or_else(|| AppError::not_found("Change control"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_approval_gate_needs_approvers() {
        use ChangeControlStatus::*;
        assert!(is_approval_decision(ApprovalPending, Approved));
        assert!(is_approval_decision(ApprovalPending, Rejected));
        assert!(!is_approval_decision(ApprovalPending, Cancelled));
        assert!(!is_approval_decision(Assessment, ApprovalPending));
    }
}
