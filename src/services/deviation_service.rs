// src/services/deviation_service.rs

use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        numbering::{next_number, CAPA_PREFIX, DEVIATION_PREFIX},
        pagination,
    },
    db::{
        history_repo::{StatusChange, ENTITY_CAPA, ENTITY_DEVIATION},
        CapaRepository, DeviationRepository, HistoryRepository,
    },
    models::{
        auth::User,
        capas::{Capa, NewCapa, Priority, SOURCE_DEVIATION},
        deviations::{
            CreateDeviationPayload, Deviation, DeviationFilter, DeviationStatus, DeviationStatusPayload,
            RaiseCapaPayload, Severity, UpdateDeviationPayload,
        },
        workflow::{ModuleStats, StatusHistoryEntry, WorkflowStatus},
    },
};

/// CAPAs raised from a deviation inherit a priority from its severity.
pub fn priority_for(severity: Severity) -> Priority {
    match severity {
        Severity::Critical => Priority::Critical,
        Severity::Major => Priority::High,
        Severity::Minor => Priority::Medium,
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

#[derive(Clone)]
pub struct DeviationService {
    deviation_repo: DeviationRepository,
    capa_repo: CapaRepository,
    history_repo: HistoryRepository,
}

impl DeviationService {
    pub fn new(deviation_repo: DeviationRepository, capa_repo: CapaRepository, history_repo: HistoryRepository) -> Self {
        Self { deviation_repo, capa_repo, history_repo }
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        filter: &DeviationFilter,
    ) -> Result<Vec<Deviation>, AppError> {
        let (limit, offset) = pagination::page(filter.limit, filter.offset);
        self.deviation_repo
            .list(&mut *conn, tenant_id, filter, pagination::search_term(&filter.search), limit, offset)
            .await
    }

    pub async fn stats(&self, conn: &mut PgConnection, tenant_id: Uuid) -> Result<ModuleStats, AppError> {
        let by_status = self.deviation_repo.count_by_status(&mut *conn, tenant_id).await?;
        let by_severity = self.deviation_repo.count_by_severity(&mut *conn, tenant_id).await?;
        Ok(ModuleStats::new(by_status, by_severity))
    }

    pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<Deviation, AppError> {
        self.find(conn, tenant_id, id, false).await
    }

    pub async fn history(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, AppError> {
        self.find(conn, tenant_id, id, false).await?;
        self.history_repo.list(&mut *conn, tenant_id, ENTITY_DEVIATION, id).await
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        payload: CreateDeviationPayload,
    ) -> Result<Deviation, AppError> {
        payload.validate()?;

        let number = next_number(&mut *conn, tenant_id, DEVIATION_PREFIX).await?;
        let deviation = self
            .deviation_repo
            .create(&mut *conn, tenant_id, &number, &payload, user.id)
            .await?;

        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_DEVIATION,
                    entity_id: deviation.id,
                    from_status: None,
                    to_status: deviation.status.as_str(),
                    comment: None,
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(
            deviation = %deviation.deviation_number,
            severity = ?deviation.severity,
            tenant_id = %tenant_id,
            "deviation reported"
        );
        Ok(deviation)
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: UpdateDeviationPayload,
    ) -> Result<Deviation, AppError> {
        payload.validate()?;

        let current = self.find(conn, tenant_id, id, true).await?;
        if current.status.is_terminal() {
            return Err(AppError::BusinessRule(format!(
                "Deviation {} is {} and can no longer be edited.",
                current.deviation_number,
                current.status.as_str()
            )));
        }

        self.deviation_repo.update(&mut *conn, tenant_id, id, &payload, user.id).await
    }

    pub async fn change_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: DeviationStatusPayload,
    ) -> Result<Deviation, AppError> {
        let current = self.find(conn, tenant_id, id, true).await?;
        current.status.ensure_transition(payload.status)?;

        if payload.status == DeviationStatus::CapaInProgress && current.linked_capa_id.is_none() {
            return Err(AppError::BusinessRule(
                "Raise or link a CAPA before moving the deviation to capa_in_progress.".into(),
            ));
        }
        if payload.status == DeviationStatus::Closed
            && !has_text(payload.verification_comments.as_deref())
            && !has_text(current.verification_comments.as_deref())
        {
            return Err(AppError::BusinessRule(
                "Verification comments are required to close a deviation.".into(),
            ));
        }

        let deviation = self
            .deviation_repo
            .set_status(
                &mut *conn,
                tenant_id,
                id,
                payload.status,
                payload.verification_comments.as_deref().filter(|c| !c.trim().is_empty()),
                user.id,
            )
            .await?;

        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_DEVIATION,
                    entity_id: id,
                    from_status: Some(current.status.as_str()),
                    to_status: deviation.status.as_str(),
                    comment: payload.comment.as_deref(),
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(
            deviation = %deviation.deviation_number,
            from = current.status.as_str(),
            to = deviation.status.as_str(),
            "deviation status changed"
        );
        Ok(deviation)
    }

    /// Opens a CAPA for the deviation, links it and moves the deviation to
    /// `capa_in_progress`.
    pub async fn raise_capa(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: RaiseCapaPayload,
    ) -> Result<(Deviation, Capa), AppError> {
        payload.validate()?;

        let current = self.find(conn, tenant_id, id, true).await?;
        if current.linked_capa_id.is_some() {
            return Err(AppError::Conflict(format!(
                "Deviation {} already has a linked CAPA.",
                current.deviation_number
            )));
        }
        current.status.ensure_transition(DeviationStatus::CapaInProgress)?;

        let new_capa = NewCapa {
            title: payload
                .title
                .unwrap_or_else(|| format!("CAPA for {}: {}", current.deviation_number, current.title)),
            description: payload.description.unwrap_or_else(|| current.description.clone()),
            capa_type: payload.capa_type,
            source: SOURCE_DEVIATION.to_string(),
            source_reference: Some(current.deviation_number.clone()),
            deviation_id: Some(current.id),
            priority: payload.priority.unwrap_or_else(|| priority_for(current.severity)),
            root_cause: current.root_cause.clone(),
            assigned_to: payload.assigned_to.or(current.assigned_to),
            due_date: payload.due_date,
        };

        let number = next_number(&mut *conn, tenant_id, CAPA_PREFIX).await?;
        let capa = self.capa_repo.create(&mut *conn, tenant_id, &number, &new_capa, user.id).await?;
        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_CAPA,
                    entity_id: capa.id,
                    from_status: None,
                    to_status: capa.status.as_str(),
                    comment: Some(&format!("Raised from deviation {}", current.deviation_number)),
                    changed_by: user.id,
                },
            )
            .await?;

        let deviation = self.deviation_repo.link_capa(&mut *conn, tenant_id, id, capa.id, user.id).await?;
        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_DEVIATION,
                    entity_id: id,
                    from_status: Some(current.status.as_str()),
                    to_status: deviation.status.as_str(),
                    comment: Some(&format!("CAPA {} raised", capa.capa_number)),
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(
            deviation = %deviation.deviation_number,
            capa = %capa.capa_number,
            "CAPA raised from deviation"
        );
        Ok((deviation, capa))
    }

    pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.deviation_repo.delete(&mut *conn, tenant_id, id).await? {
            return Err(AppError::not_found("Deviation"));
        }
        Ok(())
    }

    async fn find(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid, for_update: bool) -> Result<Deviation, AppError> {
        self.deviation_repo
            .find_by_id(&mut *conn, tenant_id, id, for_update)
            .await?
            .ok_or_else(|| AppError::not_found("Deviation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_drives_default_capa_priority() {
        assert_eq!(priority_for(Severity::Critical), Priority::Critical);
        assert_eq!(priority_for(Severity::Major), Priority::High);
        assert_eq!(priority_for(Severity::Minor), Priority::Medium);
    }

    #[test]
    fn blank_comments_do_not_count() {
        assert!(!has_text(None));
        assert!(!has_text(Some("   ")));
        assert!(has_text(Some("Verified by QA walkthrough")));
    }
}
