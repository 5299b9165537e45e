// src/services/capa_service.rs

use chrono::Utc;
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        numbering::{next_number, CAPA_PREFIX},
        pagination,
    },
    db::{
        history_repo::{StatusChange, ENTITY_CAPA, ENTITY_DEVIATION},
        CapaRepository, DeviationRepository, HistoryRepository,
    },
    models::{
        auth::User,
        capas::{
            Capa, CapaFilter, CapaStatus, CapaStatusPayload, CreateCapaPayload, EffectivenessCheckPayload,
            EffectivenessResult, NewCapa, Priority, UpdateCapaPayload, SOURCE_DEVIATION,
        },
        deviations::DeviationStatus,
        workflow::{ModuleStats, StatusHistoryEntry, WorkflowStatus},
    },
};

/// Where an effectiveness check sends the CAPA.
pub fn status_after_check(result: EffectivenessResult) -> CapaStatus {
    match result {
        EffectivenessResult::Effective => CapaStatus::Completed,
        EffectivenessResult::NotEffective => CapaStatus::ActionPlan,
    }
}

#[derive(Clone)]
pub struct CapaService {
    capa_repo: CapaRepository,
    deviation_repo: DeviationRepository,
    history_repo: HistoryRepository,
}

impl CapaService {
    pub fn new(capa_repo: CapaRepository, deviation_repo: DeviationRepository, history_repo: HistoryRepository) -> Self {
        Self { capa_repo, deviation_repo, history_repo }
    }

    pub async fn list(&self, conn: &mut PgConnection, tenant_id: Uuid, filter: &CapaFilter) -> Result<Vec<Capa>, AppError> {
        let (limit, offset) = pagination::page(filter.limit, filter.offset);
        let overdue_before = filter.overdue.unwrap_or(false).then(|| Utc::now().date_naive());
        self.capa_repo
            .list(
                &mut *conn,
                tenant_id,
                filter,
                pagination::search_term(&filter.search),
                overdue_before,
                limit,
                offset,
            )
            .await
    }

    pub async fn stats(&self, conn: &mut PgConnection, tenant_id: Uuid) -> Result<ModuleStats, AppError> {
        let by_status = self.capa_repo.count_by_status(&mut *conn, tenant_id).await?;
        let by_priority = self.capa_repo.count_by_priority(&mut *conn, tenant_id).await?;
        Ok(ModuleStats::new(by_status, by_priority))
    }

    pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<Capa, AppError> {
        self.find(conn, tenant_id, id, false).await
    }

    pub async fn history(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, AppError> {
        self.find(conn, tenant_id, id, false).await?;
        self.history_repo.list(&mut *conn, tenant_id, ENTITY_CAPA, id).await
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        payload: CreateCapaPayload,
    ) -> Result<Capa, AppError> {
        payload.validate()?;

        // 1. A CAPA naming a deviation takes it over, exactly like raising one from it
        let deviation = match payload.deviation_id {
            Some(deviation_id) => {
                let deviation = self
                    .deviation_repo
                    .find_by_id(&mut *conn, tenant_id, deviation_id, true)
                    .await?
                    .ok_or_else(|| AppError::not_found("Deviation"))?;
                if deviation.linked_capa_id.is_some() {
                    return Err(AppError::Conflict(format!(
                        "Deviation {} already has a linked CAPA.",
                        deviation.deviation_number
                    )));
                }
                deviation.status.ensure_transition(DeviationStatus::CapaInProgress)?;
                Some(deviation)
            }
            None => None,
        };

        let (source, source_reference) = match &deviation {
            Some(d) => (SOURCE_DEVIATION.to_string(), Some(d.deviation_number.clone())),
            None => (payload.source, payload.source_reference),
        };

        let new_capa = NewCapa {
            title: payload.title,
            description: payload.description,
            capa_type: payload.capa_type,
            source,
            source_reference,
            deviation_id: payload.deviation_id,
            priority: payload.priority.unwrap_or(Priority::Medium),
            root_cause: payload.root_cause,
            assigned_to: payload.assigned_to,
            due_date: payload.due_date,
        };

        // 2. Number and insert
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
                    comment: None,
                    changed_by: user.id,
                },
            )
            .await?;

        // 3. Link back and move the deviation to capa_in_progress
        if let Some(deviation) = deviation {
            let linked = self
                .deviation_repo
                .link_capa(&mut *conn, tenant_id, deviation.id, capa.id, user.id)
                .await?;
            self.history_repo
                .record(
                    &mut *conn,
                    tenant_id,
                    StatusChange {
                        entity_type: ENTITY_DEVIATION,
                        entity_id: deviation.id,
                        from_status: Some(deviation.status.as_str()),
                        to_status: linked.status.as_str(),
                        comment: Some(&format!("CAPA {} linked", capa.capa_number)),
                        changed_by: user.id,
                    },
                )
                .await?;
        }

        tracing::info!(capa = %capa.capa_number, tenant_id = %tenant_id, "CAPA created");
        Ok(capa)
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: UpdateCapaPayload,
    ) -> Result<Capa, AppError> {
        payload.validate()?;

        let current = self.find(conn, tenant_id, id, true).await?;
        if current.status.is_terminal() {
            return Err(AppError::BusinessRule(format!(
                "CAPA {} is {} and can no longer be edited.",
                current.capa_number,
                current.status.as_str()
            )));
        }

        self.capa_repo.update(&mut *conn, tenant_id, id, &payload, user.id).await
    }

    /// Completion goes through the effectiveness check, never a plain status change.
    pub async fn change_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: CapaStatusPayload,
    ) -> Result<Capa, AppError> {
        let current = self.find(conn, tenant_id, id, true).await?;
        current.status.ensure_transition(payload.status)?;

        if payload.status == CapaStatus::Completed {
            return Err(AppError::BusinessRule(
                "Record an effectiveness check to complete a CAPA.".into(),
            ));
        }

        let capa = self.capa_repo.set_status(&mut *conn, tenant_id, id, payload.status, user.id).await?;
        self.record_transition(conn, tenant_id, user, &capa, current.status, payload.comment.as_deref())
            .await?;
        Ok(capa)
    }

    pub async fn record_effectiveness(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: EffectivenessCheckPayload,
    ) -> Result<Capa, AppError> {
        let current = self.find(conn, tenant_id, id, true).await?;
        if current.status != CapaStatus::EffectivenessCheck {
            return Err(AppError::BusinessRule(format!(
                "CAPA {} is not awaiting an effectiveness check.",
                current.capa_number
            )));
        }

        let next = status_after_check(payload.result);
        current.status.ensure_transition(next)?;

        self.capa_repo
            .record_effectiveness(&mut *conn, tenant_id, id, payload.result, payload.comments.as_deref(), user.id)
            .await?;
        let capa = self.capa_repo.set_status(&mut *conn, tenant_id, id, next, user.id).await?;

        let comment = match payload.result {
            EffectivenessResult::Effective => "Effectiveness check: effective",
            EffectivenessResult::NotEffective => "Effectiveness check: not effective",
        };
        self.record_transition(conn, tenant_id, user, &capa, current.status, Some(comment)).await?;

        if capa.status == CapaStatus::Completed {
            self.advance_linked_deviation(conn, tenant_id, user, &capa).await?;
        }
        Ok(capa)
    }

    pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.capa_repo.delete(&mut *conn, tenant_id, id).await? {
            return Err(AppError::not_found("CAPA"));
        }
        Ok(())
    }

    async fn record_transition(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        capa: &Capa,
        from: CapaStatus,
        comment: Option<&str>,
    ) -> Result<(), AppError> {
        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_CAPA,
                    entity_id: capa.id,
                    from_status: Some(from.as_str()),
                    to_status: capa.status.as_str(),
                    comment,
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(
            capa = %capa.capa_number,
            from = from.as_str(),
            to = capa.status.as_str(),
            "CAPA status changed"
        );
        Ok(())
    }

    /// A completed CAPA hands its deviation over to closure review.
    async fn advance_linked_deviation(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        capa: &Capa,
    ) -> Result<(), AppError> {
        let Some(deviation_id) = capa.deviation_id else {
            return Ok(());
        };
        let Some(deviation) = self
            .deviation_repo
            .find_by_id(&mut *conn, tenant_id, deviation_id, true)
            .await?
        else {
            return Ok(());
        };
        if deviation.status != DeviationStatus::CapaInProgress {
            return Ok(());
        }

        let updated = self
            .deviation_repo
            .set_status(&mut *conn, tenant_id, deviation_id, DeviationStatus::PendingClosure, None, user.id)
            .await?;
        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_DEVIATION,
                    entity_id: deviation_id,
                    from_status: Some(deviation.status.as_str()),
                    to_status: updated.status.as_str(),
                    comment: Some(&format!("CAPA {} completed", capa.capa_number)),
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(
            deviation = %updated.deviation_number,
            capa = %capa.capa_number,
            "deviation moved to pending closure"
        );
        Ok(())
    }

    async fn find(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid, for_update: bool) -> Result<Capa, AppError> {
        self.capa_repo
            .find_by_id(&mut *conn, tenant_id, id, for_update)
            .await?
            .ok_or_else(|| AppError::not_found("CAPA"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effectiveness_outcomes() {
        assert_eq!(status_after_check(EffectivenessResult::Effective), CapaStatus::Completed);
        assert_eq!(status_after_check(EffectivenessResult::NotEffective), CapaStatus::ActionPlan);
        assert!(CapaStatus::EffectivenessCheck.can_transition_to(CapaStatus::ActionPlan));
        assert!(CapaStatus::EffectivenessCheck.can_transition_to(CapaStatus::Completed));
    }
}
