// src/db/history_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::workflow::StatusHistoryEntry};

pub const ENTITY_DOCUMENT: &str = "document";
pub const ENTITY_DEVIATION: &str = "deviation";
pub const ENTITY_CAPA: &str = "capa";
pub const ENTITY_CHANGE_CONTROL: &str = "change_control";
pub const ENTITY_AUDIT: &str = "audit";
pub const ENTITY_TRAINING: &str = "training";

/// One row per status a record has been in, creation included.
#[derive(Debug, Clone)]
pub struct StatusChange<'a> {
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    pub from_status: Option<&'a str>,
    pub to_status: &'a str,
    pub comment: Option<&'a str>,
    pub changed_by: Uuid,
}

#[derive(Clone, Default)]
pub struct HistoryRepository;

impl HistoryRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn record<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        change: StatusChange<'_>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO status_history (
                tenant_id, entity_type, entity_id, from_status, to_status, comment, changed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(tenant_id)
        .bind(change.entity_type)
        .bind(change.entity_id)
        .bind(change.from_status)
        .bind(change.to_status)
        .bind(change.comment)
        .bind(change.changed_by)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        entity_type: &'static str,
        entity_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, StatusHistoryEntry>(
            r#"
            SELECT id, from_status, to_status, comment, changed_by, changed_at
            FROM status_history
            WHERE tenant_id = $1 AND entity_type = $2 AND entity_id = $3
            ORDER BY changed_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(executor)
        .await?;
        Ok(entries)
    }
}
