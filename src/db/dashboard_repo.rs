// src/db/dashboard_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{dashboard::DashboardCounters, workflow::CountEntry},
};

#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn counters<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        today: NaiveDate,
        review_cutoff: NaiveDate,
        now: DateTime<Utc>,
        expiring_cutoff: DateTime<Utc>,
    ) -> Result<DashboardCounters, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let counters = sqlx::query_as::<_, DashboardCounters>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM deviations
                  WHERE tenant_id = $1 AND status NOT IN ('closed', 'rejected')) AS open_deviations,
                (SELECT COUNT(*) FROM capas
                  WHERE tenant_id = $1 AND status NOT IN ('completed', 'cancelled')) AS open_capas,
                (SELECT COUNT(*) FROM capas
                  WHERE tenant_id = $1 AND status NOT IN ('completed', 'cancelled')
                    AND due_date < $2) AS overdue_capas,
                (SELECT COUNT(*) FROM change_controls
                  WHERE tenant_id = $1 AND status = 'approval_pending') AS change_controls_pending_approval,
                (SELECT COUNT(*) FROM audits
                  WHERE tenant_id = $1 AND status = 'planned') AS audits_planned,
                (SELECT COUNT(*) FROM audits
                  WHERE tenant_id = $1 AND status = 'in_progress') AS audits_in_progress,
                (SELECT COUNT(*) FROM documents
                  WHERE tenant_id = $1 AND status = 'approved' AND review_date <= $3) AS documents_due_for_review,
                (SELECT COUNT(*) FROM training_assignments
                  WHERE tenant_id = $1 AND status IN ('assigned', 'in_progress', 'content_completed')
                    AND due_date < $2) AS overdue_assignments,
                (SELECT COUNT(*) FROM certificates
                  WHERE tenant_id = $1 AND NOT revoked
                    AND expires_at >= $4 AND expires_at < $5) AS certificates_expiring_soon
            "#,
        )
        .bind(tenant_id)
        .bind(today)
        .bind(review_cutoff)
        .bind(now)
        .bind(expiring_cutoff)
        .fetch_one(executor)
        .await?;
        Ok(counters)
    }

    pub async fn open_deviations_by_severity<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<CountEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let counts = sqlx::query_as::<_, CountEntry>(
            r#"
            SELECT severity::text AS key, COUNT(*) AS count
            FROM deviations
            WHERE tenant_id = $1 AND status NOT IN ('closed', 'rejected')
            GROUP BY severity
            ORDER BY severity
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(counts)
    }
}
