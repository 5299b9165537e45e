// src/services/dashboard_service.rs

use chrono::{Duration, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::{certificates::EXPIRING_SOON_DAYS, dashboard::DashboardSummary},
    services::document_service::REVIEW_WINDOW_DAYS,
};

#[derive(Clone)]
pub struct DashboardService {
    dashboard_repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(dashboard_repo: DashboardRepository) -> Self {
        Self { dashboard_repo }
    }

    pub async fn summary(&self, conn: &mut PgConnection, tenant_id: Uuid) -> Result<DashboardSummary, AppError> {
        let now = Utc::now();
        let today = now.date_naive();

        let counters = self
            .dashboard_repo
            .counters(
                &mut *conn,
                tenant_id,
                today,
                today + Duration::days(REVIEW_WINDOW_DAYS),
                now,
                now + Duration::days(EXPIRING_SOON_DAYS),
            )
            .await?;
        let open_deviations_by_severity = self.dashboard_repo.open_deviations_by_severity(&mut *conn, tenant_id).await?;

        Ok(DashboardSummary { counters, open_deviations_by_severity })
    }
}
