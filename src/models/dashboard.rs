// src/models/dashboard.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::workflow::CountEntry;

/// The cards on the landing page.
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounters {
    pub open_deviations: i64,
    pub open_capas: i64,
    pub overdue_capas: i64,
    pub change_controls_pending_approval: i64,
    pub audits_planned: i64,
    pub audits_in_progress: i64,
    pub documents_due_for_review: i64,
    pub overdue_assignments: i64,
    pub certificates_expiring_soon: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(flatten)]
    pub counters: DashboardCounters,
    /// Open deviations by severity.
    pub open_deviations_by_severity: Vec<CountEntry>,
}
