// src/models/audits.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::workflow::WorkflowStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "audit_type")]
pub enum AuditType {
    Internal,
    External,
    Regulatory,
    Supplier,
    #[sqlx(rename = "Self-Inspection")]
    #[serde(rename = "Self-Inspection")]
    SelfInspection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "audit_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Planned,
    InProgress,
    ReportDraft,
    ReportReview,
    Completed,
    Closed,
}

impl WorkflowStatus for AuditStatus {
    const FLOW: &'static [Self] = &[
        AuditStatus::Planned,
        AuditStatus::InProgress,
        AuditStatus::ReportDraft,
        AuditStatus::ReportReview,
        AuditStatus::Completed,
        AuditStatus::Closed,
    ];
    const EXTRA_EDGES: &'static [(Self, Self)] =
        &[(AuditStatus::ReportReview, AuditStatus::ReportDraft)];
    const TERMINAL: &'static [Self] = &[AuditStatus::Closed];

    fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Planned => "planned",
            AuditStatus::InProgress => "in_progress",
            AuditStatus::ReportDraft => "report_draft",
            AuditStatus::ReportReview => "report_review",
            AuditStatus::Completed => "completed",
            AuditStatus::Closed => "closed",
        }
    }
}

impl AuditStatus {
    /// Findings are frozen once the report is signed off.
    pub fn findings_locked(self) -> bool {
        matches!(self, AuditStatus::Completed | AuditStatus::Closed)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "AUD-2025-001")]
    pub audit_number: String,
    pub title: String,
    pub audit_type: AuditType,
    pub status: AuditStatus,
    pub scope: Option<String>,
    pub auditee: Option<String>,
    pub lead_auditor: Option<String>,
    pub scheduled_date: NaiveDate,
    pub completed_date: Option<NaiveDate>,
    pub critical_findings: i32,
    pub major_findings: i32,
    pub minor_findings: i32,
    pub observations: i32,
    pub summary: Option<String>,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Audit {
    pub fn total_findings(&self) -> i32 {
        self.critical_findings + self.major_findings + self.minor_findings + self.observations
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuditPayload {
    #[validate(length(min = 1, message = "The title is required."))]
    pub title: String,
    pub audit_type: AuditType,
    pub scope: Option<String>,
    pub auditee: Option<String>,
    pub lead_auditor: Option<String>,
    pub scheduled_date: NaiveDate,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuditPayload {
    #[validate(length(min = 1, message = "The title cannot be empty."))]
    pub title: Option<String>,
    pub audit_type: Option<AuditType>,
    pub scope: Option<String>,
    pub auditee: Option<String>,
    pub lead_auditor: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditFindingsPayload {
    #[validate(range(min = 0, message = "Counts cannot be negative."))]
    pub critical: i32,
    #[validate(range(min = 0, message = "Counts cannot be negative."))]
    pub major: i32,
    #[validate(range(min = 0, message = "Counts cannot be negative."))]
    pub minor: i32,
    #[validate(range(min = 0, message = "Counts cannot be negative."))]
    pub observations: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditStatusPayload {
    pub status: AuditStatus,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AuditFilter {
    pub status: Option<AuditStatus>,
    pub audit_type: Option<AuditType>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_review_can_return_to_draft() {
        use AuditStatus::*;
        assert!(ReportReview.can_transition_to(ReportDraft));
        assert!(Completed.can_transition_to(Closed));
        assert!(!Planned.can_transition_to(Completed));
        assert!(Completed.findings_locked());
        assert!(!ReportDraft.findings_locked());
    }

    #[test]
    fn self_inspection_wire_name() {
        let t: AuditType = serde_json::from_str("\"Self-Inspection\"").unwrap();
        assert_eq!(t, AuditType::SelfInspection);
    }
}
