// src/models/change_controls.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{capas::Priority, workflow::WorkflowStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "change_type")]
pub enum ChangeType {
    Process,
    Equipment,
    Document,
    System,
    Facility,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "change_control_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChangeControlStatus {
    Initiated,
    Assessment,
    ApprovalPending,
    Approved,
    Implementation,
    Verification,
    Completed,
    Rejected,
    Cancelled,
}

impl WorkflowStatus for ChangeControlStatus {
    const FLOW: &'static [Self] = &[
        ChangeControlStatus::Initiated,
        ChangeControlStatus::Assessment,
        ChangeControlStatus::ApprovalPending,
        ChangeControlStatus::Approved,
        ChangeControlStatus::Implementation,
        ChangeControlStatus::Verification,
        ChangeControlStatus::Completed,
    ];
    const EXITS: &'static [Self] = &[ChangeControlStatus::Cancelled];
    const EXTRA_EDGES: &'static [(Self, Self)] =
        &[(ChangeControlStatus::ApprovalPending, ChangeControlStatus::Rejected)];
    const TERMINAL: &'static [Self] = &[
        ChangeControlStatus::Completed,
        ChangeControlStatus::Rejected,
        ChangeControlStatus::Cancelled,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ChangeControlStatus::Initiated => "initiated",
            ChangeControlStatus::Assessment => "assessment",
            ChangeControlStatus::ApprovalPending => "approval_pending",
            ChangeControlStatus::Approved => "approved",
            ChangeControlStatus::Implementation => "implementation",
            ChangeControlStatus::Verification => "verification",
            ChangeControlStatus::Completed => "completed",
            ChangeControlStatus::Rejected => "rejected",
            ChangeControlStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeControl {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "CC-2025-001")]
    pub change_number: String,
    pub title: String,
    pub description: String,
    pub change_type: ChangeType,
    pub justification: Option<String>,
    pub risk_level: Priority,
    pub impact_assessment: Option<String>,
    #[schema(example = json!(["Pharmacy system", "Label printer"]))]
    pub affected_systems: Vec<String>,
    pub status: ChangeControlStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub target_date: Option<NaiveDate>,
    pub implementation_notes: Option<String>,
    pub verification_notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    /// The requester.
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChangeControlPayload {
    #[validate(length(min = 1, message = "The title is required."))]
    pub title: String,
    #[validate(length(min = 1, message = "The description is required."))]
    pub description: String,
    pub change_type: ChangeType,
    pub justification: Option<String>,
    pub risk_level: Option<Priority>,
    pub impact_assessment: Option<String>,
    #[serde(default)]
    pub affected_systems: Vec<String>,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChangeControlPayload {
    #[validate(length(min = 1, message = "The title cannot be empty."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub change_type: Option<ChangeType>,
    pub justification: Option<String>,
    pub risk_level: Option<Priority>,
    pub impact_assessment: Option<String>,
    pub affected_systems: Option<Vec<String>>,
    pub target_date: Option<NaiveDate>,
    pub implementation_notes: Option<String>,
    pub verification_notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeControlStatusPayload {
    pub status: ChangeControlStatus,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ChangeControlFilter {
    pub status: Option<ChangeControlStatus>,
    pub risk_level: Option<Priority>,
    pub change_type: Option<ChangeType>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_approval_can_be_rejected() {
        use ChangeControlStatus::*;
        assert!(ApprovalPending.can_transition_to(Rejected));
        assert!(!Assessment.can_transition_to(Rejected));
        assert!(Assessment.can_transition_to(Cancelled));
        assert!(ApprovalPending.can_transition_to(Approved));
        assert!(!Initiated.can_transition_to(Approved));
    }
}
