// src/models/deviations.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    capas::{CapaType, Priority},
    workflow::WorkflowStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "deviation_severity")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "deviation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeviationStatus {
    Open,
    Investigation,
    CapaRequired,
    CapaInProgress,
    PendingClosure,
    Closed,
    Rejected,
}

impl WorkflowStatus for DeviationStatus {
    const FLOW: &'static [Self] = &[
        DeviationStatus::Open,
        DeviationStatus::Investigation,
        DeviationStatus::CapaRequired,
        DeviationStatus::CapaInProgress,
        DeviationStatus::PendingClosure,
        DeviationStatus::Closed,
    ];
    const EXITS: &'static [Self] = &[DeviationStatus::Rejected];
    const TERMINAL: &'static [Self] = &[DeviationStatus::Closed, DeviationStatus::Rejected];
    // Not every deviation needs a CAPA: investigation may go straight to closure.
    const ALLOW_SKIP: bool = true;

    fn as_str(self) -> &'static str {
        match self {
            DeviationStatus::Open => "open",
            DeviationStatus::Investigation => "investigation",
            DeviationStatus::CapaRequired => "capa_required",
            DeviationStatus::CapaInProgress => "capa_in_progress",
            DeviationStatus::PendingClosure => "pending_closure",
            DeviationStatus::Closed => "closed",
            DeviationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Deviation {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "DEV-2025-001")]
    pub deviation_number: String,
    #[schema(example = "Refrigerator temperature excursion")]
    pub title: String,
    pub description: String,
    pub severity: Severity,
    #[schema(example = "Storage")]
    pub category: String,
    pub status: DeviationStatus,
    pub occurred_at: Option<DateTime<Utc>>,
    pub detected_at: DateTime<Utc>,
    pub location: Option<String>,
    pub product_affected: Option<String>,
    pub immediate_action: Option<String>,
    pub root_cause: Option<String>,
    pub investigation_summary: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub linked_capa_id: Option<Uuid>,
    pub verification_comments: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<Uuid>,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviationPayload {
    #[validate(length(min = 1, message = "The title is required."))]
    pub title: String,
    #[validate(length(min = 1, message = "The description is required."))]
    pub description: String,
    pub severity: Severity,
    #[validate(length(min = 1, message = "The category is required."))]
    pub category: String,
    pub occurred_at: Option<DateTime<Utc>>,
    pub detected_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub product_affected: Option<String>,
    pub immediate_action: Option<String>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviationPayload {
    #[validate(length(min = 1, message = "The title cannot be empty."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub category: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub product_affected: Option<String>,
    pub immediate_action: Option<String>,
    pub root_cause: Option<String>,
    pub investigation_summary: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub verification_comments: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviationStatusPayload {
    pub status: DeviationStatus,
    pub comment: Option<String>,
    /// Required (here or already on record) to close.
    pub verification_comments: Option<String>,
}

/// Raises a CAPA straight from the deviation.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RaiseCapaPayload {
    #[validate(length(min = 1, message = "The title is required."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub capa_type: CapaType,
    pub priority: Option<Priority>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DeviationFilter {
    pub status: Option<DeviationStatus>,
    pub severity: Option<Severity>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn investigation_can_close_directly() {
        use DeviationStatus::*;
        assert!(Open.can_transition_to(Investigation));
        assert!(Investigation.can_transition_to(Closed));
        assert!(CapaInProgress.can_transition_to(PendingClosure));
        assert!(PendingClosure.can_transition_to(Rejected));
    }

    #[test]
    fn closed_and_rejected_are_final() {
        use DeviationStatus::*;
        assert!(!Closed.can_transition_to(Open));
        assert!(!Rejected.can_transition_to(Investigation));
        assert!(!Investigation.can_transition_to(Open));
    }

    #[test]
    fn wire_values_match_status_list() {
        let s: DeviationStatus = serde_json::from_str("\"capa_in_progress\"").unwrap();
        assert_eq!(s, DeviationStatus::CapaInProgress);
        assert!(serde_json::from_str::<DeviationStatus>("\"escalated\"").is_err());
        assert_eq!(DeviationStatus::PendingClosure.as_str(), "pending_closure");
    }
}
