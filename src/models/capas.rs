// src/models/capas.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::workflow::WorkflowStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "capa_type")]
pub enum CapaType {
    Corrective,
    Preventive,
    Both,
}

/// Shared by CAPA priority and change-control risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "priority_level")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "effectiveness_result", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EffectivenessResult {
    Effective,
    NotEffective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "capa_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CapaStatus {
    Open,
    Investigation,
    ActionPlan,
    Implementation,
    EffectivenessCheck,
    Completed,
    Cancelled,
}

impl WorkflowStatus for CapaStatus {
    const FLOW: &'static [Self] = &[
        CapaStatus::Open,
        CapaStatus::Investigation,
        CapaStatus::ActionPlan,
        CapaStatus::Implementation,
        CapaStatus::EffectivenessCheck,
        CapaStatus::Completed,
    ];
    const EXITS: &'static [Self] = &[CapaStatus::Cancelled];
    const EXTRA_EDGES: &'static [(Self, Self)] =
        &[(CapaStatus::EffectivenessCheck, CapaStatus::ActionPlan)];
    const TERMINAL: &'static [Self] = &[CapaStatus::Completed, CapaStatus::Cancelled];

    fn as_str(self) -> &'static str {
        match self {
            CapaStatus::Open => "open",
            CapaStatus::Investigation => "investigation",
            CapaStatus::ActionPlan => "action_plan",
            CapaStatus::Implementation => "implementation",
            CapaStatus::EffectivenessCheck => "effectiveness_check",
            CapaStatus::Completed => "completed",
            CapaStatus::Cancelled => "cancelled",
        }
    }
}

pub const SOURCE_DEVIATION: &str = "Deviation";

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Capa {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "CAPA-2025-001")]
    pub capa_number: String,
    pub title: String,
    pub description: String,
    pub capa_type: CapaType,
    #[schema(example = "Deviation")]
    pub source: String,
    #[schema(example = "DEV-2025-001")]
    pub source_reference: Option<String>,
    pub deviation_id: Option<Uuid>,
    pub priority: Priority,
    pub status: CapaStatus,
    pub root_cause: Option<String>,
    pub action_plan: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub effectiveness_check_result: Option<EffectivenessResult>,
    pub effectiveness_comments: Option<String>,
    pub verified_by: Option<Uuid>,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Capa {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_terminal() && self.due_date.map(|d| d < today).unwrap_or(false)
    }
}

/// Everything the insert needs; built from the create payload or from a deviation.
#[derive(Debug, Clone)]
pub struct NewCapa {
    pub title: String,
    pub description: String,
    pub capa_type: CapaType,
    pub source: String,
    pub source_reference: Option<String>,
    pub deviation_id: Option<Uuid>,
    pub priority: Priority,
    pub root_cause: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCapaPayload {
    #[validate(length(min = 1, message = "The title is required."))]
    pub title: String,
    #[validate(length(min = 1, message = "The description is required."))]
    pub description: String,
    pub capa_type: CapaType,
    #[validate(length(min = 1, message = "The source is required."))]
    #[schema(example = "Audit")]
    pub source: String,
    pub source_reference: Option<String>,
    pub deviation_id: Option<Uuid>,
    pub priority: Option<Priority>,
    pub root_cause: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCapaPayload {
    #[validate(length(min = 1, message = "The title cannot be empty."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub capa_type: Option<CapaType>,
    pub priority: Option<Priority>,
    pub root_cause: Option<String>,
    pub action_plan: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapaStatusPayload {
    pub status: CapaStatus,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectivenessCheckPayload {
    pub result: EffectivenessResult,
    pub comments: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CapaFilter {
    pub status: Option<CapaStatus>,
    pub capa_type: Option<CapaType>,
    pub priority: Option<Priority>,
    pub source: Option<String>,
    /// Due date passed and not completed/cancelled.
    pub overdue: Option<bool>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effectiveness_check_can_loop_back() {
        use CapaStatus::*;
        assert!(EffectivenessCheck.can_transition_to(ActionPlan));
        assert!(EffectivenessCheck.can_transition_to(Completed));
        assert!(!Open.can_transition_to(Completed));
        assert!(Implementation.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn overdue_ignores_terminal_capas() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut capa = Capa {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            capa_number: "CAPA-2025-001".into(),
            title: "Retrain staff".into(),
            description: "Hood cleaning".into(),
            capa_type: CapaType::Corrective,
            source: SOURCE_DEVIATION.into(),
            source_reference: Some("DEV-2025-001".into()),
            deviation_id: None,
            priority: Priority::High,
            status: CapaStatus::Implementation,
            root_cause: None,
            action_plan: None,
            assigned_to: None,
            due_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            completed_at: None,
            effectiveness_check_result: None,
            effectiveness_comments: None,
            verified_by: None,
            created_by: Uuid::new_v4(),
            updated_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(capa.is_overdue(today));
        capa.status = CapaStatus::Completed;
        assert!(!capa.is_overdue(today));
    }
}
