// src/models/documents.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{common::error::AppError, models::workflow::WorkflowStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_type")]
pub enum DocumentType {
    #[sqlx(rename = "SOP")]
    #[serde(rename = "SOP")]
    Sop,
    Policy,
    Form,
    Protocol,
    Record,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Review,
    Approved,
    Archived,
}

impl WorkflowStatus for DocumentStatus {
    const FLOW: &'static [Self] = &[
        DocumentStatus::Draft,
        DocumentStatus::Review,
        DocumentStatus::Approved,
        DocumentStatus::Archived,
    ];
    const EXTRA_EDGES: &'static [(Self, Self)] = &[(DocumentStatus::Review, DocumentStatus::Draft)];
    const TERMINAL: &'static [Self] = &[DocumentStatus::Archived];

    fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Review => "review",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "DOC-2025-001")]
    pub document_number: String,
    #[schema(example = "Sterile compounding SOP")]
    pub title: String,
    pub description: Option<String>,
    pub document_type: DocumentType,
    #[schema(example = "1.0")]
    pub version: String,
    pub status: DocumentStatus,
    pub department: Option<String>,
    pub file_url: Option<String>,
    #[schema(example = json!(["usp-797", "bud"]))]
    pub tags: Vec<String>,
    pub effective_date: Option<NaiveDate>,
    pub review_date: Option<NaiveDate>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Approved documents whose periodic review is due within `window_days` (or overdue).
    pub fn is_due_for_review(&self, today: NaiveDate, window_days: i64) -> bool {
        self.status == DocumentStatus::Approved
            && self
                .review_date
                .map(|d| d <= today + chrono::Duration::days(window_days))
                .unwrap_or(false)
    }
}

/// Longest accepted version part; keeps every part well inside `u32`.
const MAX_VERSION_PART_DIGITS: usize = 6;

pub fn validate_version(value: &str) -> Result<(), ValidationError> {
    let ok = !value.is_empty()
        && value.split('.').all(|part| {
            !part.is_empty()
                && part.len() <= MAX_VERSION_PART_DIGITS
                && part.chars().all(|c| c.is_ascii_digit())
        });
    if ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("version");
        err.message = Some("Version must look like 1.0 or 2.1.3".into());
        Err(err)
    }
}

/// `1.3` -> `2.0`. Stored versions that predate the length check may not
/// parse or may not bump; those are refused rather than reset.
pub fn next_major_version(version: &str) -> Result<String, AppError> {
    let major = version
        .split('.')
        .next()
        .and_then(|m| m.parse::<u64>().ok())
        .and_then(|m| m.checked_add(1))
        .ok_or_else(|| {
            AppError::BusinessRule(format!("Version {} cannot be bumped to a new major version.", version))
        })?;
    Ok(format!("{}.0", major))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentPayload {
    #[validate(length(min = 1, message = "The title is required."))]
    pub title: String,
    pub description: Option<String>,
    pub document_type: DocumentType,
    #[validate(custom(function = "validate_version"))]
    #[schema(example = "1.0")]
    pub version: Option<String>,
    pub department: Option<String>,
    pub file_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub effective_date: Option<NaiveDate>,
    pub review_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentPayload {
    #[validate(length(min = 1, message = "The title cannot be empty."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub document_type: Option<DocumentType>,
    #[validate(custom(function = "validate_version"))]
    pub version: Option<String>,
    pub department: Option<String>,
    pub file_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub effective_date: Option<NaiveDate>,
    pub review_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatusPayload {
    pub status: DocumentStatus,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DocumentFilter {
    pub status: Option<DocumentStatus>,
    pub document_type: Option<DocumentType>,
    pub search: Option<String>,
    #[serde(alias = "due_for_review")]
    pub due_for_review: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lifecycle() {
        use DocumentStatus::*;
        assert!(Draft.can_transition_to(Review));
        assert!(Review.can_transition_to(Draft));
        assert!(Review.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Archived));
        assert!(!Draft.can_transition_to(Approved));
        assert!(!Archived.can_transition_to(Draft));
    }

    #[test]
    fn version_bump() {
        assert_eq!(next_major_version("1.0").unwrap(), "2.0");
        assert_eq!(next_major_version("3.7.2").unwrap(), "4.0");
        assert!(validate_version("1.0").is_ok());
        assert!(validate_version("v1").is_err());
        assert!(validate_version("1..0").is_err());
    }

    #[test]
    fn oversized_versions_are_rejected_not_reset() {
        assert!(validate_version("99999999999.0").is_err());
        assert!(validate_version("4294967295.0").is_err());
        assert!(validate_version("999999.0").is_ok());

        assert_eq!(next_major_version("99999999999.0").unwrap(), "100000000000.0");
        assert_eq!(next_major_version("4294967295.0").unwrap(), "4294967296.0");
        assert!(matches!(
            next_major_version("18446744073709551615.0"),
            Err(AppError::BusinessRule(_))
        ));
        assert!(matches!(
            next_major_version("99999999999999999999999.0"),
            Err(AppError::BusinessRule(_))
        ));
    }

    #[test]
    fn document_type_keeps_wire_names() {
        assert_eq!(serde_json::to_string(&DocumentType::Sop).unwrap(), "\"SOP\"");
        let t: DocumentType = serde_json::from_str("\"Protocol\"").unwrap();
        assert_eq!(t, DocumentType::Protocol);
    }
}
