// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("One or more fields are invalid.")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Authentication token is invalid or missing.")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(String),

    #[error("The X-Tenant-ID header is required.")]
    TenantRequired,

    #[error("The X-Tenant-ID header is not a valid tenant id.")]
    InvalidTenantHeader,

    #[error("The X-Tenant-ID header does not match the authenticated tenant.")]
    TenantMismatch,

    #[error("This tenant is inactive.")]
    TenantInactive,

    #[error("The '{0}' module is disabled for this tenant.")]
    FeatureDisabled(&'static str),

    #[error("{0} not found.")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Cannot change status from '{from}' to '{to}'.")]
    InvalidTransition { from: String, to: String },

    #[error("{0}")]
    BusinessRule(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::TenantRequired
            | AppError::InvalidTenantHeader => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_)
            | AppError::TenantMismatch
            | AppError::TenantInactive
            | AppError::FeatureDisabled(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidTransition { .. } | AppError::BusinessRule(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::DatabaseError(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(e) if is_unique_violation(e) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "message": self.to_string(),
                "details": details,
            }));
            return (status, body).into_response();
        }

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Internal server error: {}", self);
                "An unexpected error occurred.".to_string()
            }
            StatusCode::NOT_FOUND if matches!(self, AppError::DatabaseError(_)) => {
                "Resource not found.".to_string()
            }
            StatusCode::CONFLICT if matches!(self, AppError::DatabaseError(_)) => {
                "A record with the same unique value already exists.".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({ "message": message, "details": null }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn maps_domain_errors_to_status_codes() {
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::TenantRequired.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::TenantMismatch.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("Deviation").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InvalidTransition { from: "closed".into(), to: "open".into() }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn body_carries_message_for_the_client() {
        let response = AppError::not_found("CAPA").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "CAPA not found.");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = AppError::InternalServerError(anyhow::anyhow!("secret dsn")).into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "An unexpected error occurred.");
    }
}
