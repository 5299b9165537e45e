// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::auth::User;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    #[schema(example = "https://cdn.example.com/logo.png")]
    pub logo_url: Option<String>,
    #[schema(example = "#0F766E")]
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    #[schema(example = "Farmácia Central")]
    pub company_name: Option<String>,
}

fn enabled() -> bool {
    true
}

/// Module toggles. Missing keys mean "enabled".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(default = "enabled")]
    pub documents: bool,
    #[serde(default = "enabled")]
    pub deviations: bool,
    #[serde(default = "enabled")]
    pub capas: bool,
    #[serde(default = "enabled")]
    pub change_controls: bool,
    #[serde(default = "enabled")]
    pub audits: bool,
    #[serde(default = "enabled")]
    pub training: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            documents: true,
            deviations: true,
            capas: true,
            change_controls: true,
            audits: true,
            training: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Documents,
    Deviations,
    Capas,
    ChangeControls,
    Audits,
    Training,
}

impl Feature {
    pub fn name(self) -> &'static str {
        match self {
            Feature::Documents => "documents",
            Feature::Deviations => "deviations",
            Feature::Capas => "capas",
            Feature::ChangeControls => "changeControls",
            Feature::Audits => "audits",
            Feature::Training => "training",
        }
    }

    pub fn is_enabled(self, features: &Features) -> bool {
        match self {
            Feature::Documents => features.documents,
            Feature::Deviations => features.deviations,
            Feature::Capas => features.capas,
            Feature::ChangeControls => features.change_controls,
            Feature::Audits => features.audits,
            Feature::Training => features.training,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    #[schema(example = "Farmácia Central")]
    pub name: String,
    #[schema(example = "farmacia-central")]
    pub subdomain: String,
    #[schema(value_type = Branding)]
    pub branding: Json<Branding>,
    #[schema(value_type = Features)]
    pub features: Json<Features>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the login screen may see before authenticating.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantPublicInfo {
    pub id: Uuid,
    pub name: String,
    pub subdomain: String,
    pub branding: Branding,
}

impl From<Tenant> for TenantPublicInfo {
    fn from(tenant: Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name,
            subdomain: tenant.subdomain,
            branding: tenant.branding.0,
        }
    }
}

pub fn validate_subdomain(value: &str) -> Result<(), ValidationError> {
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if value.len() < 3 || value.len() > 63 || !valid_chars || value.starts_with('-') || value.ends_with('-') {
        let mut err = ValidationError::new("subdomain");
        err.message = Some("Use 3-63 lowercase letters, digits or hyphens.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, message = "The tenant name is required."))]
    #[schema(example = "Farmácia Central")]
    pub name: String,
    #[validate(custom(function = "validate_subdomain"))]
    #[schema(example = "farmacia-central")]
    pub subdomain: String,
    #[serde(default)]
    pub branding: Branding,
    pub features: Option<Features>,

    #[validate(email(message = "The admin email is invalid."))]
    pub admin_email: String,
    #[validate(length(min = 8, message = "The password must have at least 8 characters."))]
    pub admin_password: String,
    #[validate(length(min = 1, message = "The first name is required."))]
    pub admin_first_name: String,
    #[validate(length(min = 1, message = "The last name is required."))]
    pub admin_last_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantPayload {
    #[validate(length(min = 1, message = "The tenant name cannot be empty."))]
    pub name: Option<String>,
    pub branding: Option<Branding>,
    pub features: Option<Features>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    pub token: String,
    pub user: User,
    pub tenant: Tenant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_feature_keys_default_to_enabled() {
        let features: Features = serde_json::from_str(r#"{"audits": false}"#).unwrap();
        assert!(!Feature::Audits.is_enabled(&features));
        assert!(Feature::Training.is_enabled(&features));
        assert!(Feature::ChangeControls.is_enabled(&features));
    }

    #[test]
    fn subdomain_rules() {
        assert!(validate_subdomain("demo-pharmacy").is_ok());
        assert!(validate_subdomain("ab").is_err());
        assert!(validate_subdomain("Demo").is_err());
        assert!(validate_subdomain("-demo").is_err());
        assert!(validate_subdomain("demo_pharmacy").is_err());
    }
}
