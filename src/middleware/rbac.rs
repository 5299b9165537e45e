// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::UserRole,
};

pub const DOCUMENTS_WRITE: &str = "documents:write";
pub const DOCUMENTS_APPROVE: &str = "documents:approve";
pub const QUALITY_WRITE: &str = "quality:write";
pub const QUALITY_APPROVE: &str = "quality:approve";
pub const AUDITS_WRITE: &str = "audits:write";
pub const TRAINING_MANAGE: &str = "training:manage";
pub const USERS_MANAGE: &str = "users:manage";
pub const TENANT_MANAGE: &str = "tenant:manage";

pub const ALL_PERMISSIONS: &[&str] = &[
    DOCUMENTS_WRITE,
    DOCUMENTS_APPROVE,
    QUALITY_WRITE,
    QUALITY_APPROVE,
    AUDITS_WRITE,
    TRAINING_MANAGE,
    USERS_MANAGE,
    TENANT_MANAGE,
];

/// Default grants per role. Explicit grants on the user add to these.
pub fn role_grants(role: UserRole, slug: &str) -> bool {
    match role {
        UserRole::Admin => true,
        UserRole::QaManager => matches!(
            slug,
            DOCUMENTS_WRITE | DOCUMENTS_APPROVE | QUALITY_WRITE | QUALITY_APPROVE | AUDITS_WRITE | TRAINING_MANAGE
        ),
        UserRole::Pharmacist => matches!(slug, DOCUMENTS_WRITE | QUALITY_WRITE | AUDITS_WRITE),
        UserRole::Technician => slug == QUALITY_WRITE,
        UserRole::Trainee => false,
    }
}

/// A permission, named by its slug.
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// Extractor guard: rejects with 403 unless the authenticated user holds `T`.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        let required_perm = T::slug();
        if !user.0.has_permission(required_perm) {
            return Err(AppError::Forbidden(format!(
                "You need the '{}' permission to perform this action.",
                required_perm
            )));
        }

        Ok(RequirePermission(PhantomData))
    }
}

pub struct PermDocumentsWrite;
impl PermissionDef for PermDocumentsWrite {
    fn slug() -> &'static str { DOCUMENTS_WRITE }
}

pub struct PermQualityWrite;
impl PermissionDef for PermQualityWrite {
    fn slug() -> &'static str { QUALITY_WRITE }
}

pub struct PermAuditsWrite;
impl PermissionDef for PermAuditsWrite {
    fn slug() -> &'static str { AUDITS_WRITE }
}

pub struct PermTrainingManage;
impl PermissionDef for PermTrainingManage {
    fn slug() -> &'static str { TRAINING_MANAGE }
}

pub struct PermUsersManage;
impl PermissionDef for PermUsersManage {
    fn slug() -> &'static str { USERS_MANAGE }
}

pub struct PermTenantManage;
impl PermissionDef for PermTenantManage {
    fn slug() -> &'static str { TENANT_MANAGE }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults() {
        assert!(role_grants(UserRole::Admin, TENANT_MANAGE));
        assert!(role_grants(UserRole::QaManager, DOCUMENTS_APPROVE));
        assert!(!role_grants(UserRole::QaManager, USERS_MANAGE));
        assert!(role_grants(UserRole::Pharmacist, QUALITY_WRITE));
        assert!(!role_grants(UserRole::Pharmacist, QUALITY_APPROVE));
        assert!(!role_grants(UserRole::Technician, DOCUMENTS_WRITE));
        assert!(!role_grants(UserRole::Trainee, QUALITY_WRITE));
    }

    #[test]
    fn admin_holds_every_known_slug() {
        assert!(ALL_PERMISSIONS.iter().all(|slug| role_grants(UserRole::Admin, slug)));
        assert!(!ALL_PERMISSIONS.iter().any(|slug| role_grants(UserRole::Trainee, slug)));
    }
}
