// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tenancy::{Feature, Tenant},
};

pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// The tenant a request is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext(pub Uuid);

impl TenantContext {
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Result<Self, AppError> {
        let value = headers.get(TENANT_ID_HEADER).ok_or(AppError::TenantRequired)?;
        let value_str = value.to_str().map_err(|_| AppError::InvalidTenantHeader)?;
        let tenant_id = Uuid::parse_str(value_str.trim()).map_err(|_| AppError::InvalidTenantHeader)?;
        Ok(TenantContext(tenant_id))
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The guard has already verified it against the token when present.
        if let Some(ctx) = parts.extensions.get::<TenantContext>() {
            return Ok(*ctx);
        }
        TenantContext::from_headers(&parts.headers)
    }
}

/// The loaded tenant, placed in the extensions by `tenant_guard`.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Tenant);

impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentTenant>()
            .cloned()
            .ok_or(AppError::TenantRequired)
    }
}

/// Rejects requests to a module the tenant has switched off.
/// Must sit inside `tenant_guard`.
pub async fn require_feature(
    State(feature): State<Feature>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let tenant = request
        .extensions()
        .get::<CurrentTenant>()
        .ok_or(AppError::TenantRequired)?;

    if !feature.is_enabled(&tenant.0.features) {
        return Err(AppError::FeatureDisabled(feature.name()));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn header_is_required_and_must_be_a_uuid() {
        let mut headers = HeaderMap::new();
        assert!(matches!(TenantContext::from_headers(&headers), Err(AppError::TenantRequired)));

        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(
            TenantContext::from_headers(&headers),
            Err(AppError::InvalidTenantHeader)
        ));

        let id = Uuid::new_v4();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(TenantContext::from_headers(&headers).unwrap(), TenantContext(id));
    }
}
