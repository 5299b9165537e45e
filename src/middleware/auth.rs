// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::{CurrentTenant, TenantContext},
    models::auth::User,
};

fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .ok_or(AppError::InvalidToken)
}

/// Authenticates the bearer token and checks it against `X-Tenant-ID`.
/// On success the request carries `AuthenticatedUser`, `TenantContext` and `CurrentTenant`.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let tenant_ctx = TenantContext::from_headers(request.headers())?;

    let (user, tenant) = app_state
        .auth_service
        .authenticate(&token, tenant_ctx.0)
        .await?;

    tracing::debug!(user_id = %user.id, tenant_id = %tenant.id, "request authenticated");

    let extensions = request.extensions_mut();
    extensions.insert(AuthenticatedUser(user));
    extensions.insert(tenant_ctx);
    extensions.insert(CurrentTenant(tenant));

    Ok(next.run(request).await)
}

/// The caller, as loaded by `tenant_guard`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}
