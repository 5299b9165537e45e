// src/handlers/tenancy.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermTenantManage, RequirePermission},
        tenancy::{CurrentTenant, TenantContext},
    },
    models::tenancy::{CreateTenantPayload, OnboardingResponse, Tenant, TenantPublicInfo, UpdateTenantPayload},
};

// POST /api/tenants
#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Tenant and first admin created", body = OnboardingResponse),
        (status = 409, description = "Subdomain already taken")
    )
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    let response = app_state.tenant_service.onboard(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// GET /api/tenants/lookup/{subdomain}
#[utoipa::path(
    get,
    path = "/api/tenants/lookup/{subdomain}",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Public tenant info for the login screen", body = TenantPublicInfo),
        (status = 404, description = "Unknown or inactive tenant")
    ),
    params(
        ("subdomain" = String, Path, description = "Tenant subdomain")
    )
)]
pub async fn lookup_tenant(
    State(app_state): State<AppState>,
    Path(subdomain): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let info = app_state.tenant_service.lookup(&subdomain).await?;
    Ok(Json(info))
}

// GET /api/tenant
#[utoipa::path(
    get,
    path = "/api/tenant",
    tag = "Tenancy",
    responses(
        (status = 200, description = "The current tenant", body = Tenant)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_current_tenant(tenant: CurrentTenant) -> Result<impl IntoResponse, AppError> {
    Ok(Json(tenant.0))
}

// PUT /api/tenant
#[utoipa::path(
    put,
    path = "/api/tenant",
    tag = "Tenancy",
    request_body = UpdateTenantPayload,
    responses(
        (status = 200, description = "Tenant updated", body = Tenant),
        (status = 403, description = "Missing tenant:manage")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_current_tenant(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTenantManage>,
    Json(payload): Json<UpdateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let updated = app_state.tenant_service.update(&mut tx, tenant.0, payload).await?;
    tx.commit().await?;
    Ok(Json(updated))
}
