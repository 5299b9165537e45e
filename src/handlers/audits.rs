// src/handlers/audits.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermAuditsWrite, PermTenantManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        audits::{Audit, AuditFilter, AuditFindingsPayload, AuditStatusPayload, CreateAuditPayload, UpdateAuditPayload},
        workflow::{ModuleStats, StatusHistoryEntry},
    },
};

// GET /api/audits
#[utoipa::path(
    get,
    path = "/api/audits",
    tag = "Audits",
    responses(
        (status = 200, description = "Audits", body = Vec<Audit>)
    ),
    params(
        AuditFilter,
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_audits(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<AuditFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let audits = app_state.audit_service.list(&mut tx, tenant.0, &filter).await?;
    tx.commit().await?;
    Ok(Json(audits))
}

// GET /api/audits/stats
#[utoipa::path(
    get,
    path = "/api/audits/stats",
    tag = "Audits",
    responses(
        (status = 200, description = "Counts per status and per audit type", body = ModuleStats)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn audit_stats(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let stats = app_state.audit_service.stats(&mut tx, tenant.0).await?;
    tx.commit().await?;
    Ok(Json(stats))
}

// GET /api/audits/{id}
#[utoipa::path(
    get,
    path = "/api/audits/{id}",
    tag = "Audits",
    responses(
        (status = 200, description = "Audit", body = Audit),
        (status = 404, description = "Audit not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Audit id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_audit(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let audit = app_state.audit_service.get(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(audit))
}

// GET /api/audits/{id}/history
#[utoipa::path(
    get,
    path = "/api/audits/{id}/history",
    tag = "Audits",
    responses(
        (status = 200, description = "Status history, oldest first", body = Vec<StatusHistoryEntry>)
    ),
    params(
        ("id" = Uuid, Path, description = "Audit id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn audit_history(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let history = app_state.audit_service.history(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(history))
}

// POST /api/audits
#[utoipa::path(
    post,
    path = "/api/audits",
    tag = "Audits",
    request_body = CreateAuditPayload,
    responses(
        (status = 201, description = "Audit planned", body = Audit)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_audit(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAuditsWrite>,
    Json(payload): Json<CreateAuditPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let audit = app_state
        .audit_service
        .create(&mut tx, tenant.0, &user.0, payload)
        .await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(audit)))
}

// PUT /api/audits/{id}
#[utoipa::path(
    put,
    path = "/api/audits/{id}",
    tag = "Audits",
    request_body = UpdateAuditPayload,
    responses(
        (status = 200, description = "Audit updated", body = Audit),
        (status = 422, description = "Closed audits are read-only")
    ),
    params(
        ("id" = Uuid, Path, description = "Audit id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_audit(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAuditsWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAuditPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let audit = app_state
        .audit_service
        .update(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(audit))
}

// PATCH /api/audits/{id}/status
#[utoipa::path(
    patch,
    path = "/api/audits/{id}/status",
    tag = "Audits",
    request_body = AuditStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = Audit),
        (status = 422, description = "Transition not allowed")
    ),
    params(
        ("id" = Uuid, Path, description = "Audit id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_audit_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAuditsWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AuditStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let audit = app_state
        .audit_service
        .change_status(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(audit))
}

// PUT /api/audits/{id}/findings
#[utoipa::path(
    put,
    path = "/api/audits/{id}/findings",
    tag = "Audits",
    request_body = AuditFindingsPayload,
    responses(
        (status = 200, description = "Findings replaced", body = Audit),
        (status = 422, description = "Findings are locked once the audit is completed")
    ),
    params(
        ("id" = Uuid, Path, description = "Audit id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_audit_findings(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAuditsWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AuditFindingsPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let audit = app_state
        .audit_service
        .set_findings(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(audit))
}

// DELETE /api/audits/{id}
#[utoipa::path(
    delete,
    path = "/api/audits/{id}",
    tag = "Audits",
    responses(
        (status = 204, description = "Audit deleted"),
        (status = 404, description = "Audit not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Audit id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_audit(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTenantManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    app_state.audit_service.delete(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
