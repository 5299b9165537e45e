// src/handlers/capas.rs

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
        rbac::{PermQualityWrite, PermTenantManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        capas::{Capa, CapaFilter, CapaStatusPayload, CreateCapaPayload, EffectivenessCheckPayload, UpdateCapaPayload},
        workflow::{ModuleStats, StatusHistoryEntry},
    },
};

// GET /api/capas
#[utoipa::path(
    get,
    path = "/api/capas",
    tag = "CAPA",
    responses(
        (status = 200, description = "CAPAs", body = Vec<Capa>)
    ),
    params(
        CapaFilter,
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_capas(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<CapaFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let capas = app_state.capa_service.list(&mut tx, tenant.0, &filter).await?;
    tx.commit().await?;
    Ok(Json(capas))
}

// GET /api/capas/stats
#[utoipa::path(
    get,
    path = "/api/capas/stats",
    tag = "CAPA",
    responses(
        (status = 200, description = "Counts per status and per priority", body = ModuleStats)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn capa_stats(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let stats = app_state.capa_service.stats(&mut tx, tenant.0).await?;
    tx.commit().await?;
    Ok(Json(stats))
}

// GET /api/capas/{id}
#[utoipa::path(
    get,
    path = "/api/capas/{id}",
    tag = "CAPA",
    responses(
        (status = 200, description = "CAPA", body = Capa),
        (status = 404, description = "CAPA not found")
    ),
    params(
        ("id" = Uuid, Path, description = "CAPA id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_capa(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let capa = app_state.capa_service.get(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(capa))
}

// GET /api/capas/{id}/history
#[utoipa::path(
    get,
    path = "/api/capas/{id}/history",
    tag = "CAPA",
    responses(
        (status = 200, description = "Status history, oldest first", body = Vec<StatusHistoryEntry>)
    ),
    params(
        ("id" = Uuid, Path, description = "CAPA id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn capa_history(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let history = app_state.capa_service.history(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(history))
}

// POST /api/capas
#[utoipa::path(
    post,
    path = "/api/capas",
    tag = "CAPA",
    request_body = CreateCapaPayload,
    responses(
        (status = 201, description = "CAPA opened", body = Capa)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_capa(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermQualityWrite>,
    Json(payload): Json<CreateCapaPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let capa = app_state
        .capa_service
        .create(&mut tx, tenant.0, &user.0, payload)
        .await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(capa)))
}

// PUT /api/capas/{id}
#[utoipa::path(
    put,
    path = "/api/capas/{id}",
    tag = "CAPA",
    request_body = UpdateCapaPayload,
    responses(
        (status = 200, description = "CAPA updated", body = Capa),
        (status = 422, description = "Completed or cancelled CAPAs are read-only")
    ),
    params(
        ("id" = Uuid, Path, description = "CAPA id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_capa(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermQualityWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCapaPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let capa = app_state
        .capa_service
        .update(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(capa))
}

// PATCH /api/capas/{id}/status
#[utoipa::path(
    patch,
    path = "/api/capas/{id}/status",
    tag = "CAPA",
    request_body = CapaStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = Capa),
        (status = 422, description = "Transition not allowed")
    ),
    params(
        ("id" = Uuid, Path, description = "CAPA id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_capa_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermQualityWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CapaStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let capa = app_state
        .capa_service
        .change_status(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(capa))
}

// POST /api/capas/{id}/effectiveness
#[utoipa::path(
    post,
    path = "/api/capas/{id}/effectiveness",
    tag = "CAPA",
    request_body = EffectivenessCheckPayload,
    responses(
        (status = 200, description = "Effective: completed. Not effective: back to action_plan", body = Capa),
        (status = 422, description = "CAPA is not in effectiveness_check")
    ),
    params(
        ("id" = Uuid, Path, description = "CAPA id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_effectiveness(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermQualityWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EffectivenessCheckPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let capa = app_state
        .capa_service
        .record_effectiveness(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(capa))
}

// DELETE /api/capas/{id}
#[utoipa::path(
    delete,
    path = "/api/capas/{id}",
    tag = "CAPA",
    responses(
        (status = 204, description = "CAPA deleted"),
        (status = 404, description = "CAPA not found")
    ),
    params(
        ("id" = Uuid, Path, description = "CAPA id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_capa(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTenantManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    app_state.capa_service.delete(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
