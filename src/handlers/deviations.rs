// src/handlers/deviations.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
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
        capas::Capa,
        deviations::{
            CreateDeviationPayload, Deviation, DeviationFilter, DeviationStatusPayload, RaiseCapaPayload,
            UpdateDeviationPayload,
        },
        workflow::{ModuleStats, StatusHistoryEntry},
    },
};

// GET /api/deviations
#[utoipa::path(
    get,
    path = "/api/deviations",
    tag = "Deviations",
    responses(
        (status = 200, description = "Deviations", body = Vec<Deviation>)
    ),
    params(
        DeviationFilter,
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_deviations(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<DeviationFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let deviations = app_state.deviation_service.list(&mut tx, tenant.0, &filter).await?;
    tx.commit().await?;
    Ok(Json(deviations))
}

// GET /api/deviations/stats
#[utoipa::path(
    get,
    path = "/api/deviations/stats",
    tag = "Deviations",
    responses(
        (status = 200, description = "Counts per status and per severity", body = ModuleStats)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn deviation_stats(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let stats = app_state.deviation_service.stats(&mut tx, tenant.0).await?;
    tx.commit().await?;
    Ok(Json(stats))
}

// GET /api/deviations/{id}
#[utoipa::path(
    get,
    path = "/api/deviations/{id}",
    tag = "Deviations",
    responses(
        (status = 200, description = "Deviation", body = Deviation),
        (status = 404, description = "Deviation not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_deviation(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let deviation = app_state.deviation_service.get(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(deviation))
}

// GET /api/deviations/{id}/history
#[utoipa::path(
    get,
    path = "/api/deviations/{id}/history",
    tag = "Deviations",
    responses(
        (status = 200, description = "Status history, oldest first", body = Vec<StatusHistoryEntry>)
    ),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn deviation_history(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let history = app_state.deviation_service.history(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(history))
}

// POST /api/deviations
#[utoipa::path(
    post,
    path = "/api/deviations",
    tag = "Deviations",
    request_body = CreateDeviationPayload,
    responses(
        (status = 201, description = "Deviation opened", body = Deviation)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_deviation(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermQualityWrite>,
    Json(payload): Json<CreateDeviationPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let deviation = app_state
        .deviation_service
        .create(&mut tx, tenant.0, &user.0, payload)
        .await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(deviation)))
}

// PUT /api/deviations/{id}
#[utoipa::path(
    put,
    path = "/api/deviations/{id}",
    tag = "Deviations",
    request_body = UpdateDeviationPayload,
    responses(
        (status = 200, description = "Deviation updated", body = Deviation),
        (status = 422, description = "Closed or rejected deviations are read-only")
    ),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_deviation(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermQualityWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeviationPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let deviation = app_state
        .deviation_service
        .update(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(deviation))
}

// PATCH /api/deviations/{id}/status
#[utoipa::path(
    patch,
    path = "/api/deviations/{id}/status",
    tag = "Deviations",
    request_body = DeviationStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = Deviation),
        (status = 422, description = "Transition not allowed")
    ),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_deviation_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermQualityWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeviationStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let deviation = app_state
        .deviation_service
        .change_status(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(deviation))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviationCapaResponse {
    pub deviation: Deviation,
    pub capa: Capa,
}

// POST /api/deviations/{id}/capa
#[utoipa::path(
    post,
    path = "/api/deviations/{id}/capa",
    tag = "Deviations",
    request_body = RaiseCapaPayload,
    responses(
        (status = 201, description = "CAPA created, linked, deviation moved to capa_in_progress", body = DeviationCapaResponse),
        (status = 409, description = "A CAPA is already linked")
    ),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn raise_capa(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermQualityWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RaiseCapaPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let (deviation, capa) = app_state
        .deviation_service
        .raise_capa(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(DeviationCapaResponse { deviation, capa })))
}

// DELETE /api/deviations/{id}
#[utoipa::path(
    delete,
    path = "/api/deviations/{id}",
    tag = "Deviations",
    responses(
        (status = 204, description = "Deviation deleted"),
        (status = 404, description = "Deviation not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Deviation id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_deviation(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTenantManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    app_state.deviation_service.delete(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
