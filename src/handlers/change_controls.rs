// src/handlers/change_controls.rs

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
        change_controls::{
            ChangeControl, ChangeControlFilter, ChangeControlStatusPayload, CreateChangeControlPayload,
            UpdateChangeControlPayload,
        },
        workflow::{ModuleStats, StatusHistoryEntry},
    },
};

// GET /api/change-controls
#[utoipa::path(
    get,
    path = "/api/change-controls",
    tag = "Change Control",
    responses(
        (status = 200, description = "Change controls", body = Vec<ChangeControl>)
    ),
    params(
        ChangeControlFilter,
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_change_controls(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<ChangeControlFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let change_controls = app_state.change_control_service.list(&mut tx, tenant.0, &filter).await?;
    tx.commit().await?;
    Ok(Json(change_controls))
}

// GET /api/change-controls/stats
#[utoipa::path(
    get,
    path = "/api/change-controls/stats",
    tag = "Change Control",
    responses(
        (status = 200, description = "Counts per status and per risk level", body = ModuleStats)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_control_stats(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let stats = app_state.change_control_service.stats(&mut tx, tenant.0).await?;
    tx.commit().await?;
    Ok(Json(stats))
}

// GET /api/change-controls/{id}
#[utoipa::path(
    get,
    path = "/api/change-controls/{id}",
    tag = "Change Control",
    responses(
        (status = 200, description = "Change control", body = ChangeControl),
        (status = 404, description = "Change control not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Change control id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_change_control(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let change_control = app_state.change_control_service.get(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(change_control))
}

// GET /api/change-controls/{id}/history
#[utoipa::path(
    get,
    path = "/api/change-controls/{id}/history",
    tag = "Change Control",
    responses(
        (status = 200, description = "Status history, oldest first", body = Vec<StatusHistoryEntry>)
    ),
    params(
        ("id" = Uuid, Path, description = "Change control id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_control_history(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let history = app_state.change_control_service.history(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(history))
}

// POST /api/change-controls
#[utoipa::path(
    post,
    path = "/api/change-controls",
    tag = "Change Control",
    request_body = CreateChangeControlPayload,
    responses(
        (status = 201, description = "Change control initiated", body = ChangeControl)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_change_control(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermQualityWrite>,
    Json(payload): Json<CreateChangeControlPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let change_control = app_state
        .change_control_service
        .create(&mut tx, tenant.0, &user.0, payload)
        .await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(change_control)))
}

// PUT /api/change-controls/{id}
#[utoipa::path(
    put,
    path = "/api/change-controls/{id}",
    tag = "Change Control",
    request_body = UpdateChangeControlPayload,
    responses(
        (status = 200, description = "Change control updated", body = ChangeControl),
        (status = 422, description = "Closed change controls are read-only")
    ),
    params(
        ("id" = Uuid, Path, description = "Change control id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_change_control(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermQualityWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateChangeControlPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let change_control = app_state
        .change_control_service
        .update(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(change_control))
}

// PATCH /api/change-controls/{id}/status
#[utoipa::path(
    patch,
    path = "/api/change-controls/{id}/status",
    tag = "Change Control",
    request_body = ChangeControlStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = ChangeControl),
        (status = 403, description = "Approving or rejecting needs quality:approve"),
        (status = 422, description = "Transition not allowed")
    ),
    params(
        ("id" = Uuid, Path, description = "Change control id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_change_control_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermQualityWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeControlStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let change_control = app_state
        .change_control_service
        .change_status(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(change_control))
}

// DELETE /api/change-controls/{id}
#[utoipa::path(
    delete,
    path = "/api/change-controls/{id}",
    tag = "Change Control",
    responses(
        (status = 204, description = "Change control deleted"),
        (status = 404, description = "Change control not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Change control id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_change_control(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTenantManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    app_state.change_control_service.delete(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
