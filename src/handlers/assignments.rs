// src/handlers/assignments.rs

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
        rbac::{PermTrainingManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::training::{
        AssignTrainingPayload, AssignmentDetail, AssignmentFilter, AssignmentListItem, ExamSubmissionResult,
        ProgressPayload, SubmitExamPayload, TrainingAssignment,
    },
};

// POST /api/training-assignments
#[utoipa::path(
    post,
    path = "/api/training-assignments",
    tag = "Training Assignments",
    request_body = AssignTrainingPayload,
    responses(
        (status = 201, description = "Assignments created; users with an open assignment are skipped", body = Vec<TrainingAssignment>),
        (status = 422, description = "Training is not published")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_training(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTrainingManage>,
    Json(payload): Json<AssignTrainingPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let created = app_state
        .assignment_service
        .assign(&mut tx, tenant.0, &user.0, payload)
        .await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/training-assignments
#[utoipa::path(
    get,
    path = "/api/training-assignments",
    tag = "Training Assignments",
    responses(
        (status = 200, description = "Assignments. Without training:manage only the caller's own", body = Vec<AssignmentListItem>)
    ),
    params(
        AssignmentFilter,
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_assignments(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<AssignmentFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let assignments = app_state
        .assignment_service
        .list(&mut tx, tenant.0, &user.0, &filter)
        .await?;
    tx.commit().await?;
    Ok(Json(assignments))
}

// GET /api/training-assignments/mine
#[utoipa::path(
    get,
    path = "/api/training-assignments/mine",
    tag = "Training Assignments",
    responses(
        (status = 200, description = "The caller's assignments", body = Vec<AssignmentListItem>)
    ),
    params(
        AssignmentFilter,
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn my_assignments(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<AssignmentFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let assignments = app_state
        .assignment_service
        .mine(&mut tx, tenant.0, &user.0, &filter)
        .await?;
    tx.commit().await?;
    Ok(Json(assignments))
}

// GET /api/training-assignments/{id}
#[utoipa::path(
    get,
    path = "/api/training-assignments/{id}",
    tag = "Training Assignments",
    responses(
        (status = 200, description = "Assignment with per-content progress and exam attempts", body = AssignmentDetail),
        (status = 404, description = "Assignment not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Assignment id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_assignment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let detail = app_state.assignment_service.detail(&mut tx, tenant.0, &user.0, id).await?;
    tx.commit().await?;
    Ok(Json(detail))
}

// POST /api/training-assignments/{id}/progress
#[utoipa::path(
    post,
    path = "/api/training-assignments/{id}/progress",
    tag = "Training Assignments",
    request_body = ProgressPayload,
    responses(
        (status = 200, description = "Progress recorded", body = AssignmentDetail),
        (status = 403, description = "Not the assignee"),
        (status = 422, description = "Previous content not completed")
    ),
    params(
        ("id" = Uuid, Path, description = "Assignment id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_progress(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProgressPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let detail = app_state
        .assignment_service
        .record_progress(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(detail))
}

// POST /api/training-assignments/{id}/contents/{content_id}/complete
#[utoipa::path(
    post,
    path = "/api/training-assignments/{id}/contents/{content_id}/complete",
    tag = "Training Assignments",
    responses(
        (status = 200, description = "Content completed", body = AssignmentDetail),
        (status = 422, description = "Gating or minimum engagement not satisfied")
    ),
    params(
        ("id" = Uuid, Path, description = "Assignment id"),
        ("content_id" = Uuid, Path, description = "Content id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_content(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path((id, content_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let detail = app_state
        .assignment_service
        .complete_content(&mut tx, tenant.0, &user.0, id, content_id)
        .await?;
    tx.commit().await?;
    Ok(Json(detail))
}

// POST /api/training-assignments/{id}/exam
#[utoipa::path(
    post,
    path = "/api/training-assignments/{id}/exam",
    tag = "Training Assignments",
    request_body = SubmitExamPayload,
    responses(
        (status = 200, description = "Attempt scored", body = ExamSubmissionResult),
        (status = 422, description = "Content incomplete or no attempts left")
    ),
    params(
        ("id" = Uuid, Path, description = "Assignment id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_exam(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitExamPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let result = app_state
        .assignment_service
        .submit_exam(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(result))
}
