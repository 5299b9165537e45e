// src/handlers/trainings.rs

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
        rbac::{PermTrainingManage, RequirePermission, TRAINING_MANAGE},
        tenancy::TenantContext,
    },
    models::{
        training::{
            CreateTrainingPayload, ExamDetail, ExamInput, ExamView, Training, TrainingDetail, TrainingFilter,
            TrainingStatusPayload, UpdateTrainingPayload,
        },
        workflow::{ModuleStats, StatusHistoryEntry},
    },
};

// GET /api/trainings
#[utoipa::path(
    get,
    path = "/api/trainings",
    tag = "Training",
    responses(
        (status = 200, description = "Trainings", body = Vec<Training>)
    ),
    params(
        TrainingFilter,
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_trainings(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<TrainingFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let trainings = app_state.training_service.list(&mut tx, tenant.0, &filter).await?;
    tx.commit().await?;
    Ok(Json(trainings))
}

// GET /api/trainings/stats
#[utoipa::path(
    get,
    path = "/api/trainings/stats",
    tag = "Training",
    responses(
        (status = 200, description = "Counts per status", body = ModuleStats)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn training_stats(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let stats = app_state.training_service.stats(&mut tx, tenant.0).await?;
    tx.commit().await?;
    Ok(Json(stats))
}

// GET /api/trainings/{id}
#[utoipa::path(
    get,
    path = "/api/trainings/{id}",
    tag = "Training",
    responses(
        (status = 200, description = "Training with contents and exam. Answers only for training managers", body = TrainingDetail),
        (status = 404, description = "Training not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Training id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_training(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let with_answers = user.0.has_permission(TRAINING_MANAGE);

    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let detail = app_state
        .training_service
        .get_detail(&mut tx, tenant.0, id, with_answers)
        .await?;
    tx.commit().await?;
    Ok(Json(detail))
}

// GET /api/trainings/{id}/history
#[utoipa::path(
    get,
    path = "/api/trainings/{id}/history",
    tag = "Training",
    responses(
        (status = 200, description = "Status history, oldest first", body = Vec<StatusHistoryEntry>)
    ),
    params(
        ("id" = Uuid, Path, description = "Training id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn training_history(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let history = app_state.training_service.history(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(history))
}

// POST /api/trainings
#[utoipa::path(
    post,
    path = "/api/trainings",
    tag = "Training",
    request_body = CreateTrainingPayload,
    responses(
        (status = 201, description = "Training created as draft", body = TrainingDetail)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_training(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTrainingManage>,
    Json(payload): Json<CreateTrainingPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let detail = app_state
        .training_service
        .create(&mut tx, tenant.0, &user.0, payload)
        .await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

// PUT /api/trainings/{id}
#[utoipa::path(
    put,
    path = "/api/trainings/{id}",
    tag = "Training",
    request_body = UpdateTrainingPayload,
    responses(
        (status = 200, description = "Training updated", body = TrainingDetail),
        (status = 409, description = "Contents cannot be replaced once assigned")
    ),
    params(
        ("id" = Uuid, Path, description = "Training id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_training(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTrainingManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTrainingPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let detail = app_state
        .training_service
        .update(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(detail))
}

// PATCH /api/trainings/{id}/status
#[utoipa::path(
    patch,
    path = "/api/trainings/{id}/status",
    tag = "Training",
    request_body = TrainingStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = Training),
        (status = 422, description = "Transition not allowed or training has no content")
    ),
    params(
        ("id" = Uuid, Path, description = "Training id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_training_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTrainingManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TrainingStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let training = app_state
        .training_service
        .change_status(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(training))
}

// PUT /api/trainings/{id}/exam
#[utoipa::path(
    put,
    path = "/api/trainings/{id}/exam",
    tag = "Training",
    request_body = ExamInput,
    responses(
        (status = 200, description = "Exam replaced", body = ExamDetail),
        (status = 409, description = "Training already has assignments")
    ),
    params(
        ("id" = Uuid, Path, description = "Training id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_training_exam(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTrainingManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExamInput>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let exam = app_state.training_service.set_exam(&mut tx, tenant.0, id, payload).await?;
    tx.commit().await?;
    Ok(Json(exam))
}

// DELETE /api/trainings/{id}/exam
#[utoipa::path(
    delete,
    path = "/api/trainings/{id}/exam",
    tag = "Training",
    responses(
        (status = 204, description = "Exam removed"),
        (status = 404, description = "Training has no exam")
    ),
    params(
        ("id" = Uuid, Path, description = "Training id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_training_exam(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTrainingManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    app_state.training_service.remove_exam(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/trainings/{id}
#[utoipa::path(
    delete,
    path = "/api/trainings/{id}",
    tag = "Training",
    responses(
        (status = 204, description = "Training deleted"),
        (status = 409, description = "Training has assignments; archive it instead")
    ),
    params(
        ("id" = Uuid, Path, description = "Training id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_training(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTrainingManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    app_state.training_service.delete(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/exams/{training_id}
#[utoipa::path(
    get,
    path = "/api/exams/{training_id}",
    tag = "Training",
    responses(
        (status = 200, description = "The exam without its answers", body = ExamView),
        (status = 404, description = "Training has no exam")
    ),
    params(
        ("training_id" = Uuid, Path, description = "Training id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_exam(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(training_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let exam = app_state.training_service.exam_view(&mut tx, tenant.0, training_id).await?;
    tx.commit().await?;
    Ok(Json(exam))
}
