// src/handlers/documents.rs

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
        rbac::{PermDocumentsWrite, PermTenantManage, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        documents::{CreateDocumentPayload, Document, DocumentFilter, DocumentStatusPayload, UpdateDocumentPayload},
        workflow::{ModuleStats, StatusHistoryEntry},
    },
};

// GET /api/documents
#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "Documents",
    responses(
        (status = 200, description = "Documents", body = Vec<Document>)
    ),
    params(
        DocumentFilter,
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_documents(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<DocumentFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let documents = app_state.document_service.list(&mut tx, tenant.0, &filter).await?;
    tx.commit().await?;
    Ok(Json(documents))
}

// GET /api/documents/stats
#[utoipa::path(
    get,
    path = "/api/documents/stats",
    tag = "Documents",
    responses(
        (status = 200, description = "Counts per status and per type", body = ModuleStats)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn document_stats(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let stats = app_state.document_service.stats(&mut tx, tenant.0).await?;
    tx.commit().await?;
    Ok(Json(stats))
}

// GET /api/documents/{id}
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    tag = "Documents",
    responses(
        (status = 200, description = "Document", body = Document),
        (status = 404, description = "Document not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Document id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_document(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let document = app_state.document_service.get(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(document))
}

// GET /api/documents/{id}/history
#[utoipa::path(
    get,
    path = "/api/documents/{id}/history",
    tag = "Documents",
    responses(
        (status = 200, description = "Status history, oldest first", body = Vec<StatusHistoryEntry>)
    ),
    params(
        ("id" = Uuid, Path, description = "Document id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn document_history(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let history = app_state.document_service.history(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(history))
}

// POST /api/documents
#[utoipa::path(
    post,
    path = "/api/documents",
    tag = "Documents",
    request_body = CreateDocumentPayload,
    responses(
        (status = 201, description = "Document created as draft", body = Document)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_document(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermDocumentsWrite>,
    Json(payload): Json<CreateDocumentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let document = app_state
        .document_service
        .create(&mut tx, tenant.0, &user.0, payload)
        .await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(document)))
}

// PUT /api/documents/{id}
#[utoipa::path(
    put,
    path = "/api/documents/{id}",
    tag = "Documents",
    request_body = UpdateDocumentPayload,
    responses(
        (status = 200, description = "Document updated", body = Document),
        (status = 422, description = "Archived documents are read-only")
    ),
    params(
        ("id" = Uuid, Path, description = "Document id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_document(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermDocumentsWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let document = app_state
        .document_service
        .update(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(document))
}

// PATCH /api/documents/{id}/status
#[utoipa::path(
    patch,
    path = "/api/documents/{id}/status",
    tag = "Documents",
    request_body = DocumentStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = Document),
        (status = 403, description = "Approving needs documents:approve"),
        (status = 422, description = "Transition not allowed")
    ),
    params(
        ("id" = Uuid, Path, description = "Document id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_document_status(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermDocumentsWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DocumentStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let document = app_state
        .document_service
        .change_status(&mut tx, tenant.0, &user.0, id, payload)
        .await?;
    tx.commit().await?;
    Ok(Json(document))
}

// POST /api/documents/{id}/revise
#[utoipa::path(
    post,
    path = "/api/documents/{id}/revise",
    tag = "Documents",
    responses(
        (status = 200, description = "New major version opened as draft", body = Document),
        (status = 422, description = "Only approved documents can be revised")
    ),
    params(
        ("id" = Uuid, Path, description = "Document id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn revise_document(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermDocumentsWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let document = app_state.document_service.revise(&mut tx, tenant.0, &user.0, id).await?;
    tx.commit().await?;
    Ok(Json(document))
}

// DELETE /api/documents/{id}
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    tag = "Documents",
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Document not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Document id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_document(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTenantManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    app_state.document_service.delete(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
