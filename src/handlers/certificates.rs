// src/handlers/certificates.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
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
        tenancy::{CurrentTenant, TenantContext},
    },
    models::certificates::{CertificateFilter, CertificateView, IssueCertificatePayload},
};

// GET /api/certificates
#[utoipa::path(
    get,
    path = "/api/certificates",
    tag = "Certificates",
    responses(
        (status = 200, description = "Certificates. Without training:manage only the caller's own", body = Vec<CertificateView>)
    ),
    params(
        CertificateFilter,
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_certificates(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Query(filter): Query<CertificateFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let certificates = app_state
        .certificate_service
        .list(&mut tx, tenant.0, &user.0, &filter)
        .await?;
    tx.commit().await?;
    Ok(Json(certificates))
}

// GET /api/certificates/{id}
#[utoipa::path(
    get,
    path = "/api/certificates/{id}",
    tag = "Certificates",
    responses(
        (status = 200, description = "Certificate", body = CertificateView),
        (status = 404, description = "Certificate not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Certificate id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_certificate(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let certificate = app_state.certificate_service.get(&mut tx, tenant.0, &user.0, id).await?;
    tx.commit().await?;
    Ok(Json(certificate))
}

// POST /api/certificates
#[utoipa::path(
    post,
    path = "/api/certificates",
    tag = "Certificates",
    request_body = IssueCertificatePayload,
    responses(
        (status = 201, description = "Certificate issued", body = CertificateView),
        (status = 409, description = "Assignment already holds a certificate"),
        (status = 422, description = "Assignment content is not completed")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn issue_certificate(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTrainingManage>,
    Json(payload): Json<IssueCertificatePayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let certificate = app_state
        .certificate_service
        .issue_manual(&mut tx, tenant.0, &user.0, payload)
        .await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(certificate)))
}

// POST /api/certificates/{id}/revoke
#[utoipa::path(
    post,
    path = "/api/certificates/{id}/revoke",
    tag = "Certificates",
    responses(
        (status = 200, description = "Certificate revoked", body = CertificateView),
        (status = 409, description = "Already revoked")
    ),
    params(
        ("id" = Uuid, Path, description = "Certificate id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn revoke_certificate(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermTrainingManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let certificate = app_state.certificate_service.revoke(&mut tx, tenant.0, id).await?;
    tx.commit().await?;
    Ok(Json(certificate))
}

// GET /api/certificates/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/certificates/{id}/pdf",
    tag = "Certificates",
    responses(
        (status = 200, description = "Printable certificate", content_type = "application/pdf"),
        (status = 500, description = "Fonts missing on the server")
    ),
    params(
        ("id" = Uuid, Path, description = "Certificate id"),
        ("x-tenant-id" = Uuid, Header, description = "Tenant id")
    ),
    security(("api_jwt" = []))
)]
pub async fn certificate_pdf(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    current: CurrentTenant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = begin_tenant_tx(&app_state, &tenant, &user).await?;
    let (file_name, bytes) = app_state
        .certificate_service
        .pdf(&mut tx, &current.0, &user.0, id)
        .await?;
    tx.commit().await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("inline; filename=\"{}\"", file_name)),
        ],
        bytes,
    ))
}
