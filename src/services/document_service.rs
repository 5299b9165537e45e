// src/services/document_service.rs

use chrono::{Duration, Utc};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        numbering::{next_number, DOCUMENT_PREFIX},
        pagination,
    },
    db::{
        history_repo::{StatusChange, ENTITY_DOCUMENT},
        DocumentRepository, HistoryRepository,
    },
    middleware::rbac::DOCUMENTS_APPROVE,
    models::{
        auth::User,
        documents::{
            next_major_version, CreateDocumentPayload, Document, DocumentFilter, DocumentStatus,
            DocumentStatusPayload, UpdateDocumentPayload,
        },
        workflow::{ModuleStats, StatusHistoryEntry, WorkflowStatus},
    },
};

/// Approved documents with a review date inside this window are due.
pub const REVIEW_WINDOW_DAYS: i64 = 30;

#[derive(Clone)]
pub struct DocumentService {
    document_repo: DocumentRepository,
    history_repo: HistoryRepository,
}

impl DocumentService {
    pub fn new(document_repo: DocumentRepository, history_repo: HistoryRepository) -> Self {
        Self { document_repo, history_repo }
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        filter: &DocumentFilter,
    ) -> Result<Vec<Document>, AppError> {
        let (limit, offset) = pagination::page(filter.limit, filter.offset);
        let review_cutoff = filter
            .due_for_review
            .unwrap_or(false)
            .then(|| Utc::now().date_naive() + Duration::days(REVIEW_WINDOW_DAYS));

        self.document_repo
            .list(
                &mut *conn,
                tenant_id,
                filter,
                pagination::search_term(&filter.search),
                review_cutoff,
                limit,
                offset,
            )
            .await
    }

    pub async fn stats(&self, conn: &mut PgConnection, tenant_id: Uuid) -> Result<ModuleStats, AppError> {
        let by_status = self.document_repo.count_by_status(&mut *conn, tenant_id).await?;
        let by_type = self.document_repo.count_by_type(&mut *conn, tenant_id).await?;
        Ok(ModuleStats::new(by_status, by_type))
    }

    pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<Document, AppError> {
        self.find(conn, tenant_id, id, false).await
    }

    pub async fn history(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, AppError> {
        self.find(conn, tenant_id, id, false).await?;
        self.history_repo.list(&mut *conn, tenant_id, ENTITY_DOCUMENT, id).await
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        payload: CreateDocumentPayload,
    ) -> Result<Document, AppError> {
        payload.validate()?;

        let number = next_number(&mut *conn, tenant_id, DOCUMENT_PREFIX).await?;
        let version = payload.version.clone().unwrap_or_else(|| "1.0".to_string());
        let document = self
            .document_repo
            .create(&mut *conn, tenant_id, &number, &payload, &version, user.id)
            .await?;

        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_DOCUMENT,
                    entity_id: document.id,
                    from_status: None,
                    to_status: document.status.as_str(),
                    comment: None,
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(document = %document.document_number, tenant_id = %tenant_id, "document created");
        Ok(document)
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: UpdateDocumentPayload,
    ) -> Result<Document, AppError> {
        payload.validate()?;

        let current = self.find(conn, tenant_id, id, true).await?;
        if current.status == DocumentStatus::Archived {
            return Err(AppError::BusinessRule("Archived documents cannot be edited.".into()));
        }

        self.document_repo.update(&mut *conn, tenant_id, id, &payload, user.id).await
    }

    pub async fn change_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: DocumentStatusPayload,
    ) -> Result<Document, AppError> {
        let current = self.find(conn, tenant_id, id, true).await?;
        current.status.ensure_transition(payload.status)?;

        if payload.status == DocumentStatus::Approved && !user.has_permission(DOCUMENTS_APPROVE) {
            return Err(AppError::Forbidden(format!(
                "You need the '{}' permission to approve documents.",
                DOCUMENTS_APPROVE
            )));
        }

        let document = self
            .document_repo
            .set_status(&mut *conn, tenant_id, id, payload.status, user.id)
            .await?;

        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_DOCUMENT,
                    entity_id: id,
                    from_status: Some(current.status.as_str()),
                    to_status: document.status.as_str(),
                    comment: payload.comment.as_deref(),
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(
            document = %document.document_number,
            from = current.status.as_str(),
            to = document.status.as_str(),
            "document status changed"
        );
        Ok(document)
    }

    /// Starts a new major revision of an approved document.
    pub async fn revise(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
    ) -> Result<Document, AppError> {
        let current = self.find(conn, tenant_id, id, true).await?;
        if current.status != DocumentStatus::Approved {
            return Err(AppError::BusinessRule("Only approved documents can be revised.".into()));
        }

        let version = next_major_version(&current.version)?;
        let document = self
            .document_repo
            .revise(&mut *conn, tenant_id, id, &version, user.id)
            .await?;

        let comment = format!("Revision {} started", version);
        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_DOCUMENT,
                    entity_id: id,
                    from_status: Some(current.status.as_str()),
                    to_status: document.status.as_str(),
                    comment: Some(&comment),
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(document = %document.document_number, version = %version, "document revised");
        Ok(document)
    }

    pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.document_repo.delete(&mut *conn, tenant_id, id).await? {
            return Err(AppError::not_found("Document"));
        }
        Ok(())
    }

    async fn find(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid, for_update: bool) -> Result<Document, AppError> {
        self.document_repo
            .find_by_id(&mut *conn, tenant_id, id, for_update)
            .await?
            .ok_or_else(|| AppError::not_found("Document"))
    }
}
