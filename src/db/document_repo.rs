// src/db/document_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::scoped,
    models::{
        documents::{CreateDocumentPayload, Document, DocumentFilter, DocumentStatus, UpdateDocumentPayload},
        workflow::CountEntry,
    },
};

const TABLE: &str = "documents";

#[derive(Clone, Default)]
pub struct DocumentRepository;

impl DocumentRepository {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &DocumentFilter,
        search: Option<String>,
        review_cutoff: Option<NaiveDate>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM documents
            WHERE tenant_id = $1
              AND ($2::document_status IS NULL OR status = $2)
              AND ($3::document_type IS NULL OR document_type = $3)
              AND ($4::text IS NULL
                   OR title ILIKE '%' || $4 || '%'
                   OR document_number ILIKE '%' || $4 || '%')
              AND ($5::date IS NULL OR (status = 'approved' AND review_date <= $5))
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(tenant_id)
        .bind(filter.status)
        .bind(filter.document_type)
        .bind(search)
        .bind(review_cutoff)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(documents)
    }

    /// `for_update` takes a row lock so status changes serialise.
    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        for_update: bool,
    ) -> Result<Option<Document>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if for_update {
            "SELECT * FROM documents WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        } else {
            "SELECT * FROM documents WHERE tenant_id = $1 AND id = $2"
        };
        let document = sqlx::query_as::<_, Document>(sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(document)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        document_number: &str,
        payload: &CreateDocumentPayload,
        version: &str,
        user_id: Uuid,
    ) -> Result<Document, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (
                tenant_id, document_number, title, description, document_type, version,
                department, file_url, tags, effective_date, review_date, created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(document_number)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.document_type)
        .bind(version)
        .bind(&payload.department)
        .bind(&payload.file_url)
        .bind(&payload.tags)
        .bind(payload.effective_date)
        .bind(payload.review_date)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(document)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &UpdateDocumentPayload,
        user_id: Uuid,
    ) -> Result<Document, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                document_type = COALESCE($5, document_type),
                version = COALESCE($6, version),
                department = COALESCE($7, department),
                file_url = COALESCE($8, file_url),
                tags = COALESCE($9, tags),
                effective_date = COALESCE($10, effective_date),
                review_date = COALESCE($11, review_date),
                updated_by = $12,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.document_type)
        .bind(&payload.version)
        .bind(&payload.department)
        .bind(&payload.file_url)
        .bind(&payload.tags)
        .bind(payload.effective_date)
        .bind(payload.review_date)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(document)
    }

    /// Approval stamps `approved_by`/`approved_at`; other moves leave them.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: DocumentStatus,
        user_id: Uuid,
    ) -> Result<Document, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let approving = status == DocumentStatus::Approved;
        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents SET
                status = $3,
                approved_by = CASE WHEN $4 THEN $5 ELSE approved_by END,
                approved_at = CASE WHEN $4 THEN NOW() ELSE approved_at END,
                updated_by = $5,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .bind(approving)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(document)
    }

    pub async fn revise<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        version: &str,
        user_id: Uuid,
    ) -> Result<Document, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents SET
                status = 'draft',
                version = $3,
                approved_by = NULL,
                approved_at = NULL,
                updated_by = $4,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(version)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(document)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        scoped::delete_by_id(executor, TABLE, tenant_id, id).await
    }

    pub async fn count_by_status<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<CountEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        scoped::count_by(executor, TABLE, "status", tenant_id).await
    }

    pub async fn count_by_type<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<CountEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        scoped::count_by(executor, TABLE, "document_type", tenant_id).await
    }
}
