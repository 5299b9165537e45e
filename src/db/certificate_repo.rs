// src/db/certificate_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::certificates::Certificate};

// Certificates are always read with the training title and holder name.
const SELECT_JOINED: &str = r#"
    SELECT c.*,
           t.title AS training_title,
           u.first_name || ' ' || u.last_name AS holder_name
    FROM certificates c
    JOIN trainings t ON t.id = c.training_id
    JOIN users u ON u.id = c.user_id
"#;

#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub certificate_number: String,
    pub user_id: Uuid,
    pub training_id: Uuid,
    pub assignment_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub issued_by: Option<Uuid>,
    pub score: Option<Decimal>,
}

#[derive(Clone, Default)]
pub struct CertificateRepository;

impl CertificateRepository {
    pub fn new() -> Self {
        Self
    }

    /// `expires_before`/`expired_at` narrow to certificates expiring in
    /// `[now, expires_before)` or already past `expired_at`.
    #[allow(clippy::too_many_arguments)]
    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
        training_id: Option<Uuid>,
        now: DateTime<Utc>,
        expires_before: Option<DateTime<Utc>>,
        expired_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Certificate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"{SELECT_JOINED}
            WHERE c.tenant_id = $1
              AND ($2::uuid IS NULL OR c.user_id = $2)
              AND ($3::uuid IS NULL OR c.training_id = $3)
              AND ($5::timestamptz IS NULL
                   OR (NOT c.revoked AND c.expires_at >= $4 AND c.expires_at < $5))
              AND (NOT $6 OR c.expires_at < $4)
            ORDER BY c.issued_at DESC
            LIMIT $7 OFFSET $8
            "#
        );
        let certificates = sqlx::query_as::<_, Certificate>(&sql)
            .bind(tenant_id)
            .bind(user_id)
            .bind(training_id)
            .bind(now)
            .bind(expires_before)
            .bind(expired_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await?;
        Ok(certificates)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Certificate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{SELECT_JOINED} WHERE c.tenant_id = $1 AND c.id = $2");
        let certificate = sqlx::query_as::<_, Certificate>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(certificate)
    }

    pub async fn find_by_assignment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Option<Certificate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{SELECT_JOINED} WHERE c.tenant_id = $1 AND c.assignment_id = $2");
        let certificate = sqlx::query_as::<_, Certificate>(&sql)
            .bind(tenant_id)
            .bind(assignment_id)
            .fetch_optional(executor)
            .await?;
        Ok(certificate)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        new_certificate: &NewCertificate,
    ) -> Result<Certificate, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let certificate = sqlx::query_as::<_, Certificate>(
            r#"
            WITH inserted AS (
                INSERT INTO certificates (
                    tenant_id, certificate_number, user_id, training_id, assignment_id,
                    issued_at, expires_at, issued_by, score
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
            )
            SELECT c.*,
                   t.title AS training_title,
                   u.first_name || ' ' || u.last_name AS holder_name
            FROM inserted c
            JOIN trainings t ON t.id = c.training_id
            JOIN users u ON u.id = c.user_id
            "#,
        )
        .bind(tenant_id)
        .bind(&new_certificate.certificate_number)
        .bind(new_certificate.user_id)
        .bind(new_certificate.training_id)
        .bind(new_certificate.assignment_id)
        .bind(new_certificate.issued_at)
        .bind(new_certificate.expires_at)
        .bind(new_certificate.issued_by)
        .bind(new_certificate.score)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::Conflict("A certificate was already issued for this assignment.".into());
                }
            }
            AppError::DatabaseError(e)
        })?;
        Ok(certificate)
    }

    pub async fn revoke<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE certificates SET revoked = TRUE, revoked_at = NOW() WHERE tenant_id = $1 AND id = $2 AND NOT revoked",
        )
        .bind(tenant_id)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Unrevoked certificates expiring in `[from, to)`.
    pub async fn expiring_between<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Certificate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{SELECT_JOINED} WHERE c.tenant_id = $1 AND NOT c.revoked AND c.expires_at >= $2 AND c.expires_at < $3"
        );
        let certificates = sqlx::query_as::<_, Certificate>(&sql)
            .bind(tenant_id)
            .bind(from)
            .bind(to)
            .fetch_all(executor)
            .await?;
        Ok(certificates)
    }
}
