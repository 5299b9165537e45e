// src/db/assignment_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::training::{AssignmentListItem, AssignmentStatus, ContentProgress, ExamAttempt, TrainingAssignment},
};

const LIST_SELECT: &str = r#"
    SELECT a.*,
           t.title AS training_title,
           u.first_name || ' ' || u.last_name AS user_name,
           (a.status IN ('assigned', 'in_progress', 'content_completed')
            AND a.due_date IS NOT NULL AND a.due_date < CURRENT_DATE) AS is_overdue
    FROM training_assignments a
    JOIN trainings t ON t.id = a.training_id
    JOIN users u ON u.id = a.user_id
"#;

/// An open assignment whose due date is close, for reminder sweeps.
#[derive(Debug, Clone, FromRow)]
pub struct DueAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub training_title: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub assignment_id: Uuid,
    pub attempt_number: i32,
    pub score: i32,
    pub max_score: i32,
    pub percentage: Decimal,
    pub passed: bool,
    pub answers: Vec<Vec<i32>>,
}

#[derive(Clone, Default)]
pub struct AssignmentRepository;

impl AssignmentRepository {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
        training_id: Option<Uuid>,
        status: Option<AssignmentStatus>,
        overdue_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AssignmentListItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"{LIST_SELECT}
            WHERE a.tenant_id = $1
              AND ($2::uuid IS NULL OR a.user_id = $2)
              AND ($3::uuid IS NULL OR a.training_id = $3)
              AND ($4::assignment_status IS NULL OR a.status = $4)
              AND (NOT $5 OR (a.status IN ('assigned', 'in_progress', 'content_completed')
                              AND a.due_date < CURRENT_DATE))
            ORDER BY a.due_date ASC NULLS LAST, a.created_at DESC
            LIMIT $6 OFFSET $7
            "#
        );
        let items = sqlx::query_as::<_, AssignmentListItem>(&sql)
            .bind(tenant_id)
            .bind(user_id)
            .bind(training_id)
            .bind(status)
            .bind(overdue_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        for_update: bool,
    ) -> Result<Option<TrainingAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if for_update {
            "SELECT * FROM training_assignments WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        } else {
            "SELECT * FROM training_assignments WHERE tenant_id = $1 AND id = $2"
        };
        let assignment = sqlx::query_as::<_, TrainingAssignment>(sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(assignment)
    }

    /// Users among `user_ids` already holding an open assignment of the training.
    pub async fn users_with_open_assignment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        training_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT user_id FROM training_assignments
            WHERE tenant_id = $1 AND training_id = $2 AND user_id = ANY($3)
              AND status IN ('assigned', 'in_progress', 'content_completed')
            "#,
        )
        .bind(tenant_id)
        .bind(training_id)
        .bind(user_ids)
        .fetch_all(executor)
        .await?;
        Ok(users)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        training_id: Uuid,
        user_id: Uuid,
        due_date: Option<NaiveDate>,
        assigned_by: Uuid,
    ) -> Result<TrainingAssignment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignment = sqlx::query_as::<_, TrainingAssignment>(
            r#"
            INSERT INTO training_assignments (tenant_id, training_id, user_id, due_date, assigned_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(training_id)
        .bind(user_id)
        .bind(due_date)
        .bind(assigned_by)
        .fetch_one(executor)
        .await?;
        Ok(assignment)
    }

    /// `started_at` is set on the first move away from `assigned`;
    /// `completed_at` when the assignment completes.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: AssignmentStatus,
    ) -> Result<TrainingAssignment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignment = sqlx::query_as::<_, TrainingAssignment>(
            r#"
            UPDATE training_assignments SET
                status = $3,
                started_at = CASE WHEN $3 <> 'assigned' THEN COALESCE(started_at, NOW()) ELSE started_at END,
                completed_at = CASE WHEN $3 = 'completed' THEN NOW() ELSE completed_at END,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(assignment)
    }

    pub async fn attach_certificate<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        certificate_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE training_assignments SET certificate_id = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(certificate_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn due_between<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DueAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let due = sqlx::query_as::<_, DueAssignment>(
            r#"
            SELECT a.id, a.user_id, t.title AS training_title, a.due_date
            FROM training_assignments a
            JOIN trainings t ON t.id = a.training_id
            WHERE a.tenant_id = $1
              AND a.status IN ('assigned', 'in_progress', 'content_completed')
              AND a.due_date BETWEEN $2 AND $3
            "#,
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;
        Ok(due)
    }

    /// Moves completed assignments to `expired` once their certificate's
    /// expiry has passed. Returns how many changed.
    pub async fn expire_lapsed<'e, E>(&self, executor: E, tenant_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE training_assignments a SET
                status = 'expired',
                updated_at = NOW()
            FROM certificates c
            WHERE a.tenant_id = $1
              AND a.status = 'completed'
              AND c.tenant_id = a.tenant_id
              AND c.id = a.certificate_id
              AND c.expires_at < $2
            "#,
        )
        .bind(tenant_id)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_overdue<'e, E>(&self, executor: E, tenant_id: Uuid, today: NaiveDate) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM training_assignments
            WHERE tenant_id = $1
              AND status IN ('assigned', 'in_progress', 'content_completed')
              AND due_date < $2
            "#,
        )
        .bind(tenant_id)
        .bind(today)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    // --- Content progress ---

    pub async fn list_progress<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Vec<ContentProgress>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let progress = sqlx::query_as::<_, ContentProgress>(
            "SELECT * FROM content_progress WHERE tenant_id = $1 AND assignment_id = $2",
        )
        .bind(tenant_id)
        .bind(assignment_id)
        .fetch_all(executor)
        .await?;
        Ok(progress)
    }

    pub async fn save_progress<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        progress: &ContentProgress,
    ) -> Result<ContentProgress, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, ContentProgress>(
            r#"
            INSERT INTO content_progress (
                assignment_id, content_id, tenant_id, completed, completed_at,
                time_spent_seconds, last_position_seconds, slides_viewed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (assignment_id, content_id) DO UPDATE SET
                completed = EXCLUDED.completed,
                completed_at = EXCLUDED.completed_at,
                time_spent_seconds = EXCLUDED.time_spent_seconds,
                last_position_seconds = EXCLUDED.last_position_seconds,
                slides_viewed = EXCLUDED.slides_viewed
            RETURNING *
            "#,
        )
        .bind(progress.assignment_id)
        .bind(progress.content_id)
        .bind(tenant_id)
        .bind(progress.completed)
        .bind(progress.completed_at)
        .bind(progress.time_spent_seconds)
        .bind(progress.last_position_seconds)
        .bind(&progress.slides_viewed)
        .fetch_one(executor)
        .await?;
        Ok(saved)
    }

    // --- Exam attempts ---

    pub async fn list_attempts<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Vec<ExamAttempt>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let attempts = sqlx::query_as::<_, ExamAttempt>(
            "SELECT * FROM exam_attempts WHERE tenant_id = $1 AND assignment_id = $2 ORDER BY attempt_number",
        )
        .bind(tenant_id)
        .bind(assignment_id)
        .fetch_all(executor)
        .await?;
        Ok(attempts)
    }

    pub async fn insert_attempt<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        attempt: NewAttempt,
    ) -> Result<ExamAttempt, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, ExamAttempt>(
            r#"
            INSERT INTO exam_attempts (
                tenant_id, assignment_id, attempt_number, score, max_score, percentage, passed, answers
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(attempt.assignment_id)
        .bind(attempt.attempt_number)
        .bind(attempt.score)
        .bind(attempt.max_score)
        .bind(attempt.percentage)
        .bind(attempt.passed)
        .bind(Json(attempt.answers))
        .fetch_one(executor)
        .await?;
        Ok(saved)
    }
}
