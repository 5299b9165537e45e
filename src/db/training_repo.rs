// src/db/training_repo.rs

use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::scoped,
    models::{
        training::{
            ContentInput, Exam, ExamInput, ExamQuestion, Training, TrainingContent, TrainingFilter,
            TrainingStatus,
        },
        workflow::CountEntry,
    },
};

const TABLE: &str = "trainings";

#[derive(Clone, Default)]
pub struct TrainingRepository;

impl TrainingRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &TrainingFilter,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Training>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let trainings = sqlx::query_as::<_, Training>(
            r#"
            SELECT * FROM trainings
            WHERE tenant_id = $1
              AND ($2::training_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR category = $3)
              AND ($4::text IS NULL OR title ILIKE '%' || $4 || '%')
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(tenant_id)
        .bind(filter.status)
        .bind(&filter.category)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(trainings)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        for_update: bool,
    ) -> Result<Option<Training>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if for_update {
            "SELECT * FROM trainings WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        } else {
            "SELECT * FROM trainings WHERE tenant_id = $1 AND id = $2"
        };
        let training = sqlx::query_as::<_, Training>(sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(training)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        title: &str,
        description: Option<&str>,
        category: Option<&str>,
        validity_months: i32,
        user_id: Uuid,
    ) -> Result<Training, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let training = sqlx::query_as::<_, Training>(
            r#"
            INSERT INTO trainings (tenant_id, title, description, category, validity_months, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(validity_months)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(training)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
        validity_months: Option<i32>,
        user_id: Uuid,
    ) -> Result<Training, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let training = sqlx::query_as::<_, Training>(
            r#"
            UPDATE trainings SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                validity_months = COALESCE($6, validity_months),
                updated_by = $7,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(validity_months)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(training)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        status: TrainingStatus,
        user_id: Uuid,
    ) -> Result<Training, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let training = sqlx::query_as::<_, Training>(
            r#"
            UPDATE trainings SET status = $3, updated_by = $4, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(training)
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

    pub async fn count_assignments<'e, E>(&self, executor: E, tenant_id: Uuid, training_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM training_assignments WHERE tenant_id = $1 AND training_id = $2",
        )
        .bind(tenant_id)
        .bind(training_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    // --- Contents ---

    pub async fn list_contents<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        training_id: Uuid,
    ) -> Result<Vec<TrainingContent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contents = sqlx::query_as::<_, TrainingContent>(
            "SELECT * FROM training_contents WHERE tenant_id = $1 AND training_id = $2 ORDER BY position",
        )
        .bind(tenant_id)
        .bind(training_id)
        .fetch_all(executor)
        .await?;
        Ok(contents)
    }

    /// Replaces the ordered content list; positions follow the slice order.
    pub async fn replace_contents(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        training_id: Uuid,
        contents: &[ContentInput],
    ) -> Result<Vec<TrainingContent>, AppError> {
        sqlx::query("DELETE FROM training_contents WHERE tenant_id = $1 AND training_id = $2")
            .bind(tenant_id)
            .bind(training_id)
            .execute(&mut *conn)
            .await?;

        let mut saved = Vec::with_capacity(contents.len());
        for (position, content) in contents.iter().enumerate() {
            let row = sqlx::query_as::<_, TrainingContent>(
                r#"
                INSERT INTO training_contents (
                    tenant_id, training_id, position, title, content_type, url,
                    duration_seconds, slide_count, min_seconds
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
                "#,
            )
            .bind(tenant_id)
            .bind(training_id)
            .bind(position as i32)
            .bind(&content.title)
            .bind(content.content_type)
            .bind(&content.url)
            .bind(content.duration_seconds)
            .bind(content.slide_count)
            .bind(content.min_seconds)
            .fetch_one(&mut *conn)
            .await?;
            saved.push(row);
        }
        Ok(saved)
    }

    // --- Exam ---

    pub async fn find_exam<'e, E>(&self, executor: E, tenant_id: Uuid, training_id: Uuid) -> Result<Option<Exam>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exam = sqlx::query_as::<_, Exam>("SELECT * FROM exams WHERE tenant_id = $1 AND training_id = $2")
            .bind(tenant_id)
            .bind(training_id)
            .fetch_optional(executor)
            .await?;
        Ok(exam)
    }

    pub async fn list_questions<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        training_id: Uuid,
    ) -> Result<Vec<ExamQuestion>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let questions = sqlx::query_as::<_, ExamQuestion>(
            "SELECT * FROM exam_questions WHERE tenant_id = $1 AND training_id = $2 ORDER BY position",
        )
        .bind(tenant_id)
        .bind(training_id)
        .fetch_all(executor)
        .await?;
        Ok(questions)
    }

    /// Drops any existing exam (questions cascade) and writes the new one.
    pub async fn replace_exam(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        training_id: Uuid,
        input: &ExamInput,
    ) -> Result<(Exam, Vec<ExamQuestion>), AppError> {
        self.delete_exam(&mut *conn, tenant_id, training_id).await?;

        let exam = sqlx::query_as::<_, Exam>(
            r#"
            INSERT INTO exams (training_id, tenant_id, title, passing_score, max_attempts, time_limit_minutes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(training_id)
        .bind(tenant_id)
        .bind(&input.title)
        .bind(input.passing_score)
        .bind(input.max_attempts)
        .bind(input.time_limit_minutes)
        .fetch_one(&mut *conn)
        .await?;

        let mut questions = Vec::with_capacity(input.questions.len());
        for (position, question) in input.questions.iter().enumerate() {
            let row = sqlx::query_as::<_, ExamQuestion>(
                r#"
                INSERT INTO exam_questions (
                    tenant_id, training_id, position, text, options, correct_answers, points
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(tenant_id)
            .bind(training_id)
            .bind(position as i32)
            .bind(&question.text)
            .bind(&question.options)
            .bind(&question.correct_answers)
            .bind(question.points)
            .fetch_one(&mut *conn)
            .await?;
            questions.push(row);
        }
        Ok((exam, questions))
    }

    pub async fn delete_exam<'e, E>(&self, executor: E, tenant_id: Uuid, training_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM exams WHERE tenant_id = $1 AND training_id = $2")
            .bind(tenant_id)
            .bind(training_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
