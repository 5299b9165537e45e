// src/services/training_service.rs

use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination},
    db::{
        history_repo::{StatusChange, ENTITY_TRAINING},
        HistoryRepository, TrainingRepository,
    },
    models::{
        auth::User,
        training::{
            CreateTrainingPayload, ExamDetail, ExamInput, ExamQuestionView, ExamView, Training, TrainingDetail,
            TrainingFilter, TrainingStatus, TrainingStatusPayload, UpdateTrainingPayload,
        },
        workflow::{ModuleStats, StatusHistoryEntry, WorkflowStatus},
    },
};

const DEFAULT_VALIDITY_MONTHS: i32 = 12;

#[derive(Clone)]
pub struct TrainingService {
    training_repo: TrainingRepository,
    history_repo: HistoryRepository,
}

impl TrainingService {
    pub fn new(training_repo: TrainingRepository, history_repo: HistoryRepository) -> Self {
        Self { training_repo, history_repo }
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        filter: &TrainingFilter,
    ) -> Result<Vec<Training>, AppError> {
        let (limit, offset) = pagination::page(filter.limit, filter.offset);
        self.training_repo
            .list(&mut *conn, tenant_id, filter, pagination::search_term(&filter.search), limit, offset)
            .await
    }

    pub async fn stats(&self, conn: &mut PgConnection, tenant_id: Uuid) -> Result<ModuleStats, AppError> {
        let by_status = self.training_repo.count_by_status(&mut *conn, tenant_id).await?;
        Ok(ModuleStats::new(by_status, Vec::new()))
    }

    /// `with_answers` is for training managers; everyone else gets the exam
    /// without its correct answers.
    pub async fn get_detail(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        with_answers: bool,
    ) -> Result<TrainingDetail, AppError> {
        let training = self.find(conn, tenant_id, id, false).await?;
        self.detail(conn, tenant_id, training, with_answers).await
    }

    pub async fn history(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, AppError> {
        self.find(conn, tenant_id, id, false).await?;
        self.history_repo.list(&mut *conn, tenant_id, ENTITY_TRAINING, id).await
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        payload: CreateTrainingPayload,
    ) -> Result<TrainingDetail, AppError> {
        payload.validate()?;
        if let Some(exam) = &payload.exam {
            exam.check_answers()?;
        }

        let training = self
            .training_repo
            .create(
                &mut *conn,
                tenant_id,
                &payload.title,
                payload.description.as_deref(),
                payload.category.as_deref(),
                payload.validity_months.unwrap_or(DEFAULT_VALIDITY_MONTHS),
                user.id,
            )
            .await?;

        self.training_repo
            .replace_contents(&mut *conn, tenant_id, training.id, &payload.contents)
            .await?;
        if let Some(exam) = &payload.exam {
            self.training_repo.replace_exam(&mut *conn, tenant_id, training.id, exam).await?;
        }

        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_TRAINING,
                    entity_id: training.id,
                    from_status: None,
                    to_status: training.status.as_str(),
                    comment: None,
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(training_id = %training.id, tenant_id = %tenant_id, "training created");
        self.detail(conn, tenant_id, training, true).await
    }

    /// Contents are replaced wholesale when given.
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: UpdateTrainingPayload,
    ) -> Result<TrainingDetail, AppError> {
        payload.validate()?;

        let current = self.find(conn, tenant_id, id, true).await?;
        if current.status.is_terminal() {
            return Err(AppError::BusinessRule("Archived trainings cannot be edited.".into()));
        }

        if let Some(contents) = &payload.contents {
            self.ensure_unassigned(conn, tenant_id, id).await?;
            self.training_repo.replace_contents(&mut *conn, tenant_id, id, contents).await?;
        }

        let training = self
            .training_repo
            .update(
                &mut *conn,
                tenant_id,
                id,
                payload.title.as_deref(),
                payload.description.as_deref(),
                payload.category.as_deref(),
                payload.validity_months,
                user.id,
            )
            .await?;

        self.detail(conn, tenant_id, training, true).await
    }

    pub async fn change_status(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: TrainingStatusPayload,
    ) -> Result<Training, AppError> {
        let current = self.find(conn, tenant_id, id, true).await?;
        current.status.ensure_transition(payload.status)?;

        if payload.status == TrainingStatus::Published
            && self.training_repo.list_contents(&mut *conn, tenant_id, id).await?.is_empty()
        {
            return Err(AppError::BusinessRule("A training needs content before it is published.".into()));
        }

        let training = self
            .training_repo
            .set_status(&mut *conn, tenant_id, id, payload.status, user.id)
            .await?;

        self.history_repo
            .record(
                &mut *conn,
                tenant_id,
                StatusChange {
                    entity_type: ENTITY_TRAINING,
                    entity_id: id,
                    from_status: Some(current.status.as_str()),
                    to_status: training.status.as_str(),
                    comment: payload.comment.as_deref(),
                    changed_by: user.id,
                },
            )
            .await?;

        tracing::info!(training_id = %id, to = training.status.as_str(), "training status changed");
        Ok(training)
    }

    pub async fn set_exam(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        input: ExamInput,
    ) -> Result<ExamDetail, AppError> {
        input.validate()?;
        input.check_answers()?;

        let training = self.find(conn, tenant_id, id, true).await?;
        if training.status.is_terminal() {
            return Err(AppError::BusinessRule("Archived trainings cannot be edited.".into()));
        }
        self.ensure_unassigned(conn, tenant_id, id).await?;

        let (exam, questions) = self.training_repo.replace_exam(&mut *conn, tenant_id, id, &input).await?;
        Ok(ExamDetail { exam, questions })
    }

    pub async fn remove_exam(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.find(conn, tenant_id, id, true).await?;
        self.ensure_unassigned(conn, tenant_id, id).await?;

        if !self.training_repo.delete_exam(&mut *conn, tenant_id, id).await? {
            return Err(AppError::not_found("Exam"));
        }
        Ok(())
    }

    /// The exam as a trainee sees it.
    pub async fn exam_view(&self, conn: &mut PgConnection, tenant_id: Uuid, training_id: Uuid) -> Result<ExamView, AppError> {
        self.find(conn, tenant_id, training_id, false).await?;
        let exam = self
            .training_repo
            .find_exam(&mut *conn, tenant_id, training_id)
            .await?
            .ok_or_else(|| AppError::not_found("Exam"))?;
        let questions = self.training_repo.list_questions(&mut *conn, tenant_id, training_id).await?;

        Ok(ExamView {
            exam,
            questions: questions.iter().map(ExamQuestionView::from).collect(),
        })
    }

    pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.find(conn, tenant_id, id, true).await?;
        if self.training_repo.count_assignments(&mut *conn, tenant_id, id).await? > 0 {
            return Err(AppError::Conflict(
                "This training has assignments; archive it instead of deleting it.".into(),
            ));
        }
        self.training_repo.delete(&mut *conn, tenant_id, id).await?;
        Ok(())
    }

    async fn ensure_unassigned(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if self.training_repo.count_assignments(&mut *conn, tenant_id, id).await? > 0 {
            return Err(AppError::Conflict(
                "Contents and exam cannot change once the training has been assigned.".into(),
            ));
        }
        Ok(())
    }

    async fn detail(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        training: Training,
        with_answers: bool,
    ) -> Result<TrainingDetail, AppError> {
        let contents = self.training_repo.list_contents(&mut *conn, tenant_id, training.id).await?;
        let exam = match self.training_repo.find_exam(&mut *conn, tenant_id, training.id).await? {
            None => None,
            Some(exam) => {
                let questions = self.training_repo.list_questions(&mut *conn, tenant_id, training.id).await?;
                let value = if with_answers {
                    serde_json::to_value(ExamDetail { exam, questions })
                } else {
                    serde_json::to_value(ExamView {
                        exam,
                        questions: questions.iter().map(ExamQuestionView::from).collect(),
                    })
                };
                Some(value.map_err(anyhow::Error::from)?)
            }
        };

        Ok(TrainingDetail { training, contents, exam })
    }

    async fn find(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid, for_update: bool) -> Result<Training, AppError> {
        self.training_repo
            .find_by_id(&mut *conn, tenant_id, id, for_update)
            .await?
            .ok_or_else(|| AppError::not_found("Training"))
    }
}
