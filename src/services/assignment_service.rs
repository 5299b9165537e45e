// src/services/assignment_service.rs

//! Per-user training assignments: sequential content gating, dwell tracking,
//! exam attempts and the hand-off to certificate issuance.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination},
    db::{
        assignment_repo::NewAttempt, AssignmentRepository, NotificationRepository, TrainingRepository,
        UserRepository,
    },
    middleware::rbac::TRAINING_MANAGE,
    models::{
        auth::User,
        certificates::CertificateView,
        notifications::{NewNotification, NotificationType},
        training::{
            can_access_content, dwell_requirement_met, merge_slides, score_exam, AssignTrainingPayload, AssignmentDetail,
            AssignmentFilter, AssignmentListItem, AssignmentStatus, ContentProgress, ContentProgressView,
            ExamSubmissionResult, ProgressPayload, SubmitExamPayload, Training, TrainingAssignment,
            TrainingContent, TrainingStatus,
        },
    },
    services::certificate_service::CertificateService,
};

#[derive(Clone)]
pub struct AssignmentService {
    assignment_repo: AssignmentRepository,
    training_repo: TrainingRepository,
    user_repo: UserRepository,
    notification_repo: NotificationRepository,
    certificate_service: CertificateService,
}

/// Content of a training paired with the assignee's progress, in position order.
struct ContentState {
    contents: Vec<TrainingContent>,
    progress: Vec<ContentProgress>,
}

impl ContentState {
    fn completed_flags(&self) -> Vec<bool> {
        self.progress.iter().map(|p| p.completed).collect()
    }

    fn index_of(&self, content_id: Uuid) -> Result<usize, AppError> {
        self.contents
            .iter()
            .position(|c| c.id == content_id)
            .ok_or_else(|| AppError::not_found("Content"))
    }

    fn all_completed(&self) -> bool {
        self.progress.iter().all(|p| p.completed)
    }
}

impl AssignmentService {
    pub fn new(
        assignment_repo: AssignmentRepository,
        training_repo: TrainingRepository,
        user_repo: UserRepository,
        notification_repo: NotificationRepository,
        certificate_service: CertificateService,
    ) -> Self {
        Self { assignment_repo, training_repo, user_repo, notification_repo, certificate_service }
    }

    /// Creates one assignment per user, skipping users that already hold an
    /// open assignment of the training.
    pub async fn assign(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        payload: AssignTrainingPayload,
    ) -> Result<Vec<TrainingAssignment>, AppError> {
        payload.validate()?;

        let training = self.find_training(conn, tenant_id, payload.training_id).await?;
        if training.status != TrainingStatus::Published {
            return Err(AppError::BusinessRule("Only published trainings can be assigned.".into()));
        }

        let mut user_ids = payload.user_ids.clone();
        user_ids.sort_unstable();
        user_ids.dedup();

        let assignees = self.user_repo.find_many(&mut *conn, tenant_id, &user_ids).await?;
        if assignees.len() != user_ids.len() {
            return Err(AppError::not_found("User"));
        }
        if let Some(inactive) = assignees.iter().find(|u| !u.is_active) {
            return Err(AppError::BusinessRule(format!(
                "{} is inactive and cannot receive trainings.",
                inactive.full_name()
            )));
        }

        let already_assigned = self
            .assignment_repo
            .users_with_open_assignment(&mut *conn, tenant_id, training.id, &user_ids)
            .await?;

        let mut created = Vec::new();
        for user_id in user_ids.into_iter().filter(|id| !already_assigned.contains(id)) {
            let assignment = self
                .assignment_repo
                .create(&mut *conn, tenant_id, training.id, user_id, payload.due_date, user.id)
                .await?;

            let due = assignment
                .due_date
                .map(|d| format!(" Due by {}.", d.format("%Y-%m-%d")))
                .unwrap_or_default();
            self.notify(
                conn,
                tenant_id,
                NewNotification {
                    user_id,
                    notification_type: NotificationType::TrainingAssigned,
                    title: "New training assigned".into(),
                    message: format!("You have been assigned \"{}\".{}", training.title, due),
                    assignment_id: Some(assignment.id),
                    certificate_id: None,
                },
            )
            .await?;
            created.push(assignment);
        }

        tracing::info!(
            training_id = %training.id,
            created = created.len(),
            skipped = already_assigned.len(),
            "training assigned"
        );
        Ok(created)
    }

    /// Managers may filter freely; everyone else only sees their own assignments.
    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        viewer: &User,
        filter: &AssignmentFilter,
    ) -> Result<Vec<AssignmentListItem>, AppError> {
        let user_id = if viewer.has_permission(TRAINING_MANAGE) {
            filter.user_id
        } else {
            Some(viewer.id)
        };
        self.list_for(conn, tenant_id, user_id, filter).await
    }

    pub async fn mine(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        viewer: &User,
        filter: &AssignmentFilter,
    ) -> Result<Vec<AssignmentListItem>, AppError> {
        self.list_for(conn, tenant_id, Some(viewer.id), filter).await
    }

    pub async fn detail(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        viewer: &User,
        id: Uuid,
    ) -> Result<AssignmentDetail, AppError> {
        let assignment = self.find_visible(conn, tenant_id, viewer, id, false).await?;
        self.build_detail(conn, tenant_id, assignment).await
    }

    /// Accumulates dwell data for one content item of the caller's assignment.
    pub async fn record_progress(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: ProgressPayload,
    ) -> Result<AssignmentDetail, AppError> {
        payload.validate()?;

        let mut assignment = self.find_own_open(conn, tenant_id, user, id).await?;
        let state = self.content_state(conn, tenant_id, &assignment).await?;
        let index = state.index_of(payload.content_id)?;
        ensure_accessible(&state, index)?;

        let mut progress = state.progress[index].clone();
        progress.time_spent_seconds = progress.time_spent_seconds.saturating_add(payload.time_spent_seconds);
        if let Some(position) = payload.position_seconds {
            progress.last_position_seconds = progress.last_position_seconds.max(position);
        }
        if let Some(slides) = payload.slides_viewed {
            progress.slides_viewed = merge_slides(&state.contents[index], &progress.slides_viewed, &slides);
        }
        self.assignment_repo.save_progress(&mut *conn, tenant_id, &progress).await?;

        if assignment.status == AssignmentStatus::Assigned {
            assignment = self
                .assignment_repo
                .set_status(&mut *conn, tenant_id, assignment.id, AssignmentStatus::InProgress)
                .await?;
        }

        self.build_detail(conn, tenant_id, assignment).await
    }

    /// Marks a content item complete once its dwell rule is met. Completing the
    /// last item finishes the assignment when the training has no exam.
    pub async fn complete_content(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        content_id: Uuid,
    ) -> Result<AssignmentDetail, AppError> {
        let mut assignment = self.find_own_open(conn, tenant_id, user, id).await?;
        let mut state = self.content_state(conn, tenant_id, &assignment).await?;
        let index = state.index_of(content_id)?;
        ensure_accessible(&state, index)?;

        if state.progress[index].completed {
            return self.build_detail(conn, tenant_id, assignment).await;
        }
        if !dwell_requirement_met(&state.contents[index], &state.progress[index]) {
            return Err(AppError::BusinessRule(format!(
                "\"{}\" has not been viewed long enough to be completed.",
                state.contents[index].title
            )));
        }

        let progress = &mut state.progress[index];
        progress.completed = true;
        progress.completed_at = Some(Utc::now());
        self.assignment_repo.save_progress(&mut *conn, tenant_id, progress).await?;

        let next_status = if !state.all_completed() {
            AssignmentStatus::InProgress
        } else if self.training_repo.find_exam(&mut *conn, tenant_id, assignment.training_id).await?.is_some() {
            AssignmentStatus::ContentCompleted
        } else {
            AssignmentStatus::Completed
        };

        if next_status != assignment.status {
            assignment = self
                .assignment_repo
                .set_status(&mut *conn, tenant_id, assignment.id, next_status)
                .await?;
            tracing::info!(assignment_id = %assignment.id, status = ?next_status, "assignment advanced");
        }

        if next_status == AssignmentStatus::Completed {
            self.certificate_service
                .issue_for_assignment(conn, tenant_id, &assignment, None, None)
                .await?;
            assignment = self.find(conn, tenant_id, assignment.id, false).await?;
        }

        self.build_detail(conn, tenant_id, assignment).await
    }

    /// Scores one exam attempt. Passing completes the assignment and issues the
    /// certificate; failing the last allowed attempt fails the assignment.
    pub async fn submit_exam(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
        payload: SubmitExamPayload,
    ) -> Result<ExamSubmissionResult, AppError> {
        // 1. Only the assignee, and only once all content is done
        let assignment = self.find(conn, tenant_id, id, true).await?;
        if assignment.user_id != user.id {
            return Err(AppError::Forbidden("Only the assignee can take this exam.".into()));
        }
        match assignment.status {
            AssignmentStatus::ContentCompleted => {}
            AssignmentStatus::Assigned | AssignmentStatus::InProgress => {
                return Err(AppError::BusinessRule(
                    "Complete all training content before taking the exam.".into(),
                ))
            }
            AssignmentStatus::Completed => {
                return Err(AppError::Conflict("This training is already completed.".into()))
            }
            AssignmentStatus::Failed | AssignmentStatus::Expired => {
                return Err(AppError::BusinessRule("This assignment is closed.".into()))
            }
        }

        let training = self.find_training(conn, tenant_id, assignment.training_id).await?;
        let exam = self
            .training_repo
            .find_exam(&mut *conn, tenant_id, training.id)
            .await?
            .ok_or_else(|| AppError::not_found("Exam"))?;
        let questions = self.training_repo.list_questions(&mut *conn, tenant_id, training.id).await?;

        // 2. Attempt budget
        let previous = self.assignment_repo.list_attempts(&mut *conn, tenant_id, assignment.id).await?;
        let attempt_number = previous.len() as i32 + 1;
        if attempt_number > exam.max_attempts {
            return Err(AppError::BusinessRule("No exam attempts remaining.".into()));
        }

        // 3. Score and store the attempt
        let result = score_exam(&questions, &payload.answers);
        let passed = result.passed(exam.passing_score);
        let attempt = self
            .assignment_repo
            .insert_attempt(
                &mut *conn,
                tenant_id,
                NewAttempt {
                    assignment_id: assignment.id,
                    attempt_number,
                    score: result.score,
                    max_score: result.max_score,
                    percentage: result.percentage,
                    passed,
                    answers: payload.answers,
                },
            )
            .await?;
        let attempts_remaining = exam.max_attempts - attempt_number;

        tracing::info!(
            assignment_id = %assignment.id,
            attempt = attempt_number,
            percentage = %result.percentage,
            passed,
            "exam submitted"
        );

        // 4. Pass: complete and certify
        if passed {
            let completed = self
                .assignment_repo
                .set_status(&mut *conn, tenant_id, assignment.id, AssignmentStatus::Completed)
                .await?;
            self.notify(
                conn,
                tenant_id,
                NewNotification {
                    user_id: user.id,
                    notification_type: NotificationType::ExamPassed,
                    title: "Exam passed".into(),
                    message: format!(
                        "You passed the \"{}\" exam with {}%.",
                        training.title,
                        result.percentage.round_dp(2)
                    ),
                    assignment_id: Some(assignment.id),
                    certificate_id: None,
                },
            )
            .await?;
            let certificate = self
                .certificate_service
                .issue_for_assignment(conn, tenant_id, &completed, None, Some(result.percentage))
                .await?;

            return Ok(ExamSubmissionResult {
                attempt,
                attempts_remaining,
                assignment_status: AssignmentStatus::Completed,
                certificate: Some(CertificateView::new(certificate, Utc::now())),
            });
        }

        // 5. Fail: notify, and close the assignment when attempts run out
        let message = if attempts_remaining > 0 {
            format!(
                "You scored {}% on \"{}\" ({}% needed). Attempts remaining: {}.",
                result.percentage.round_dp(2),
                training.title,
                exam.passing_score,
                attempts_remaining
            )
        } else {
            format!("You scored {}% on \"{}\" and have no attempts left.", result.percentage.round_dp(2), training.title)
        };
        self.notify(
            conn,
            tenant_id,
            NewNotification {
                user_id: user.id,
                notification_type: NotificationType::ExamFailed,
                title: "Exam not passed".into(),
                message,
                assignment_id: Some(assignment.id),
                certificate_id: None,
            },
        )
        .await?;

        let assignment_status = if attempts_remaining == 0 {
            self.assignment_repo
                .set_status(&mut *conn, tenant_id, assignment.id, AssignmentStatus::Failed)
                .await?
                .status
        } else {
            assignment.status
        };

        Ok(ExamSubmissionResult { attempt, attempts_remaining, assignment_status, certificate: None })
    }

    // --- helpers ---

    async fn list_for(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
        filter: &AssignmentFilter,
    ) -> Result<Vec<AssignmentListItem>, AppError> {
        let (limit, offset) = pagination::page(filter.limit, filter.offset);
        self.assignment_repo
            .list(
                &mut *conn,
                tenant_id,
                user_id,
                filter.training_id,
                filter.status,
                filter.overdue.unwrap_or(false),
                limit,
                offset,
            )
            .await
    }

    async fn find(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        id: Uuid,
        for_update: bool,
    ) -> Result<TrainingAssignment, AppError> {
        self.assignment_repo
            .find_by_id(&mut *conn, tenant_id, id, for_update)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment"))
    }

    async fn find_training(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<Training, AppError> {
        self.training_repo
            .find_by_id(&mut *conn, tenant_id, id, false)
            .await?
            .ok_or_else(|| AppError::not_found("Training"))
    }

    /// Someone else's assignment is reported as missing unless the viewer manages training.
    async fn find_visible(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        viewer: &User,
        id: Uuid,
        for_update: bool,
    ) -> Result<TrainingAssignment, AppError> {
        let assignment = self.find(conn, tenant_id, id, for_update).await?;
        if assignment.user_id == viewer.id || viewer.has_permission(TRAINING_MANAGE) {
            Ok(assignment)
        } else {
            Err(AppError::not_found("Assignment"))
        }
    }

    async fn find_own_open(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        id: Uuid,
    ) -> Result<TrainingAssignment, AppError> {
        let assignment = self.find_visible(conn, tenant_id, user, id, true).await?;
        if assignment.user_id != user.id {
            return Err(AppError::Forbidden("Only the assignee can work through this training.".into()));
        }
        if !matches!(assignment.status, AssignmentStatus::Assigned | AssignmentStatus::InProgress) {
            return Err(AppError::BusinessRule("The training content of this assignment is already finished.".into()));
        }
        Ok(assignment)
    }

    async fn content_state(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        assignment: &TrainingAssignment,
    ) -> Result<ContentState, AppError> {
        let contents = self
            .training_repo
            .list_contents(&mut *conn, tenant_id, assignment.training_id)
            .await?;
        let mut stored: HashMap<Uuid, ContentProgress> = self
            .assignment_repo
            .list_progress(&mut *conn, tenant_id, assignment.id)
            .await?
            .into_iter()
            .map(|p| (p.content_id, p))
            .collect();

        let progress = contents
            .iter()
            .map(|c| {
                stored.remove(&c.id).unwrap_or_else(|| ContentProgress {
                    assignment_id: assignment.id,
                    content_id: c.id,
                    tenant_id,
                    ..Default::default()
                })
            })
            .collect();

        Ok(ContentState { contents, progress })
    }

    async fn build_detail(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        assignment: TrainingAssignment,
    ) -> Result<AssignmentDetail, AppError> {
        let training = self.find_training(conn, tenant_id, assignment.training_id).await?;
        let state = self.content_state(conn, tenant_id, &assignment).await?;
        let exam = self.training_repo.find_exam(&mut *conn, tenant_id, training.id).await?;
        let exam_attempts = self.assignment_repo.list_attempts(&mut *conn, tenant_id, assignment.id).await?;

        let completed = state.completed_flags();
        let content_progress = state
            .contents
            .iter()
            .zip(state.progress)
            .enumerate()
            .map(|(i, (content, progress))| ContentProgressView {
                content_id: content.id,
                position: content.position,
                title: content.title.clone(),
                content_type: content.content_type,
                completed: progress.completed,
                completed_at: progress.completed_at,
                time_spent_seconds: progress.time_spent_seconds,
                last_position_seconds: progress.last_position_seconds,
                slides_viewed: progress.slides_viewed,
                can_access: can_access_content(&completed, i),
            })
            .collect();

        Ok(AssignmentDetail {
            is_overdue: assignment.is_overdue(Utc::now().date_naive()),
            assignment,
            training_title: training.title,
            has_exam: exam.is_some(),
            max_attempts: exam.map(|e| e.max_attempts),
            content_progress,
            exam_attempts,
        })
    }

    async fn notify(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        notification: NewNotification,
    ) -> Result<(), AppError> {
        self.notification_repo.create(&mut *conn, tenant_id, &notification).await?;
        Ok(())
    }
}

fn ensure_accessible(state: &ContentState, index: usize) -> Result<(), AppError> {
    if can_access_content(&state.completed_flags(), index) {
        Ok(())
    } else {
        Err(AppError::BusinessRule("Complete the previous training content first.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::training::ContentType;

    fn state(completed: &[bool]) -> ContentState {
        let contents: Vec<TrainingContent> = completed
            .iter()
            .enumerate()
            .map(|(i, _)| TrainingContent {
                id: Uuid::new_v4(),
                tenant_id: Uuid::nil(),
                training_id: Uuid::nil(),
                position: i as i32,
                title: format!("Part {}", i + 1),
                content_type: ContentType::Document,
                url: None,
                duration_seconds: None,
                slide_count: None,
                min_seconds: None,
            })
            .collect();
        let progress = contents
            .iter()
            .zip(completed)
            .map(|(c, done)| ContentProgress { content_id: c.id, completed: *done, ..Default::default() })
            .collect();
        ContentState { contents, progress }
    }

    #[test]
    fn gating_follows_position_order() {
        let s = state(&[true, false, false]);
        assert!(ensure_accessible(&s, 1).is_ok());
        assert!(matches!(ensure_accessible(&s, 2), Err(AppError::BusinessRule(_))));
    }

    #[test]
    fn unknown_content_is_not_found() {
        let s = state(&[false]);
        assert!(matches!(s.index_of(Uuid::new_v4()), Err(AppError::NotFound(_))));
        assert_eq!(s.index_of(s.contents[0].id).unwrap(), 0);
    }

    #[test]
    fn all_completed_needs_every_item() {
        assert!(!state(&[true, false]).all_completed());
        assert!(state(&[true, true]).all_completed());
    }
}
