// src/models/training.rs

//! Trainings, their ordered content, the optional exam and per-user assignments.
//!
//! The completion rules live here as plain functions so the service layer can
//! enforce them and the tests can exercise them without a database.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::models::{certificates::CertificateView, workflow::WorkflowStatus};

pub const DEFAULT_MIN_SECONDS: i32 = 30;
/// Share of a video's declared duration that counts as "watched".
pub const VIDEO_COMPLETION_PERCENT: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "training_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    Draft,
    Published,
    Archived,
}

impl WorkflowStatus for TrainingStatus {
    const FLOW: &'static [Self] = &[
        TrainingStatus::Draft,
        TrainingStatus::Published,
        TrainingStatus::Archived,
    ];
    const TERMINAL: &'static [Self] = &[TrainingStatus::Archived];

    fn as_str(self) -> &'static str {
        match self {
            TrainingStatus::Draft => "draft",
            TrainingStatus::Published => "published",
            TrainingStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "content_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Video,
    Slideshow,
    Document,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    ContentCompleted,
    Completed,
    Failed,
    Expired,
}

impl AssignmentStatus {
    pub fn is_open(self) -> bool {
        matches!(
            self,
            AssignmentStatus::Assigned | AssignmentStatus::InProgress | AssignmentStatus::ContentCompleted
        )
    }
}

// ---
// Rows
// ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Beyond-Use Dating for non-sterile compounding")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "Compounding")]
    pub category: Option<String>,
    pub status: TrainingStatus,
    /// 0 means certificates never expire.
    #[schema(example = 12)]
    pub validity_months: i32,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrainingContent {
    pub id: Uuid,
    #[serde(skip)]
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub training_id: Uuid,
    pub position: i32,
    pub title: String,
    pub content_type: ContentType,
    pub url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub slide_count: Option<i32>,
    pub min_seconds: Option<i32>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub training_id: Uuid,
    #[serde(skip)]
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub title: String,
    /// Percentage needed to pass.
    #[schema(example = 80)]
    pub passing_score: i32,
    #[schema(example = 3)]
    pub max_attempts: i32,
    pub time_limit_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestion {
    pub id: Uuid,
    #[serde(skip)]
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[serde(skip)]
    #[schema(ignore)]
    pub training_id: Uuid,
    pub position: i32,
    pub text: String,
    pub options: Vec<String>,
    #[schema(example = json!([1]))]
    pub correct_answers: Vec<i32>,
    pub points: i32,
}

/// A question as shown to the person taking the exam.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestionView {
    pub id: Uuid,
    pub position: i32,
    pub text: String,
    pub options: Vec<String>,
    pub points: i32,
    /// More than one option may be correct.
    pub multiple_answers: bool,
}

impl From<&ExamQuestion> for ExamQuestionView {
    fn from(q: &ExamQuestion) -> Self {
        Self {
            id: q.id,
            position: q.position,
            text: q.text.clone(),
            options: q.options.clone(),
            points: q.points,
            multiple_answers: q.correct_answers.len() > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamDetail {
    #[serde(flatten)]
    pub exam: Exam,
    pub questions: Vec<ExamQuestion>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamView {
    #[serde(flatten)]
    pub exam: Exam,
    pub questions: Vec<ExamQuestionView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDetail {
    #[serde(flatten)]
    pub training: Training,
    pub contents: Vec<TrainingContent>,
    /// Answers are only included for training managers.
    #[schema(value_type = Option<Object>)]
    pub exam: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrainingAssignment {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub training_id: Uuid,
    pub user_id: Uuid,
    pub status: AssignmentStatus,
    pub due_date: Option<NaiveDate>,
    pub assigned_by: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub certificate_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrainingAssignment {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date.map(|d| d < today).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentProgress {
    #[serde(skip)]
    #[schema(ignore)]
    pub assignment_id: Uuid,
    pub content_id: Uuid,
    #[serde(skip)]
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent_seconds: i32,
    pub last_position_seconds: i32,
    pub slides_viewed: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamAttempt {
    pub id: Uuid,
    #[serde(skip)]
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub assignment_id: Uuid,
    pub attempt_number: i32,
    pub score: i32,
    pub max_score: i32,
    #[schema(value_type = f64, example = 85.0)]
    pub percentage: Decimal,
    pub passed: bool,
    #[schema(value_type = Vec<Vec<i32>>)]
    pub answers: Json<Vec<Vec<i32>>>,
    pub submitted_at: DateTime<Utc>,
}

// ---
// Views
// ---

/// Assignment row joined with what list screens show next to it.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentListItem {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub assignment: TrainingAssignment,
    pub training_title: String,
    pub user_name: String,
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentProgressView {
    pub content_id: Uuid,
    pub position: i32,
    pub title: String,
    pub content_type: ContentType,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent_seconds: i32,
    pub last_position_seconds: i32,
    pub slides_viewed: Vec<i32>,
    pub can_access: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: TrainingAssignment,
    pub training_title: String,
    pub has_exam: bool,
    pub max_attempts: Option<i32>,
    pub is_overdue: bool,
    pub content_progress: Vec<ContentProgressView>,
    pub exam_attempts: Vec<ExamAttempt>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamSubmissionResult {
    pub attempt: ExamAttempt,
    pub attempts_remaining: i32,
    pub assignment_status: AssignmentStatus,
    pub certificate: Option<CertificateView>,
}

// ---
// Payloads
// ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentInput {
    #[validate(length(min = 1, message = "The content title is required."))]
    pub title: String,
    pub content_type: ContentType,
    pub url: Option<String>,
    #[validate(range(min = 1, message = "Duration must be positive."))]
    pub duration_seconds: Option<i32>,
    #[validate(range(min = 1, message = "Slide count must be positive."))]
    pub slide_count: Option<i32>,
    #[validate(range(min = 0, message = "Minimum seconds cannot be negative."))]
    pub min_seconds: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[validate(length(min = 1, message = "The question text is required."))]
    pub text: String,
    #[validate(length(min = 2, message = "A question needs at least two options."))]
    pub options: Vec<String>,
    #[validate(length(min = 1, message = "At least one correct answer is required."))]
    pub correct_answers: Vec<i32>,
    #[validate(range(min = 1, max = 1000, message = "Points must be between 1 and 1000."))]
    #[serde(default = "one")]
    pub points: i32,
}

fn one() -> i32 {
    1
}

impl QuestionInput {
    /// Correct answers must point at existing options.
    pub fn check_answers(&self) -> Result<(), AppError> {
        let in_range = self
            .correct_answers
            .iter()
            .all(|a| *a >= 0 && (*a as usize) < self.options.len());
        if in_range {
            Ok(())
        } else {
            Err(AppError::BusinessRule(format!(
                "Question '{}' has a correct answer outside its options.",
                self.text
            )))
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamInput {
    #[validate(length(min = 1, message = "The exam title is required."))]
    pub title: String,
    #[validate(range(min = 0, max = 100, message = "Passing score is a percentage."))]
    pub passing_score: i32,
    #[validate(range(min = 1, message = "At least one attempt must be allowed."))]
    pub max_attempts: i32,
    #[validate(range(min = 1, message = "Time limit must be positive."))]
    pub time_limit_minutes: Option<i32>,
    #[validate(
        length(min = 1, max = 200, message = "An exam needs between 1 and 200 questions."),
        nested
    )]
    pub questions: Vec<QuestionInput>,
}

impl ExamInput {
    pub fn check_answers(&self) -> Result<(), AppError> {
        self.questions.iter().try_for_each(QuestionInput::check_answers)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrainingPayload {
    #[validate(length(min = 1, message = "The title is required."))]
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0, max = 120, message = "Validity must be between 0 and 120 months."))]
    pub validity_months: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub contents: Vec<ContentInput>,
    #[validate(nested)]
    pub exam: Option<ExamInput>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrainingPayload {
    #[validate(length(min = 1, message = "The title cannot be empty."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0, max = 120, message = "Validity must be between 0 and 120 months."))]
    pub validity_months: Option<i32>,
    /// Replaces the whole content list when present.
    #[validate(nested)]
    pub contents: Option<Vec<ContentInput>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrainingStatusPayload {
    pub status: TrainingStatus,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TrainingFilter {
    pub status: Option<TrainingStatus>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignTrainingPayload {
    pub training_id: Uuid,
    #[validate(length(min = 1, message = "Select at least one user."))]
    pub user_ids: Vec<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    pub content_id: Uuid,
    /// Seconds spent since the last report.
    #[validate(range(min = 0, max = 86400, message = "Invalid time spent."))]
    pub time_spent_seconds: i32,
    #[validate(range(min = 0, message = "Invalid position."))]
    pub position_seconds: Option<i32>,
    #[validate(length(max = 1000, message = "Too many slides reported at once."))]
    pub slides_viewed: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExamPayload {
    /// Selected option indices, one list per question in position order.
    #[schema(example = json!([[1], [0, 2]]))]
    pub answers: Vec<Vec<i32>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssignmentFilter {
    pub user_id: Option<Uuid>,
    pub training_id: Option<Uuid>,
    pub status: Option<AssignmentStatus>,
    pub overdue: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---
// Completion rules
// ---

/// A content item is reachable only when every earlier item is completed.
/// `completed` is indexed by content position order.
pub fn can_access_content(completed: &[bool], index: usize) -> bool {
    index < completed.len() && completed[..index].iter().all(|c| *c)
}

/// Minimum engagement before an item may be marked complete.
pub fn dwell_requirement_met(content: &TrainingContent, progress: &ContentProgress) -> bool {
    let min_seconds = content.min_seconds.unwrap_or(DEFAULT_MIN_SECONDS);
    match content.content_type {
        ContentType::Video => match content.duration_seconds {
            Some(duration) => {
                let needed = (i64::from(duration) * VIDEO_COMPLETION_PERCENT + 99) / 100;
                let watched = progress.last_position_seconds.max(progress.time_spent_seconds);
                i64::from(watched) >= needed
            }
            None => progress.time_spent_seconds >= min_seconds,
        },
        ContentType::Slideshow => match content.slide_count {
            Some(count) => (0..count).all(|slide| progress.slides_viewed.contains(&slide)),
            None => progress.time_spent_seconds >= min_seconds,
        },
        ContentType::Document | ContentType::Other => progress.time_spent_seconds >= min_seconds,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamScore {
    pub score: i32,
    pub max_score: i32,
    pub percentage: Decimal,
}

impl ExamScore {
    pub fn passed(&self, passing_score: i32) -> bool {
        self.percentage >= Decimal::from(passing_score)
    }
}

/// Adds newly reported slide indices to the ones already seen. Only slideshow
/// content with a known slide count records slides, and only indices inside it.
pub fn merge_slides(content: &TrainingContent, seen: &[i32], reported: &[i32]) -> Vec<i32> {
    let count = match (content.content_type, content.slide_count) {
        (ContentType::Slideshow, Some(count)) => count,
        _ => return Vec::new(),
    };
    let mut slides: BTreeSet<i32> = seen.iter().copied().filter(|s| (0..count).contains(s)).collect();
    slides.extend(reported.iter().copied().filter(|s| (0..count).contains(s)));
    slides.into_iter().collect()
}

/// A question scores its points only when the selected set equals the correct set.
/// `answers` follow question position order; missing entries count as wrong.
pub fn score_exam(questions: &[ExamQuestion], answers: &[Vec<i32>]) -> ExamScore {
    let normalise = |v: &[i32]| {
        let mut v = v.to_vec();
        v.sort_unstable();
        v.dedup();
        v
    };

    let max_score: i64 = questions.iter().map(|q| i64::from(q.points)).sum();
    let score: i64 = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| {
            answers
                .get(*i)
                .map(|selected| normalise(selected) == normalise(&q.correct_answers))
                .unwrap_or(false)
        })
        .map(|(_, q)| i64::from(q.points))
        .sum();

    let percentage = if max_score == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(score) * Decimal::from(100) / Decimal::from(max_score))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    };

    ExamScore {
        score: i32::try_from(score).unwrap_or(i32::MAX),
        max_score: i32::try_from(max_score).unwrap_or(i32::MAX),
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(content_type: ContentType) -> TrainingContent {
        TrainingContent {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            training_id: Uuid::nil(),
            position: 0,
            title: "BUD basics".into(),
            content_type,
            url: None,
            duration_seconds: None,
            slide_count: None,
            min_seconds: None,
        }
    }

    fn question(correct: &[i32], points: i32) -> ExamQuestion {
        ExamQuestion {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            training_id: Uuid::nil(),
            position: 0,
            text: "Default BUD for aqueous oral preparations?".into(),
            options: vec!["14 days".into(), "35 days".into(), "6 months".into()],
            correct_answers: correct.to_vec(),
            points,
        }
    }

    #[test]
    fn access_requires_every_previous_item() {
        let completed = [true, false, false];
        assert!(can_access_content(&completed, 0));
        assert!(can_access_content(&completed, 1));
        assert!(!can_access_content(&completed, 2));
        assert!(can_access_content(&[true, true, false], 2));
        assert!(!can_access_content(&completed, 3));
    }

    #[test]
    fn video_needs_ninety_percent() {
        let mut video = content(ContentType::Video);
        video.duration_seconds = Some(100);
        let mut progress = ContentProgress { last_position_seconds: 89, ..Default::default() };
        assert!(!dwell_requirement_met(&video, &progress));
        progress.last_position_seconds = 90;
        assert!(dwell_requirement_met(&video, &progress));
    }

    #[test]
    fn slideshow_needs_every_slide() {
        let mut slides = content(ContentType::Slideshow);
        slides.slide_count = Some(3);
        let mut progress = ContentProgress { slides_viewed: vec![0, 2], ..Default::default() };
        assert!(!dwell_requirement_met(&slides, &progress));
        progress.slides_viewed.push(1);
        assert!(dwell_requirement_met(&slides, &progress));
    }

    #[test]
    fn documents_use_a_flat_timer() {
        let doc = content(ContentType::Document);
        let mut progress = ContentProgress { time_spent_seconds: 29, ..Default::default() };
        assert!(!dwell_requirement_met(&doc, &progress));
        progress.time_spent_seconds = DEFAULT_MIN_SECONDS;
        assert!(dwell_requirement_met(&doc, &progress));

        let mut other = content(ContentType::Other);
        other.min_seconds = Some(0);
        assert!(dwell_requirement_met(&other, &ContentProgress::default()));
    }

    #[test]
    fn slides_outside_the_deck_are_dropped() {
        let mut deck = content(ContentType::Slideshow);
        deck.slide_count = Some(5);

        let merged = merge_slides(&deck, &[0, 1], &[1, 4, 5, -1, 1_000_000]);
        assert_eq!(merged, vec![0, 1, 4]);

        let video = content(ContentType::Video);
        assert!(merge_slides(&video, &[], &[0, 1, 2]).is_empty());
    }

    #[test]
    fn slide_reports_are_length_limited() {
        let payload = ProgressPayload {
            content_id: Uuid::new_v4(),
            time_spent_seconds: 10,
            position_seconds: None,
            slides_viewed: Some((0..5_000).collect()),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn scoring_requires_exact_answer_sets() {
        let questions = vec![question(&[1], 2), question(&[0, 2], 3), question(&[2], 5)];
        let answers = vec![vec![1], vec![2, 0, 0], vec![1]];

        let result = score_exam(&questions, &answers);
        assert_eq!(result.score, 5);
        assert_eq!(result.max_score, 10);
        assert_eq!(result.percentage, Decimal::from(50));
        assert!(result.passed(50));
        assert!(!result.passed(51));
    }

    #[test]
    fn huge_point_values_do_not_overflow_the_total() {
        let questions = vec![question(&[1], i32::MAX), question(&[0], i32::MAX)];
        let result = score_exam(&questions, &[vec![1], vec![2]]);
        assert_eq!(result.percentage, Decimal::from(50));
        assert!(result.max_score > 0);
        assert!(result.passed(50));
    }

    #[test]
    fn points_and_question_count_are_bounded() {
        let mut q = QuestionInput {
            text: "Pick one".into(),
            options: vec!["a".into(), "b".into()],
            correct_answers: vec![0],
            points: i32::MAX,
        };
        assert!(q.validate().is_err());
        q.points = 1000;
        assert!(q.validate().is_ok());

        let exam = ExamInput {
            title: "Too long".into(),
            passing_score: 70,
            max_attempts: 1,
            time_limit_minutes: None,
            questions: vec![q; 201],
        };
        assert!(exam.validate().is_err());
    }

    #[test]
    fn missing_answers_are_wrong() {
        let questions = vec![question(&[1], 1), question(&[0], 1), question(&[2], 1)];
        let result = score_exam(&questions, &[vec![1]]);
        assert_eq!(result.score, 1);
        assert_eq!(result.percentage.to_string(), "33.33");
    }

    #[test]
    fn overdue_only_while_open() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut assignment = TrainingAssignment {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            training_id: Uuid::nil(),
            user_id: Uuid::nil(),
            status: AssignmentStatus::InProgress,
            due_date: NaiveDate::from_ymd_opt(2025, 3, 9),
            assigned_by: None,
            started_at: None,
            completed_at: None,
            certificate_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(assignment.is_overdue(today));
        assignment.status = AssignmentStatus::Completed;
        assert!(!assignment.is_overdue(today));
    }

    #[test]
    fn correct_answers_must_exist() {
        let q = QuestionInput {
            text: "Pick one".into(),
            options: vec!["a".into(), "b".into()],
            correct_answers: vec![2],
            points: 1,
        };
        assert!(q.check_answers().is_err());
    }
}
