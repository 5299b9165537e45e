// src/services/workflow_tests.rs

//! End-to-end service scenarios against a real Postgres. Run with
//! `DATABASE_URL=... cargo test -- --ignored`.

use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{db_utils::set_tenant_scope, error::AppError},
    config::{AppState, Config},
    models::{
        audits::{AuditFindingsPayload, AuditStatus, AuditStatusPayload, AuditType, CreateAuditPayload},
        auth::{CreateUserPayload, User, UserRole},
        capas::{
            CapaStatus, CapaStatusPayload, CapaType, CreateCapaPayload, EffectivenessCheckPayload,
            EffectivenessResult, SOURCE_DEVIATION,
        },
        change_controls::{
            ChangeControlStatus, ChangeControlStatusPayload, ChangeType, CreateChangeControlPayload,
        },
        deviations::{
            CreateDeviationPayload, DeviationFilter, DeviationStatus, DeviationStatusPayload,
            RaiseCapaPayload, Severity,
        },
        documents::{
            CreateDocumentPayload, DocumentFilter, DocumentStatus, DocumentStatusPayload, DocumentType,
        },
        tenancy::{Branding, CreateTenantPayload, OnboardingResponse},
        training::{
            AssignTrainingPayload, AssignmentStatus, ContentInput, ContentType, CreateTrainingPayload,
            ExamInput, ProgressPayload, QuestionInput, SubmitExamPayload, TrainingStatus,
            TrainingStatusPayload,
        },
    },
};

fn state(pool: PgPool) -> AppState {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "workflow-test-secret".into(),
        jwt_ttl_hours: 1,
        bind_addr: "127.0.0.1:0".into(),
        db_max_connections: 1,
        fonts_dir: "./fonts".into(),
    };
    AppState::from_pool(pool, &config)
}

async fn onboard(app: &AppState, subdomain: &str) -> OnboardingResponse {
    app.tenant_service
        .onboard(CreateTenantPayload {
            name: format!("Pharmacy {}", subdomain),
            subdomain: subdomain.into(),
            branding: Branding::default(),
            features: None,
            admin_email: format!("admin@{}.com", subdomain),
            admin_password: "correct-horse".into(),
            admin_first_name: "Alex".into(),
            admin_last_name: "Admin".into(),
        })
        .await
        .unwrap()
}

async fn scoped(pool: &PgPool, tenant_id: Uuid) -> Transaction<'static, Postgres> {
    let mut tx = pool.begin().await.unwrap();
    set_tenant_scope(&mut tx, tenant_id).await.unwrap();
    tx
}

fn document(title: &str) -> CreateDocumentPayload {
    CreateDocumentPayload {
        title: title.into(),
        description: None,
        document_type: DocumentType::Sop,
        version: None,
        department: None,
        file_url: None,
        tags: Vec::new(),
        effective_date: None,
        review_date: None,
    }
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn records_are_invisible_to_other_tenants(pool: PgPool) {
    let app = state(pool.clone());
    let a = onboard(&app, "farmacia-a").await;
    let b = onboard(&app, "farmacia-b").await;

    let mut tx = scoped(&pool, a.tenant.id).await;
    let doc = app
        .document_service
        .create(&mut tx, a.tenant.id, &a.user, document("Cold chain handling"))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert_eq!(doc.version, "1.0");
    assert!(doc.document_number.starts_with("DOC-"));

    let mut tx = scoped(&pool, b.tenant.id).await;
    let listed = app
        .document_service
        .list(&mut tx, b.tenant.id, &DocumentFilter::default())
        .await
        .unwrap();
    assert!(listed.is_empty());

    let err = app.document_service.get(&mut tx, b.tenant.id, doc.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn deviation_raises_a_linked_capa_with_history(pool: PgPool) {
    let app = state(pool.clone());
    let onboarding = onboard(&app, "farmacia-dev").await;
    let (tenant_id, admin) = (onboarding.tenant.id, onboarding.user);

    let mut tx = scoped(&pool, tenant_id).await;
    let deviation = app
        .deviation_service
        .create(
            &mut tx,
            tenant_id,
            &admin,
            CreateDeviationPayload {
                title: "Label mix-up".into(),
                description: "Two prescriptions bagged with swapped labels.".into(),
                severity: Severity::Critical,
                category: "Dispensing".into(),
                occurred_at: None,
                detected_at: None,
                location: None,
                product_affected: None,
                immediate_action: None,
                assigned_to: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(deviation.status, DeviationStatus::Open);

    app.deviation_service
        .change_status(
            &mut tx,
            tenant_id,
            &admin,
            deviation.id,
            DeviationStatusPayload {
                status: DeviationStatus::Investigation,
                comment: Some("Interviewing staff".into()),
                verification_comments: None,
            },
        )
        .await
        .unwrap();

    let (deviation, capa) = app
        .deviation_service
        .raise_capa(
            &mut tx,
            tenant_id,
            &admin,
            deviation.id,
            RaiseCapaPayload {
                title: None,
                description: None,
                capa_type: CapaType::Corrective,
                priority: None,
                assigned_to: None,
                due_date: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(deviation.status, DeviationStatus::CapaInProgress);
    assert_eq!(deviation.linked_capa_id, Some(capa.id));
    assert_eq!(capa.deviation_id, Some(deviation.id));

    let history = app.deviation_service.history(&mut tx, tenant_id, deviation.id).await.unwrap();
    let steps: Vec<&str> = history.iter().map(|h| h.to_status.as_str()).collect();
    assert_eq!(steps, ["open", "investigation", "capa_in_progress"]);

    // A second CAPA for the same deviation is refused.
    let again = app
        .deviation_service
        .raise_capa(
            &mut tx,
            tenant_id,
            &admin,
            deviation.id,
            RaiseCapaPayload {
                title: None,
                description: None,
                capa_type: CapaType::Both,
                priority: None,
                assigned_to: None,
                due_date: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(again, AppError::Conflict(_)));

    let open = app
        .deviation_service
        .list(&mut tx, tenant_id, &DeviationFilter::default())
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn passing_the_exam_completes_training_and_issues_certificate(pool: PgPool) {
    let app = state(pool.clone());
    let onboarding = onboard(&app, "farmacia-train").await;
    let (tenant_id, admin) = (onboarding.tenant.id, onboarding.user);

    let mut tx = scoped(&pool, tenant_id).await;
    let trainee: User = app
        .user_service
        .create(
            &mut tx,
            tenant_id,
            CreateUserPayload {
                email: "trainee@farmacia-train.com".into(),
                password: "correct-horse".into(),
                first_name: "Taylor".into(),
                last_name: "Reed".into(),
                role: UserRole::Trainee,
                department: None,
                permissions: Vec::new(),
            },
        )
        .await
        .unwrap();

    let training = app
        .training_service
        .create(
            &mut tx,
            tenant_id,
            &admin,
            CreateTrainingPayload {
                title: "Hand hygiene".into(),
                description: None,
                category: None,
                validity_months: Some(12),
                contents: vec![ContentInput {
                    title: "Procedure".into(),
                    content_type: ContentType::Document,
                    url: None,
                    duration_seconds: None,
                    slide_count: None,
                    min_seconds: Some(30),
                }],
                exam: Some(ExamInput {
                    title: "Check".into(),
                    passing_score: 70,
                    max_attempts: 2,
                    time_limit_minutes: None,
                    questions: vec![QuestionInput {
                        text: "How long should hands be washed?".into(),
                        options: vec!["5 seconds".into(), "20 seconds".into()],
                        correct_answers: vec![1],
                        points: 1,
                    }],
                }),
            },
        )
        .await
        .unwrap();
    let content_id = training.contents[0].id;

    app.training_service
        .change_status(
            &mut tx,
            tenant_id,
            &admin,
            training.training.id,
            TrainingStatusPayload { status: TrainingStatus::Published, comment: None },
        )
        .await
        .unwrap();

    let assignments = app
        .assignment_service
        .assign(
            &mut tx,
            tenant_id,
            &admin,
            AssignTrainingPayload {
                training_id: training.training.id,
                user_ids: vec![trainee.id, trainee.id],
                due_date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(assignments.len(), 1);
    let assignment_id = assignments[0].id;

    // Not viewed long enough yet.
    let early = app
        .assignment_service
        .complete_content(&mut tx, tenant_id, &trainee, assignment_id, content_id)
        .await
        .unwrap_err();
    assert!(matches!(early, AppError::BusinessRule(_)));

    app.assignment_service
        .record_progress(
            &mut tx,
            tenant_id,
            &trainee,
            assignment_id,
            ProgressPayload {
                content_id,
                time_spent_seconds: 45,
                position_seconds: None,
                slides_viewed: None,
            },
        )
        .await
        .unwrap();

    let detail = app
        .assignment_service
        .complete_content(&mut tx, tenant_id, &trainee, assignment_id, content_id)
        .await
        .unwrap();
    assert_eq!(detail.assignment.status, AssignmentStatus::ContentCompleted);

    let failed = app
        .assignment_service
        .submit_exam(&mut tx, tenant_id, &trainee, assignment_id, SubmitExamPayload { answers: vec![vec![0]] })
        .await
        .unwrap();
    assert!(!failed.attempt.passed);
    assert_eq!(failed.attempts_remaining, 1);
    assert_eq!(failed.assignment_status, AssignmentStatus::ContentCompleted);
    assert!(failed.certificate.is_none());

    let passed = app
        .assignment_service
        .submit_exam(&mut tx, tenant_id, &trainee, assignment_id, SubmitExamPayload { answers: vec![vec![1]] })
        .await
        .unwrap();
    assert!(passed.attempt.passed);
    assert_eq!(passed.assignment_status, AssignmentStatus::Completed);

    let certificate = passed.certificate.unwrap().certificate;
    assert!(certificate.certificate_number.starts_with("CERT-"));
    assert_eq!(certificate.user_id, trainee.id);
    assert!(certificate.expires_at.is_some());

    let unread = app.notification_service.unread_count(&mut tx, tenant_id, trainee.id).await.unwrap();
    assert!(unread.count >= 3);

    // A due-soon reminder goes out once per day however often the sweep runs.
    app.assignment_service
        .assign(
            &mut tx,
            tenant_id,
            &admin,
            AssignTrainingPayload {
                training_id: training.training.id,
                user_ids: vec![admin.id],
                due_date: Some(Utc::now().date_naive() + Duration::days(1)),
            },
        )
        .await
        .unwrap();
    let first = app.notification_service.send_reminders(&mut tx, tenant_id).await.unwrap();
    assert_eq!(first.training_due, 1);
    assert_eq!(first.assignments_expired, 0);
    let second = app.notification_service.send_reminders(&mut tx, tenant_id).await.unwrap();
    assert_eq!(second.training_due, 0);

    // Once the certificate lapses the completed assignment is expired.
    sqlx::query("UPDATE certificates SET expires_at = NOW() - INTERVAL '1 day' WHERE id = $1")
        .bind(certificate.id)
        .execute(&mut *tx)
        .await
        .unwrap();
    let swept = app.notification_service.send_reminders(&mut tx, tenant_id).await.unwrap();
    assert_eq!(swept.assignments_expired, 1);
    assert_eq!(swept.certificate_expiring, 0);

    let detail = app.assignment_service.detail(&mut tx, tenant_id, &trainee, assignment_id).await.unwrap();
    assert_eq!(detail.assignment.status, AssignmentStatus::Expired);
}

fn deviation(title: &str, severity: Severity) -> CreateDeviationPayload {
    CreateDeviationPayload {
        title: title.into(),
        description: format!("{} reported at the counter.", title),
        severity,
        category: "Storage".into(),
        occurred_at: None,
        detected_at: None,
        location: None,
        product_affected: None,
        immediate_action: None,
        assigned_to: None,
    }
}

async fn staff(app: &AppState, tx: &mut Transaction<'static, Postgres>, tenant_id: Uuid, email: &str, role: UserRole) -> User {
    app.user_service
        .create(
            tx,
            tenant_id,
            CreateUserPayload {
                email: email.into(),
                password: "correct-horse".into(),
                first_name: "Sam".into(),
                last_name: "Staff".into(),
                role,
                department: None,
                permissions: Vec::new(),
            },
        )
        .await
        .unwrap()
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn deviation_closes_only_with_verification_comments(pool: PgPool) {
    let app = state(pool.clone());
    let onboarding = onboard(&app, "farmacia-close").await;
    let (tenant_id, admin) = (onboarding.tenant.id, onboarding.user);

    let mut tx = scoped(&pool, tenant_id).await;
    let created = app
        .deviation_service
        .create(&mut tx, tenant_id, &admin, deviation("Fridge above 8C", Severity::Critical))
        .await
        .unwrap();

    let fetched = app.deviation_service.get(&mut tx, tenant_id, created.id).await.unwrap();
    assert_eq!(fetched.deviation_number, created.deviation_number);
    assert_eq!(fetched.severity, Severity::Critical);
    assert_eq!(fetched.status, DeviationStatus::Open);

    app.deviation_service
        .change_status(
            &mut tx,
            tenant_id,
            &admin,
            created.id,
            DeviationStatusPayload { status: DeviationStatus::Investigation, comment: None, verification_comments: None },
        )
        .await
        .unwrap();

    let refused = app
        .deviation_service
        .change_status(
            &mut tx,
            tenant_id,
            &admin,
            created.id,
            DeviationStatusPayload {
                status: DeviationStatus::Closed,
                comment: None,
                verification_comments: Some("   ".into()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(refused, AppError::BusinessRule(_)));

    let closed = app
        .deviation_service
        .change_status(
            &mut tx,
            tenant_id,
            &admin,
            created.id,
            DeviationStatusPayload {
                status: DeviationStatus::Closed,
                comment: Some("Stock quarantined and discarded".into()),
                verification_comments: Some("Logger readings back in range for 7 days.".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(closed.status, DeviationStatus::Closed);

    let history = app.deviation_service.history(&mut tx, tenant_id, created.id).await.unwrap();
    let steps: Vec<&str> = history.iter().map(|h| h.to_status.as_str()).collect();
    assert_eq!(steps, ["open", "investigation", "closed"]);

    let fetched = app.deviation_service.get(&mut tx, tenant_id, created.id).await.unwrap();
    assert_eq!(fetched.status, DeviationStatus::Closed);
    assert!(fetched.closed_at.is_some());
    assert_eq!(fetched.closed_by, Some(admin.id));
    assert_eq!(
        fetched.verification_comments.as_deref(),
        Some("Logger readings back in range for 7 days.")
    );
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn approved_document_is_revised_to_the_next_major_version(pool: PgPool) {
    let app = state(pool.clone());
    let onboarding = onboard(&app, "farmacia-docs").await;
    let (tenant_id, admin) = (onboarding.tenant.id, onboarding.user);

    let mut tx = scoped(&pool, tenant_id).await;
    let created = app
        .document_service
        .create(&mut tx, tenant_id, &admin, document("Controlled drugs register"))
        .await
        .unwrap();
    let fetched = app.document_service.get(&mut tx, tenant_id, created.id).await.unwrap();
    assert_eq!(fetched.title, "Controlled drugs register");
    assert_eq!(fetched.status, DocumentStatus::Draft);

    let early = app.document_service.revise(&mut tx, tenant_id, &admin, created.id).await.unwrap_err();
    assert!(matches!(early, AppError::BusinessRule(_)));

    for status in [DocumentStatus::Review, DocumentStatus::Approved] {
        app.document_service
            .change_status(&mut tx, tenant_id, &admin, created.id, DocumentStatusPayload { status, comment: None })
            .await
            .unwrap();
    }

    let revised = app.document_service.revise(&mut tx, tenant_id, &admin, created.id).await.unwrap();
    assert_eq!(revised.version, "2.0");
    assert_eq!(revised.status, DocumentStatus::Draft);
    assert_eq!(revised.document_number, created.document_number);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn change_control_approval_needs_quality_approve(pool: PgPool) {
    let app = state(pool.clone());
    let onboarding = onboard(&app, "farmacia-change").await;
    let (tenant_id, admin) = (onboarding.tenant.id, onboarding.user);

    let mut tx = scoped(&pool, tenant_id).await;
    let pharmacist = staff(&app, &mut tx, tenant_id, "pharmacist@farmacia-change.com", UserRole::Pharmacist).await;
    let manager = staff(&app, &mut tx, tenant_id, "qa@farmacia-change.com", UserRole::QaManager).await;

    let change = app
        .change_control_service
        .create(
            &mut tx,
            tenant_id,
            &pharmacist,
            CreateChangeControlPayload {
                title: "Replace vaccine fridge".into(),
                description: "Swap the dispensary fridge for a validated unit.".into(),
                change_type: ChangeType::Equipment,
                justification: None,
                risk_level: None,
                impact_assessment: None,
                affected_systems: vec!["Cold chain".into()],
                target_date: None,
            },
        )
        .await
        .unwrap();

    for status in [ChangeControlStatus::Assessment, ChangeControlStatus::ApprovalPending] {
        app.change_control_service
            .change_status(&mut tx, tenant_id, &pharmacist, change.id, ChangeControlStatusPayload { status, comment: None })
            .await
            .unwrap();
    }

    let denied = app
        .change_control_service
        .change_status(
            &mut tx,
            tenant_id,
            &pharmacist,
            change.id,
            ChangeControlStatusPayload { status: ChangeControlStatus::Approved, comment: None },
        )
        .await
        .unwrap_err();
    assert!(matches!(denied, AppError::Forbidden(_)));

    let approved = app
        .change_control_service
        .change_status(
            &mut tx,
            tenant_id,
            &manager,
            change.id,
            ChangeControlStatusPayload { status: ChangeControlStatus::Approved, comment: Some("Validated unit".into()) },
        )
        .await
        .unwrap();
    assert_eq!(approved.status, ChangeControlStatus::Approved);
    assert_eq!(approved.approved_by, Some(manager.id));
    assert!(approved.approved_at.is_some());

    // No skipping straight to completion.
    let skipped = app
        .change_control_service
        .change_status(
            &mut tx,
            tenant_id,
            &admin,
            change.id,
            ChangeControlStatusPayload { status: ChangeControlStatus::Completed, comment: None },
        )
        .await
        .unwrap_err();
    assert!(matches!(skipped, AppError::InvalidTransition { .. }));
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn audit_findings_lock_on_completion(pool: PgPool) {
    let app = state(pool.clone());
    let onboarding = onboard(&app, "farmacia-audit").await;
    let (tenant_id, admin) = (onboarding.tenant.id, onboarding.user);

    let mut tx = scoped(&pool, tenant_id).await;
    let audit = app
        .audit_service
        .create(
            &mut tx,
            tenant_id,
            &admin,
            CreateAuditPayload {
                title: "Annual self-inspection".into(),
                audit_type: AuditType::Internal,
                scope: None,
                auditee: None,
                lead_auditor: None,
                scheduled_date: Utc::now().date_naive(),
            },
        )
        .await
        .unwrap();

    for status in [AuditStatus::InProgress, AuditStatus::ReportDraft] {
        app.audit_service
            .change_status(&mut tx, tenant_id, &admin, audit.id, AuditStatusPayload { status, comment: None })
            .await
            .unwrap();
    }

    let findings = AuditFindingsPayload { critical: 0, major: 1, minor: 3, observations: 2 };
    let recorded = app.audit_service.set_findings(&mut tx, tenant_id, &admin, audit.id, findings).await.unwrap();
    assert_eq!(recorded.total_findings(), 6);

    for status in [AuditStatus::ReportReview, AuditStatus::Completed] {
        app.audit_service
            .change_status(&mut tx, tenant_id, &admin, audit.id, AuditStatusPayload { status, comment: None })
            .await
            .unwrap();
    }

    let late = AuditFindingsPayload { critical: 1, major: 1, minor: 3, observations: 2 };
    let err = app.audit_service.set_findings(&mut tx, tenant_id, &admin, audit.id, late).await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));

    let audit = app.audit_service.get(&mut tx, tenant_id, audit.id).await.unwrap();
    assert_eq!(audit.critical_findings, 0);
    assert_eq!(audit.major_findings, 1);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn capa_naming_a_deviation_links_it_and_completion_moves_it_to_pending_closure(pool: PgPool) {
    let app = state(pool.clone());
    let onboarding = onboard(&app, "farmacia-capa").await;
    let (tenant_id, admin) = (onboarding.tenant.id, onboarding.user);

    let mut tx = scoped(&pool, tenant_id).await;
    let source = app
        .deviation_service
        .create(&mut tx, tenant_id, &admin, deviation("Expired stock dispensed", Severity::Major))
        .await
        .unwrap();
    app.deviation_service
        .change_status(
            &mut tx,
            tenant_id,
            &admin,
            source.id,
            DeviationStatusPayload { status: DeviationStatus::Investigation, comment: None, verification_comments: None },
        )
        .await
        .unwrap();

    let payload = |title: &str| CreateCapaPayload {
        title: title.into(),
        description: "Tighten the expiry check at dispensing.".into(),
        capa_type: CapaType::Corrective,
        source: "Audit".into(),
        source_reference: None,
        deviation_id: Some(source.id),
        priority: None,
        root_cause: None,
        assigned_to: None,
        due_date: None,
    };

    let capa = app.capa_service.create(&mut tx, tenant_id, &admin, payload("Expiry check")).await.unwrap();
    assert_eq!(capa.deviation_id, Some(source.id));
    assert_eq!(capa.source, SOURCE_DEVIATION);
    assert_eq!(capa.source_reference.as_deref(), Some(source.deviation_number.as_str()));

    let linked = app.deviation_service.get(&mut tx, tenant_id, source.id).await.unwrap();
    assert_eq!(linked.status, DeviationStatus::CapaInProgress);
    assert_eq!(linked.linked_capa_id, Some(capa.id));

    let again = app.capa_service.create(&mut tx, tenant_id, &admin, payload("Duplicate")).await.unwrap_err();
    assert!(matches!(again, AppError::Conflict(_)));

    let early = app
        .capa_service
        .record_effectiveness(
            &mut tx,
            tenant_id,
            &admin,
            capa.id,
            EffectivenessCheckPayload { result: EffectivenessResult::Effective, comments: None },
        )
        .await
        .unwrap_err();
    assert!(matches!(early, AppError::BusinessRule(_)));

    for status in [
        CapaStatus::Investigation,
        CapaStatus::ActionPlan,
        CapaStatus::Implementation,
        CapaStatus::EffectivenessCheck,
    ] {
        app.capa_service
            .change_status(&mut tx, tenant_id, &admin, capa.id, CapaStatusPayload { status, comment: None })
            .await
            .unwrap();
    }

    let completed = app
        .capa_service
        .record_effectiveness(
            &mut tx,
            tenant_id,
            &admin,
            capa.id,
            EffectivenessCheckPayload { result: EffectivenessResult::Effective, comments: Some("No repeats in 30 days".into()) },
        )
        .await
        .unwrap();
    assert_eq!(completed.status, CapaStatus::Completed);
    assert!(completed.completed_at.is_some());
    assert_eq!(completed.effectiveness_check_result, Some(EffectivenessResult::Effective));

    let pending = app.deviation_service.get(&mut tx, tenant_id, source.id).await.unwrap();
    assert_eq!(pending.status, DeviationStatus::PendingClosure);

    let history = app.deviation_service.history(&mut tx, tenant_id, source.id).await.unwrap();
    let steps: Vec<&str> = history.iter().map(|h| h.to_status.as_str()).collect();
    assert_eq!(steps, ["open", "investigation", "capa_in_progress", "pending_closure"]);
}
