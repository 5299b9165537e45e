// src/seed.rs

//! `qms-backend seed`: a demo pharmacy with users and one record per module.

use anyhow::Context;
use chrono::{Duration, Utc};

use crate::{
    common::{db_utils::set_tenant_scope, error::AppError},
    config::AppState,
    models::{
        audits::{AuditType, CreateAuditPayload},
        auth::{CreateUserPayload, User, UserRole},
        capas::{CapaType, CreateCapaPayload, Priority},
        change_controls::{ChangeType, CreateChangeControlPayload},
        deviations::{CreateDeviationPayload, RaiseCapaPayload, Severity},
        documents::{CreateDocumentPayload, DocumentType},
        tenancy::{Branding, CreateTenantPayload},
        training::{
            AssignTrainingPayload, ContentInput, ContentType, CreateTrainingPayload, ExamInput,
            QuestionInput, TrainingStatus, TrainingStatusPayload,
        },
    },
};

pub const DEMO_SUBDOMAIN: &str = "demo-pharmacy";
const DEMO_PASSWORD: &str = "Demo@2025!";

pub async fn run(app_state: &AppState) -> anyhow::Result<()> {
    let existing = app_state
        .tenant_service
        .find_any(DEMO_SUBDOMAIN)
        .await
        .context("failed to look up the demo tenant")?;
    if let Some(tenant) = existing {
        tracing::info!(
            subdomain = DEMO_SUBDOMAIN,
            active = tenant.is_active,
            "demo tenant already exists, nothing to seed"
        );
        return Ok(());
    }

    let onboarding = app_state
        .tenant_service
        .onboard(CreateTenantPayload {
            name: "Demo Pharmacy".into(),
            subdomain: DEMO_SUBDOMAIN.into(),
            branding: Branding {
                logo_url: None,
                primary_color: Some("#0F766E".into()),
                secondary_color: Some("#F59E0B".into()),
                company_name: Some("Demo Pharmacy".into()),
            },
            features: None,
            admin_email: "admin@demo-pharmacy.com".into(),
            admin_password: DEMO_PASSWORD.into(),
            admin_first_name: "Alex".into(),
            admin_last_name: "Admin".into(),
        })
        .await
        .context("failed to create the demo tenant")?;

    let tenant_id = onboarding.tenant.id;
    let admin = onboarding.user;

    let mut tx = app_state.db_pool.begin().await?;
    set_tenant_scope(&mut *tx, tenant_id).await?;

    let qa_manager = app_state
        .user_service
        .create(
            &mut tx,
            tenant_id,
            demo_user("qa@demo-pharmacy.com", "Quinn", "Avery", UserRole::QaManager, "Quality"),
        )
        .await?;
    let trainee = app_state
        .user_service
        .create(
            &mut tx,
            tenant_id,
            demo_user("trainee@demo-pharmacy.com", "Taylor", "Reed", UserRole::Trainee, "Compounding"),
        )
        .await?;

    seed_records(app_state, &mut tx, tenant_id, &qa_manager).await?;
    seed_training(app_state, &mut tx, tenant_id, &admin, &trainee).await?;

    tx.commit().await?;

    tracing::info!(
        tenant_id = %tenant_id,
        subdomain = DEMO_SUBDOMAIN,
        "demo data seeded; users admin@, qa@ and trainee@demo-pharmacy.com share the demo password"
    );
    Ok(())
}

fn demo_user(email: &str, first: &str, last: &str, role: UserRole, department: &str) -> CreateUserPayload {
    CreateUserPayload {
        email: email.into(),
        password: DEMO_PASSWORD.into(),
        first_name: first.into(),
        last_name: last.into(),
        role,
        department: Some(department.into()),
        permissions: Vec::new(),
    }
}

async fn seed_records(
    app_state: &AppState,
    conn: &mut sqlx::PgConnection,
    tenant_id: uuid::Uuid,
    author: &User,
) -> Result<(), AppError> {
    let today = Utc::now().date_naive();

    app_state
        .document_service
        .create(
            conn,
            tenant_id,
            author,
            CreateDocumentPayload {
                title: "Beyond-Use Date Assignment for Compounded Preparations".into(),
                description: Some("How BUDs are assigned to non-sterile compounded preparations.".into()),
                document_type: DocumentType::Sop,
                version: None,
                department: Some("Compounding".into()),
                file_url: None,
                tags: vec!["compounding".into(), "bud".into()],
                effective_date: Some(today),
                review_date: Some(today + Duration::days(365)),
            },
        )
        .await?;

    let deviation = app_state
        .deviation_service
        .create(
            conn,
            tenant_id,
            author,
            CreateDeviationPayload {
                title: "Refrigerator temperature excursion".into(),
                description: "Cold storage unit 2 read 11.2 °C during the morning check.".into(),
                severity: Severity::Major,
                category: "Storage".into(),
                occurred_at: Some(Utc::now() - Duration::hours(6)),
                detected_at: Some(Utc::now() - Duration::hours(5)),
                location: Some("Cold storage 2".into()),
                product_affected: Some("Insulin glargine".into()),
                immediate_action: Some("Stock quarantined and moved to unit 1.".into()),
                assigned_to: Some(author.id),
            },
        )
        .await?;

    app_state
        .deviation_service
        .raise_capa(
            conn,
            tenant_id,
            author,
            deviation.id,
            RaiseCapaPayload {
                title: None,
                description: None,
                capa_type: CapaType::Corrective,
                priority: None,
                assigned_to: None,
                due_date: Some(today + Duration::days(30)),
            },
        )
        .await?;

    app_state
        .capa_service
        .create(
            conn,
            tenant_id,
            author,
            CreateCapaPayload {
                title: "Add second-person check to label printing".into(),
                description: "Labels are printed without independent verification.".into(),
                capa_type: CapaType::Preventive,
                source: "Audit".into(),
                source_reference: None,
                deviation_id: None,
                priority: Some(Priority::Medium),
                root_cause: None,
                assigned_to: Some(author.id),
                due_date: Some(today + Duration::days(45)),
            },
        )
        .await?;

    app_state
        .change_control_service
        .create(
            conn,
            tenant_id,
            author,
            CreateChangeControlPayload {
                title: "Replace compounding balance".into(),
                description: "Swap the analytical balance in the compounding room.".into(),
                change_type: ChangeType::Equipment,
                justification: Some("Current balance fails daily calibration checks.".into()),
                risk_level: Some(Priority::High),
                impact_assessment: None,
                affected_systems: vec!["Compounding".into()],
                target_date: Some(today + Duration::days(60)),
            },
        )
        .await?;

    app_state
        .audit_service
        .create(
            conn,
            tenant_id,
            author,
            CreateAuditPayload {
                title: "Quarterly self-inspection".into(),
                audit_type: AuditType::SelfInspection,
                scope: Some("Storage, dispensing and compounding areas".into()),
                auditee: Some("Pharmacy operations".into()),
                lead_auditor: Some(author.full_name()),
                scheduled_date: today + Duration::days(14),
            },
        )
        .await?;

    Ok(())
}

async fn seed_training(
    app_state: &AppState,
    conn: &mut sqlx::PgConnection,
    tenant_id: uuid::Uuid,
    admin: &User,
    trainee: &User,
) -> Result<(), AppError> {
    let question = |text: &str, options: [&str; 4], correct: i32| QuestionInput {
        text: text.into(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answers: vec![correct],
        points: 1,
    };

    let training = app_state
        .training_service
        .create(
            conn,
            tenant_id,
            admin,
            CreateTrainingPayload {
                title: "Beyond-Use Dating Fundamentals".into(),
                description: Some("Assigning BUDs to non-sterile compounded preparations.".into()),
                category: Some("Compounding".into()),
                validity_months: Some(12),
                contents: vec![
                    ContentInput {
                        title: "What a BUD is".into(),
                        content_type: ContentType::Video,
                        url: Some("https://training.demo-pharmacy.com/bud-intro.mp4".into()),
                        duration_seconds: Some(420),
                        slide_count: None,
                        min_seconds: Some(300),
                    },
                    ContentInput {
                        title: "BUD tables by formulation".into(),
                        content_type: ContentType::Slideshow,
                        url: None,
                        duration_seconds: None,
                        slide_count: Some(12),
                        min_seconds: None,
                    },
                ],
                exam: Some(ExamInput {
                    title: "BUD assessment".into(),
                    passing_score: 70,
                    max_attempts: 3,
                    time_limit_minutes: Some(20),
                    questions: vec![
                        question(
                            "Default BUD for a non-preserved aqueous oral preparation stored refrigerated?",
                            ["14 days", "35 days", "90 days", "180 days"],
                            1,
                        ),
                        question(
                            "Default BUD for a non-aqueous oral preparation?",
                            ["30 days", "60 days", "90 days", "180 days"],
                            3,
                        ),
                        question(
                            "A BUD may exceed the expiry date of any component.",
                            ["True", "False", "Only if refrigerated", "Only for solids"],
                            1,
                        ),
                    ],
                }),
            },
        )
        .await?;

    app_state
        .training_service
        .change_status(
            conn,
            tenant_id,
            admin,
            training.training.id,
            TrainingStatusPayload {
                status: TrainingStatus::Published,
                comment: Some("Seeded".into()),
            },
        )
        .await?;

    app_state
        .assignment_service
        .assign(
            conn,
            tenant_id,
            admin,
            AssignTrainingPayload {
                training_id: training.training.id,
                user_ids: vec![trainee.id],
                due_date: Some(Utc::now().date_naive() + Duration::days(7)),
            },
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use sqlx::PgPool;

    fn state(pool: PgPool) -> AppState {
        let config = Config {
            database_url: String::new(),
            jwt_secret: "seed-test-secret".into(),
            jwt_ttl_hours: 1,
            bind_addr: "127.0.0.1:0".into(),
            db_max_connections: 1,
            fonts_dir: "./fonts".into(),
        };
        AppState::from_pool(pool, &config)
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn seeding_twice_is_a_no_op_even_for_an_inactive_tenant(pool: PgPool) {
        let app = state(pool.clone());
        run(&app).await.unwrap();

        let tenant = app.tenant_service.find_any(DEMO_SUBDOMAIN).await.unwrap().unwrap();
        sqlx::query("UPDATE tenants SET is_active = FALSE WHERE id = $1")
            .bind(tenant.id)
            .execute(&pool)
            .await
            .unwrap();
        assert!(matches!(
            app.tenant_service.lookup(DEMO_SUBDOMAIN).await,
            Err(AppError::NotFound(_))
        ));

        run(&app).await.unwrap();

        let tenants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE subdomain = $1")
            .bind(DEMO_SUBDOMAIN)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(tenants, 1);
    }
}
