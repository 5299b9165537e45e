// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::lookup_tenant,
        handlers::tenancy::get_current_tenant,
        handlers::tenancy::update_current_tenant,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::change_password,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Documents ---
        handlers::documents::list_documents,
        handlers::documents::document_stats,
        handlers::documents::get_document,
        handlers::documents::document_history,
        handlers::documents::create_document,
        handlers::documents::update_document,
        handlers::documents::change_document_status,
        handlers::documents::revise_document,
        handlers::documents::delete_document,

        // --- Deviations ---
        handlers::deviations::list_deviations,
        handlers::deviations::deviation_stats,
        handlers::deviations::get_deviation,
        handlers::deviations::deviation_history,
        handlers::deviations::create_deviation,
        handlers::deviations::update_deviation,
        handlers::deviations::change_deviation_status,
        handlers::deviations::raise_capa,
        handlers::deviations::delete_deviation,

        // --- CAPA ---
        handlers::capas::list_capas,
        handlers::capas::capa_stats,
        handlers::capas::get_capa,
        handlers::capas::capa_history,
        handlers::capas::create_capa,
        handlers::capas::update_capa,
        handlers::capas::change_capa_status,
        handlers::capas::record_effectiveness,
        handlers::capas::delete_capa,

        // --- Change control ---
        handlers::change_controls::list_change_controls,
        handlers::change_controls::change_control_stats,
        handlers::change_controls::get_change_control,
        handlers::change_controls::change_control_history,
        handlers::change_controls::create_change_control,
        handlers::change_controls::update_change_control,
        handlers::change_controls::update_change_control_status,
        handlers::change_controls::delete_change_control,

        // --- Audits ---
        handlers::audits::list_audits,
        handlers::audits::audit_stats,
        handlers::audits::get_audit,
        handlers::audits::audit_history,
        handlers::audits::create_audit,
        handlers::audits::update_audit,
        handlers::audits::change_audit_status,
        handlers::audits::set_audit_findings,
        handlers::audits::delete_audit,

        // --- Training ---
        handlers::trainings::list_trainings,
        handlers::trainings::training_stats,
        handlers::trainings::get_training,
        handlers::trainings::training_history,
        handlers::trainings::create_training,
        handlers::trainings::update_training,
        handlers::trainings::change_training_status,
        handlers::trainings::set_training_exam,
        handlers::trainings::remove_training_exam,
        handlers::trainings::delete_training,
        handlers::trainings::get_exam,

        // --- Training assignments ---
        handlers::assignments::assign_training,
        handlers::assignments::list_assignments,
        handlers::assignments::my_assignments,
        handlers::assignments::get_assignment,
        handlers::assignments::record_progress,
        handlers::assignments::complete_content,
        handlers::assignments::submit_exam,

        // --- Certificates ---
        handlers::certificates::list_certificates,
        handlers::certificates::get_certificate,
        handlers::certificates::issue_certificate,
        handlers::certificates::revoke_certificate,
        handlers::certificates::certificate_pdf,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::unread_count,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,
        handlers::notifications::delete_notification,
        handlers::notifications::send_reminders,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            // --- Tenancy ---
            models::tenancy::Branding,
            models::tenancy::Features,
            models::tenancy::Tenant,
            models::tenancy::TenantPublicInfo,
            models::tenancy::CreateTenantPayload,
            models::tenancy::UpdateTenantPayload,
            models::tenancy::OnboardingResponse,

            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::ChangePasswordPayload,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,

            // --- Shared ---
            models::workflow::StatusHistoryEntry,
            models::workflow::CountEntry,
            models::workflow::ModuleStats,

            // --- Documents ---
            models::documents::DocumentType,
            models::documents::DocumentStatus,
            models::documents::Document,
            models::documents::CreateDocumentPayload,
            models::documents::UpdateDocumentPayload,
            models::documents::DocumentStatusPayload,

            // --- Deviations ---
            models::deviations::Severity,
            models::deviations::DeviationStatus,
            models::deviations::Deviation,
            models::deviations::CreateDeviationPayload,
            models::deviations::UpdateDeviationPayload,
            models::deviations::DeviationStatusPayload,
            models::deviations::RaiseCapaPayload,
            handlers::deviations::DeviationCapaResponse,

            // --- CAPA ---
            models::capas::CapaType,
            models::capas::Priority,
            models::capas::EffectivenessResult,
            models::capas::CapaStatus,
            models::capas::Capa,
            models::capas::CreateCapaPayload,
            models::capas::UpdateCapaPayload,
            models::capas::CapaStatusPayload,
            models::capas::EffectivenessCheckPayload,

            // --- Change control ---
            models::change_controls::ChangeType,
            models::change_controls::ChangeControlStatus,
            models::change_controls::ChangeControl,
            models::change_controls::CreateChangeControlPayload,
            models::change_controls::UpdateChangeControlPayload,
            models::change_controls::ChangeControlStatusPayload,

            // --- Audits ---
            models::audits::AuditType,
            models::audits::AuditStatus,
            models::audits::Audit,
            models::audits::CreateAuditPayload,
            models::audits::UpdateAuditPayload,
            models::audits::AuditFindingsPayload,
            models::audits::AuditStatusPayload,

            // --- Training ---
            models::training::TrainingStatus,
            models::training::ContentType,
            models::training::AssignmentStatus,
            models::training::Training,
            models::training::TrainingContent,
            models::training::Exam,
            models::training::ExamQuestion,
            models::training::ExamQuestionView,
            models::training::ExamDetail,
            models::training::ExamView,
            models::training::TrainingDetail,
            models::training::TrainingAssignment,
            models::training::ContentProgress,
            models::training::ExamAttempt,
            models::training::AssignmentListItem,
            models::training::ContentProgressView,
            models::training::AssignmentDetail,
            models::training::ExamSubmissionResult,
            models::training::ContentInput,
            models::training::QuestionInput,
            models::training::ExamInput,
            models::training::CreateTrainingPayload,
            models::training::UpdateTrainingPayload,
            models::training::TrainingStatusPayload,
            models::training::AssignTrainingPayload,
            models::training::ProgressPayload,
            models::training::SubmitExamPayload,

            // --- Certificates ---
            models::certificates::ExpiryStatus,
            models::certificates::Certificate,
            models::certificates::CertificateView,
            models::certificates::IssueCertificatePayload,

            // --- Notifications ---
            models::notifications::NotificationType,
            models::notifications::Notification,
            models::notifications::UnreadCount,
            models::notifications::ReminderSummary,
            handlers::notifications::MarkAllReadResponse,

            // --- Dashboard ---
            models::dashboard::DashboardCounters,
            models::dashboard::DashboardSummary,
        )
    ),
    tags(
        (name = "Tenancy", description = "Onboarding, login-screen lookup and tenant settings"),
        (name = "Auth", description = "Login and the current user"),
        (name = "Users", description = "User management inside a tenant"),
        (name = "Documents", description = "Controlled documents (SOPs, policies, forms)"),
        (name = "Deviations", description = "Deviation reports"),
        (name = "CAPA", description = "Corrective and preventive actions"),
        (name = "Change Control", description = "Change requests"),
        (name = "Audits", description = "Internal and external audits"),
        (name = "Training", description = "Trainings, contents and exams"),
        (name = "Training Assignments", description = "Per-user progress, gating and exam attempts"),
        (name = "Certificates", description = "Issued training certificates"),
        (name = "Notifications", description = "In-app notifications and reminders"),
        (name = "Dashboard", description = "Landing page counters")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
