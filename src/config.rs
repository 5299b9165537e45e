// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{
        AuditRepository, CapaRepository, CertificateRepository, ChangeControlRepository,
        DashboardRepository, DeviationRepository, DocumentRepository, HistoryRepository,
        NotificationRepository, TenantRepository, TrainingRepository, AssignmentRepository,
        UserRepository,
    },
    services::{
        assignment_service::AssignmentService, audit_service::AuditService, auth::AuthService,
        capa_service::CapaService, certificate_service::CertificateService,
        change_control_service::ChangeControlService, dashboard_service::DashboardService,
        deviation_service::DeviationService, document_service::DocumentService,
        notification_service::NotificationService, tenancy_service::TenantService,
        training_service::TrainingService, user_service::UserService,
    },
};

/// Process configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub fonts_dir: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 168)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            fonts_dir: env::var("FONTS_DIR").unwrap_or_else(|_| "./fonts".to_string()),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("{} has an invalid value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub user_service: UserService,
    pub document_service: DocumentService,
    pub deviation_service: DeviationService,
    pub capa_service: CapaService,
    pub change_control_service: ChangeControlService,
    pub audit_service: AuditService,
    pub training_service: TrainingService,
    pub assignment_service: AssignmentService,
    pub certificate_service: CertificateService,
    pub notification_service: NotificationService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("failed to connect to the database")?;

        tracing::info!("Database connection established");

        Ok(Self::from_pool(db_pool, config))
    }

    /// Wires repositories into services around an existing pool.
    pub fn from_pool(db_pool: PgPool, config: &Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let history_repo = HistoryRepository::new();
        let notification_repo = NotificationRepository::new();
        let certificate_repo = CertificateRepository::new();
        let training_repo = TrainingRepository::new();
        let assignment_repo = AssignmentRepository::new();
        let capa_repo = CapaRepository::new();
        let deviation_repo = DeviationRepository::new();

        let auth_service = AuthService::new(
            user_repo.clone(),
            tenant_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
        );
        let tenant_service = TenantService::new(
            tenant_repo.clone(),
            user_repo.clone(),
            auth_service.clone(),
            db_pool.clone(),
        );
        let user_service = UserService::new(user_repo.clone());
        let document_service = DocumentService::new(DocumentRepository::new(), history_repo.clone());
        let capa_service = CapaService::new(
            capa_repo.clone(),
            deviation_repo.clone(),
            history_repo.clone(),
        );
        let deviation_service = DeviationService::new(
            deviation_repo,
            capa_repo,
            history_repo.clone(),
        );
        let change_control_service =
            ChangeControlService::new(ChangeControlRepository::new(), history_repo.clone());
        let audit_service = AuditService::new(AuditRepository::new(), history_repo.clone());
        let training_service = TrainingService::new(training_repo.clone(), history_repo);
        let certificate_service = CertificateService::new(
            certificate_repo.clone(),
            assignment_repo.clone(),
            training_repo.clone(),
            notification_repo.clone(),
            config.fonts_dir.clone(),
        );
        let assignment_service = AssignmentService::new(
            assignment_repo.clone(),
            training_repo,
            user_repo,
            notification_repo.clone(),
            certificate_service.clone(),
        );
        let notification_service =
            NotificationService::new(notification_repo, assignment_repo, certificate_repo);
        let dashboard_service = DashboardService::new(DashboardRepository::new());

        Self {
            db_pool,
            auth_service,
            tenant_service,
            user_service,
            document_service,
            deviation_service,
            capa_service,
            change_control_service,
            audit_service,
            training_service,
            assignment_service,
            certificate_service,
            notification_service,
            dashboard_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_when_unset() {
        let value: u32 = parse_or("QMS_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
