pub mod scoped;
pub mod sequence_repo;

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod history_repo;
pub use history_repo::HistoryRepository;
pub mod document_repo;
pub use document_repo::DocumentRepository;
pub mod deviation_repo;
pub use deviation_repo::DeviationRepository;
pub mod capa_repo;
pub use capa_repo::CapaRepository;
pub mod change_control_repo;
pub use change_control_repo::ChangeControlRepository;
pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod training_repo;
pub use training_repo::TrainingRepository;
pub mod assignment_repo;
pub use assignment_repo::AssignmentRepository;
pub mod certificate_repo;
pub use certificate_repo::CertificateRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
