pub mod assignment_service;
pub mod audit_service;
pub mod auth;
pub mod capa_service;
pub mod certificate_service;
pub mod change_control_service;
pub mod dashboard_service;
pub mod deviation_service;
pub mod document_service;
pub mod notification_service;
pub mod tenancy_service;
pub mod training_service;
pub mod user_service;

#[cfg(test)]
mod workflow_tests;
