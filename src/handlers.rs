pub mod assignments;
pub mod audits;
pub mod auth;
pub mod capas;
pub mod certificates;
pub mod change_controls;
pub mod dashboard;
pub mod deviations;
pub mod documents;
pub mod notifications;
pub mod tenancy;
pub mod trainings;
pub mod users;
