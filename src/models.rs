pub mod auth;
pub mod tenancy;
pub mod workflow;

pub mod documents;
pub mod deviations;
pub mod capas;
pub mod change_controls;
pub mod audits;

pub mod training;
pub mod certificates;
pub mod notifications;
pub mod dashboard;
