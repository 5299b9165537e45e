// src/services/notification_service.rs

use chrono::{Duration, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination},
    db::{AssignmentRepository, CertificateRepository, NotificationRepository},
    models::{
        certificates::EXPIRING_SOON_DAYS,
        notifications::{NewNotification, Notification, NotificationFilter, NotificationType, ReminderSummary, UnreadCount},
    },
};

/// How far ahead a due date triggers a `training_due` reminder.
pub const DUE_SOON_DAYS: i64 = 7;

#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    assignment_repo: AssignmentRepository,
    certificate_repo: CertificateRepository,
}

impl NotificationService {
    pub fn new(
        notification_repo: NotificationRepository,
        assignment_repo: AssignmentRepository,
        certificate_repo: CertificateRepository,
    ) -> Self {
        Self { notification_repo, assignment_repo, certificate_repo }
    }

    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, AppError> {
        let (limit, offset) = pagination::page(filter.limit, filter.offset);
        self.notification_repo
            .list(&mut *conn, tenant_id, user_id, filter.unread.unwrap_or(false), limit, offset)
            .await
    }

    pub async fn unread_count(&self, conn: &mut PgConnection, tenant_id: Uuid, user_id: Uuid) -> Result<UnreadCount, AppError> {
        let count = self.notification_repo.unread_count(&mut *conn, tenant_id, user_id).await?;
        Ok(UnreadCount { count })
    }

    pub async fn mark_read(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Notification, AppError> {
        self.notification_repo
            .mark_read(&mut *conn, tenant_id, user_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification"))
    }

    pub async fn mark_all_read(&self, conn: &mut PgConnection, tenant_id: Uuid, user_id: Uuid) -> Result<u64, AppError> {
        self.notification_repo.mark_all_read(&mut *conn, tenant_id, user_id).await
    }

    pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if self.notification_repo.delete(&mut *conn, tenant_id, user_id, id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Notification"))
        }
    }

    /// Reminder sweep. Each assignment or certificate gets at most one reminder
    /// of each kind per day, so the sweep can run repeatedly. Completed
    /// assignments whose certificate has expired move to `expired`.
    pub async fn send_reminders(&self, conn: &mut PgConnection, tenant_id: Uuid) -> Result<ReminderSummary, AppError> {
        let now = Utc::now();
        let today = now.date_naive();
        let mut summary = ReminderSummary { training_due: 0, certificate_expiring: 0, assignments_expired: 0 };

        let due = self
            .assignment_repo
            .due_between(&mut *conn, tenant_id, today, today + Duration::days(DUE_SOON_DAYS))
            .await?;
        for assignment in due {
            if self
                .notification_repo
                .sent_on(&mut *conn, tenant_id, assignment.user_id, NotificationType::TrainingDue, assignment.id, today)
                .await?
            {
                continue;
            }
            let days_left = (assignment.due_date - today).num_days();
            self.notification_repo
                .create(
                    &mut *conn,
                    tenant_id,
                    &NewNotification {
                        user_id: assignment.user_id,
                        notification_type: NotificationType::TrainingDue,
                        title: "Training due soon".into(),
                        message: due_message(&assignment.training_title, days_left),
                        assignment_id: Some(assignment.id),
                        certificate_id: None,
                    },
                )
                .await?;
            summary.training_due += 1;
        }

        let expiring = self
            .certificate_repo
            .expiring_between(&mut *conn, tenant_id, now, now + Duration::days(EXPIRING_SOON_DAYS))
            .await?;
        for certificate in expiring {
            if self
                .notification_repo
                .sent_on(
                    &mut *conn,
                    tenant_id,
                    certificate.user_id,
                    NotificationType::CertificateExpiring,
                    certificate.id,
                    today,
                )
                .await?
            {
                continue;
            }
            let expires = certificate
                .expires_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            self.notification_repo
                .create(
                    &mut *conn,
                    tenant_id,
                    &NewNotification {
                        user_id: certificate.user_id,
                        notification_type: NotificationType::CertificateExpiring,
                        title: "Certificate expiring".into(),
                        message: format!(
                            "Your certificate {} for \"{}\" expires on {}.",
                            certificate.certificate_number, certificate.training_title, expires
                        ),
                        assignment_id: Some(certificate.assignment_id),
                        certificate_id: Some(certificate.id),
                    },
                )
                .await?;
            summary.certificate_expiring += 1;
        }

        summary.assignments_expired = self.assignment_repo.expire_lapsed(&mut *conn, tenant_id, now).await?;

        tracing::info!(
            training_due = summary.training_due,
            certificate_expiring = summary.certificate_expiring,
            assignments_expired = summary.assignments_expired,
            "reminders sent"
        );
        Ok(summary)
    }
}

fn due_message(title: &str, days_left: i64) -> String {
    match days_left {
        0 => format!("\"{}\" is due today.", title),
        1 => format!("\"{}\" is due tomorrow.", title),
        n => format!("\"{}\" is due in {} days.", title, n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_messages_read_naturally() {
        assert_eq!(due_message("BUD", 0), "\"BUD\" is due today.");
        assert_eq!(due_message("BUD", 1), "\"BUD\" is due tomorrow.");
        assert_eq!(due_message("BUD", 5), "\"BUD\" is due in 5 days.");
    }
}
