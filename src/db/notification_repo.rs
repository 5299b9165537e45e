// src/db/notification_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::notifications::{NewNotification, Notification, NotificationType},
};

/// Every query is scoped to the recipient as well as the tenant.
#[derive(Clone, Default)]
pub struct NotificationRepository;

impl NotificationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE tenant_id = $1 AND user_id = $2 AND (NOT $3 OR NOT is_read)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(notifications)
    }

    pub async fn unread_count<'e, E>(&self, executor: E, tenant_id: Uuid, user_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE tenant_id = $1 AND user_id = $2 AND NOT is_read",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        notification: &NewNotification,
    ) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (
                tenant_id, user_id, notification_type, title, message, assignment_id, certificate_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(notification.user_id)
        .bind(notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.assignment_id)
        .bind(notification.certificate_id)
        .fetch_one(executor)
        .await?;
        Ok(saved)
    }

    pub async fn mark_read<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE tenant_id = $1 AND user_id = $2 AND id = $3
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(notification)
    }

    pub async fn mark_all_read<'e, E>(&self, executor: E, tenant_id: Uuid, user_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET is_read = TRUE, read_at = NOW()
            WHERE tenant_id = $1 AND user_id = $2 AND NOT is_read
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, user_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM notifications WHERE tenant_id = $1 AND user_id = $2 AND id = $3")
            .bind(tenant_id)
            .bind(user_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether a reminder of `kind` about the same assignment or certificate
    /// already went to the user on `day`.
    pub async fn sent_on<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
        kind: NotificationType,
        target_id: Uuid,
        day: NaiveDate,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM notifications
                WHERE tenant_id = $1 AND user_id = $2 AND notification_type = $3
                  AND (assignment_id = $4 OR certificate_id = $4)
                  AND (created_at AT TIME ZONE 'UTC')::date = $5
            )
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(kind)
        .bind(target_id)
        .bind(day)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }
}
