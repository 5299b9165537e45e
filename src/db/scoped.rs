// src/db/scoped.rs

//! Queries shared by every tenant-owned table. Table and column names are
//! compile-time constants from the repositories, never request input.

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::workflow::CountEntry};

pub async fn count_by<'e, E>(
    executor: E,
    table: &'static str,
    column: &'static str,
    tenant_id: Uuid,
) -> Result<Vec<CountEntry>, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "SELECT {column}::text AS key, COUNT(*) AS count FROM {table} \
         WHERE tenant_id = $1 GROUP BY {column} ORDER BY {column}"
    );
    let counts = sqlx::query_as::<_, CountEntry>(&sql)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
    Ok(counts)
}

/// Returns whether a row was deleted.
pub async fn delete_by_id<'e, E>(
    executor: E,
    table: &'static str,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("DELETE FROM {table} WHERE tenant_id = $1 AND id = $2");
    let result = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
