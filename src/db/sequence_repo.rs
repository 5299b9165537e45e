// src/db/sequence_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;

/// Bumps and returns the counter for `(tenant, prefix, year)`, starting at 1.
/// The row lock taken by the upsert serialises concurrent creators.
pub async fn next_value<'e, E>(
    executor: E,
    tenant_id: Uuid,
    prefix: &str,
    year: i32,
) -> Result<i32, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let value = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO number_sequences (tenant_id, prefix, year, last_value)
        VALUES ($1, $2, $3, 1)
        ON CONFLICT (tenant_id, prefix, year)
        DO UPDATE SET last_value = number_sequences.last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(tenant_id)
    .bind(prefix)
    .bind(year)
    .fetch_one(executor)
    .await?;
    Ok(value)
}
