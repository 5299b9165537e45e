// src/common/db_utils.rs

use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::TenantContext;

/// Sets `app.tenant_id` for the row-level security policies, local to the
/// current transaction.
pub(crate) async fn set_tenant_scope(conn: &mut PgConnection, tenant_id: Uuid) -> Result<(), AppError> {
    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant_id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Opens a transaction with `app.tenant_id` / `app.user_id` set. The settings
/// are transaction-local, so the pooled connection carries nothing over once
/// the transaction ends.
pub(crate) async fn begin_tenant_tx(
    app_state: &AppState,
    tenant_ctx: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = app_state.db_pool.begin().await?;

    set_tenant_scope(&mut *tx, tenant_ctx.0).await?;
    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user.0.id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
