// src/common/numbering.rs

use chrono::{Datelike, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{common::error::AppError, db::sequence_repo};

pub const DOCUMENT_PREFIX: &str = "DOC";
pub const DEVIATION_PREFIX: &str = "DEV";
pub const CAPA_PREFIX: &str = "CAPA";
pub const CHANGE_CONTROL_PREFIX: &str = "CC";
pub const AUDIT_PREFIX: &str = "AUD";
pub const CERTIFICATE_PREFIX: &str = "CERT";

/// `DEV-2025-001`. Sequences past 999 simply grow wider.
pub fn format_number(prefix: &str, year: i32, sequence: i32) -> String {
    format!("{}-{}-{:03}", prefix, year, sequence)
}

/// Allocates the next business number for the tenant inside the caller's transaction.
pub async fn next_number(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    prefix: &str,
) -> Result<String, AppError> {
    let year = Utc::now().year();
    let sequence = sequence_repo::next_value(&mut *conn, tenant_id, prefix, year).await?;
    Ok(format_number(prefix, year, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_three_digits() {
        assert_eq!(format_number(DEVIATION_PREFIX, 2025, 1), "DEV-2025-001");
        assert_eq!(format_number(CAPA_PREFIX, 2025, 42), "CAPA-2025-042");
    }

    #[test]
    fn keeps_growing_after_999() {
        assert_eq!(format_number(CHANGE_CONTROL_PREFIX, 2026, 1234), "CC-2026-1234");
    }
}
