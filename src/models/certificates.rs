// src/models/certificates.rs

use chrono::{DateTime, Duration, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const EXPIRING_SOON_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Valid,
    ExpiringSoon,
    Expired,
    NoExpiry,
}

pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at < now
}

/// `0 <= expires_at - now < 30 days`.
pub fn is_expiring_soon(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let remaining = expires_at - now;
    remaining >= Duration::zero() && remaining < Duration::days(EXPIRING_SOON_DAYS)
}

pub fn expiry_status(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> ExpiryStatus {
    match expires_at {
        None => ExpiryStatus::NoExpiry,
        Some(at) if is_expired(at, now) => ExpiryStatus::Expired,
        Some(at) if is_expiring_soon(at, now) => ExpiryStatus::ExpiringSoon,
        Some(_) => ExpiryStatus::Valid,
    }
}

/// `None` when the training's certificates never expire.
pub fn compute_expiry(issued_at: DateTime<Utc>, validity_months: i32) -> Option<DateTime<Utc>> {
    if validity_months <= 0 {
        return None;
    }
    issued_at.checked_add_months(Months::new(validity_months as u32))
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "CERT-2025-001")]
    pub certificate_number: String,
    pub user_id: Uuid,
    pub training_id: Uuid,
    pub assignment_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` when issued automatically after passing the exam.
    pub issued_by: Option<Uuid>,
    #[schema(value_type = Option<f64>, example = 92.5)]
    pub score: Option<Decimal>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    // Joined for display.
    pub training_title: String,
    pub holder_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateView {
    #[serde(flatten)]
    pub certificate: Certificate,
    pub expiry_status: ExpiryStatus,
}

impl CertificateView {
    pub fn new(certificate: Certificate, now: DateTime<Utc>) -> Self {
        let expiry_status = expiry_status(certificate.expires_at, now);
        Self { certificate, expiry_status }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCertificatePayload {
    pub assignment_id: Uuid,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CertificateFilter {
    pub user_id: Option<Uuid>,
    pub training_id: Option<Uuid>,
    /// Only certificates expiring within 30 days.
    pub expiring: Option<bool>,
    pub expired: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn expired_iff_in_the_past() {
        let now = at(2025, 6, 1);
        assert!(is_expired(at(2025, 5, 31), now));
        assert!(!is_expired(now, now));
        assert!(!is_expired(at(2025, 6, 2), now));
    }

    #[test]
    fn expiring_soon_window_is_half_open() {
        let now = at(2025, 6, 1);
        assert!(is_expiring_soon(now, now));
        assert!(is_expiring_soon(now + Duration::days(29), now));
        assert!(!is_expiring_soon(now + Duration::days(30), now));
        assert!(!is_expiring_soon(now - Duration::seconds(1), now));
    }

    #[test]
    fn status_precedence() {
        let now = at(2025, 6, 1);
        assert_eq!(expiry_status(None, now), ExpiryStatus::NoExpiry);
        assert_eq!(expiry_status(Some(at(2025, 1, 1)), now), ExpiryStatus::Expired);
        assert_eq!(expiry_status(Some(at(2025, 6, 10)), now), ExpiryStatus::ExpiringSoon);
        assert_eq!(expiry_status(Some(at(2026, 6, 1)), now), ExpiryStatus::Valid);
    }

    #[test]
    fn expiry_adds_calendar_months() {
        assert_eq!(compute_expiry(at(2025, 1, 31), 1), Some(at(2025, 2, 28)));
        assert_eq!(compute_expiry(at(2025, 3, 15), 12), Some(at(2026, 3, 15)));
        assert_eq!(compute_expiry(at(2025, 3, 15), 0), None);
    }
}
