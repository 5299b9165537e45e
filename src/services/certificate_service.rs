// src/services/certificate_service.rs

use chrono::{Duration, Utc};
use genpdf::{elements, style, Alignment, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        numbering::{next_number, CERTIFICATE_PREFIX},
        pagination,
    },
    db::{
        certificate_repo::NewCertificate, AssignmentRepository, CertificateRepository, NotificationRepository,
        TrainingRepository,
    },
    middleware::rbac::TRAINING_MANAGE,
    models::{
        auth::User,
        certificates::{
            compute_expiry, Certificate, CertificateFilter, CertificateView, IssueCertificatePayload,
            EXPIRING_SOON_DAYS,
        },
        notifications::{NewNotification, NotificationType},
        tenancy::Tenant,
        training::{AssignmentStatus, TrainingAssignment},
    },
};

#[derive(Clone)]
pub struct CertificateService {
    certificate_repo: CertificateRepository,
    assignment_repo: AssignmentRepository,
    training_repo: TrainingRepository,
    notification_repo: NotificationRepository,
    fonts_dir: String,
}

impl CertificateService {
    pub fn new(
        certificate_repo: CertificateRepository,
        assignment_repo: AssignmentRepository,
        training_repo: TrainingRepository,
        notification_repo: NotificationRepository,
        fonts_dir: String,
    ) -> Self {
        Self { certificate_repo, assignment_repo, training_repo, notification_repo, fonts_dir }
    }

    /// Non-managers only ever see their own certificates.
    pub async fn list(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        viewer: &User,
        filter: &CertificateFilter,
    ) -> Result<Vec<CertificateView>, AppError> {
        let (limit, offset) = pagination::page(filter.limit, filter.offset);
        let user_id = if viewer.has_permission(TRAINING_MANAGE) {
            filter.user_id
        } else {
            Some(viewer.id)
        };

        let now = Utc::now();
        let expires_before = filter
            .expiring
            .unwrap_or(false)
            .then(|| now + Duration::days(EXPIRING_SOON_DAYS));

        let certificates = self
            .certificate_repo
            .list(
                &mut *conn,
                tenant_id,
                user_id,
                filter.training_id,
                now,
                expires_before,
                filter.expired.unwrap_or(false),
                limit,
                offset,
            )
            .await?;

        Ok(certificates.into_iter().map(|c| CertificateView::new(c, now)).collect())
    }

    pub async fn get(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        viewer: &User,
        id: Uuid,
    ) -> Result<CertificateView, AppError> {
        let certificate = self
            .certificate_repo
            .find_by_id(&mut *conn, tenant_id, id)
            .await?
            .filter(|c| c.user_id == viewer.id || viewer.has_permission(TRAINING_MANAGE))
            .ok_or_else(|| AppError::not_found("Certificate"))?;
        Ok(CertificateView::new(certificate, Utc::now()))
    }

    /// Issues the certificate of a finished assignment and notifies the holder.
    /// `issued_by` is `None` for certificates earned by passing the exam.
    pub async fn issue_for_assignment(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        assignment: &TrainingAssignment,
        issued_by: Option<Uuid>,
        score: Option<Decimal>,
    ) -> Result<Certificate, AppError> {
        let training = self
            .training_repo
            .find_by_id(&mut *conn, tenant_id, assignment.training_id, false)
            .await?
            .ok_or_else(|| AppError::not_found("Training"))?;

        let issued_at = Utc::now();
        let number = next_number(&mut *conn, tenant_id, CERTIFICATE_PREFIX).await?;
        let certificate = self
            .certificate_repo
            .create(
                &mut *conn,
                tenant_id,
                &NewCertificate {
                    certificate_number: number,
                    user_id: assignment.user_id,
                    training_id: assignment.training_id,
                    assignment_id: assignment.id,
                    issued_at,
                    expires_at: compute_expiry(issued_at, training.validity_months),
                    issued_by,
                    score,
                },
            )
            .await?;

        self.assignment_repo
            .attach_certificate(&mut *conn, tenant_id, assignment.id, certificate.id)
            .await?;

        self.notification_repo
            .create(
                &mut *conn,
                tenant_id,
                &NewNotification {
                    user_id: assignment.user_id,
                    notification_type: NotificationType::CertificateIssued,
                    title: "Certificate issued".into(),
                    message: format!(
                        "Your certificate {} for \"{}\" is available.",
                        certificate.certificate_number, training.title
                    ),
                    assignment_id: Some(assignment.id),
                    certificate_id: Some(certificate.id),
                },
            )
            .await?;

        tracing::info!(
            certificate = %certificate.certificate_number,
            user_id = %certificate.user_id,
            automatic = issued_by.is_none(),
            "certificate issued"
        );
        Ok(certificate)
    }

    /// Manual issue by a training manager. A content-complete assignment is
    /// closed as completed on the way.
    pub async fn issue_manual(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        user: &User,
        payload: IssueCertificatePayload,
    ) -> Result<CertificateView, AppError> {
        let mut assignment = self
            .assignment_repo
            .find_by_id(&mut *conn, tenant_id, payload.assignment_id, true)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment"))?;

        if assignment.certificate_id.is_some() {
            return Err(AppError::Conflict("This assignment already holds a certificate.".into()));
        }
        match assignment.status {
            AssignmentStatus::Completed => {}
            AssignmentStatus::ContentCompleted => {
                assignment = self
                    .assignment_repo
                    .set_status(&mut *conn, tenant_id, assignment.id, AssignmentStatus::Completed)
                    .await?;
            }
            _ => {
                return Err(AppError::BusinessRule(
                    "Certificates can only be issued once all training content is completed.".into(),
                ))
            }
        }

        let best_score = self
            .assignment_repo
            .list_attempts(&mut *conn, tenant_id, assignment.id)
            .await?
            .into_iter()
            .map(|a| a.percentage)
            .max();

        let certificate = self
            .issue_for_assignment(conn, tenant_id, &assignment, Some(user.id), best_score)
            .await?;
        Ok(CertificateView::new(certificate, Utc::now()))
    }

    pub async fn revoke(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<CertificateView, AppError> {
        let certificate = self
            .certificate_repo
            .find_by_id(&mut *conn, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Certificate"))?;
        if !self.certificate_repo.revoke(&mut *conn, tenant_id, id).await? {
            return Err(AppError::Conflict(format!(
                "Certificate {} is already revoked.",
                certificate.certificate_number
            )));
        }

        tracing::info!(certificate = %certificate.certificate_number, "certificate revoked");
        let revoked = self
            .certificate_repo
            .find_by_id(&mut *conn, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Certificate"))?;
        Ok(CertificateView::new(revoked, Utc::now()))
    }

    /// Renders the printable certificate. Layout runs on a blocking thread.
    pub async fn pdf(
        &self,
        conn: &mut PgConnection,
        tenant: &Tenant,
        viewer: &User,
        id: Uuid,
    ) -> Result<(String, Vec<u8>), AppError> {
        let view = self.get(conn, tenant.id, viewer, id).await?;
        let issuer = tenant
            .branding
            .company_name
            .clone()
            .unwrap_or_else(|| tenant.name.clone());
        let fonts_dir = self.fonts_dir.clone();
        let file_name = format!("{}.pdf", view.certificate.certificate_number);

        let bytes = tokio::task::spawn_blocking(move || render_certificate(&view, &issuer, &fonts_dir))
            .await
            .map_err(|e| anyhow::anyhow!("certificate rendering task failed: {}", e))??;
        Ok((file_name, bytes))
    }
}

fn render_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

pub fn render_certificate(view: &CertificateView, issuer: &str, fonts_dir: &str) -> Result<Vec<u8>, AppError> {
    let certificate = &view.certificate;

    let font_family = genpdf::fonts::from_files(fonts_dir, "Roboto", None)
        .map_err(|_| AppError::FontNotFound(format!("Roboto font files are missing from {}", fonts_dir)))?;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Certificate {}", certificate.certificate_number));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(20);
    doc.set_page_decorator(decorator);

    let centered = |text: String, style: style::Style| {
        let mut paragraph = elements::Paragraph::new(text);
        paragraph.set_alignment(Alignment::Center);
        paragraph.styled(style)
    };

    doc.push(centered(issuer.to_string(), style::Style::new().bold().with_font_size(16)));
    doc.push(elements::Break::new(2));
    doc.push(centered("CERTIFICATE OF TRAINING".into(), style::Style::new().bold().with_font_size(22)));
    doc.push(elements::Break::new(2));
    doc.push(centered("This certifies that".into(), style::Style::new().with_font_size(12)));
    doc.push(elements::Break::new(1));
    doc.push(centered(certificate.holder_name.clone(), style::Style::new().bold().with_font_size(20)));
    doc.push(elements::Break::new(1));
    doc.push(centered("has successfully completed".into(), style::Style::new().with_font_size(12)));
    doc.push(elements::Break::new(1));
    doc.push(centered(certificate.training_title.clone(), style::Style::new().bold().with_font_size(16)));
    doc.push(elements::Break::new(2));

    let mut table = elements::TableLayout::new(vec![1, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
    let bold = style::Style::new().bold();

    let mut rows = vec![
        ("Certificate", certificate.certificate_number.clone()),
        ("Issued", certificate.issued_at.format("%Y-%m-%d").to_string()),
        (
            "Valid until",
            certificate
                .expires_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "No expiry".to_string()),
        ),
    ];
    if let Some(score) = certificate.score {
        rows.push(("Score", format!("{}%", score.round_dp(2))));
    }
    if certificate.revoked {
        rows.push(("Status", "REVOKED".to_string()));
    }

    for (label, value) in rows {
        table
            .row()
            .element(elements::Paragraph::new(label).styled(bold))
            .element(elements::Paragraph::new(value))
            .push()
            .map_err(render_error)?;
    }
    doc.push(table);
    doc.push(elements::Break::new(2));

    let code = QrCode::new(certificate.certificate_number.as_bytes()).map_err(render_error)?;
    let image_buffer = code.render::<Luma<u8>>().build();
    let qr_image = elements::Image::from_dynamic_image(image::DynamicImage::ImageLuma8(image_buffer))
        .map_err(render_error)?
        .with_alignment(Alignment::Center)
        .with_scale(genpdf::Scale::new(0.5, 0.5));
    doc.push(qr_image);

    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(render_error)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::certificates::ExpiryStatus;

    fn sample_view() -> CertificateView {
        let issued_at = Utc::now();
        CertificateView::new(
            Certificate {
                id: Uuid::new_v4(),
                tenant_id: Uuid::new_v4(),
                certificate_number: "CERT-2025-001".into(),
                user_id: Uuid::new_v4(),
                training_id: Uuid::new_v4(),
                assignment_id: Uuid::new_v4(),
                issued_at,
                expires_at: compute_expiry(issued_at, 12),
                issued_by: None,
                score: Some(Decimal::from(90)),
                revoked: false,
                revoked_at: None,
                training_title: "Beyond-use dating".into(),
                holder_name: "Ana Costa".into(),
            },
            issued_at,
        )
    }

    #[test]
    fn fresh_certificate_is_valid() {
        assert_eq!(sample_view().expiry_status, ExpiryStatus::Valid);
    }

    #[test]
    fn missing_fonts_are_reported() {
        let result = render_certificate(&sample_view(), "Demo Pharmacy", "/nonexistent/fonts");
        assert!(matches!(result, Err(AppError::FontNotFound(_))));
    }
}
