// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{auth::tenant_guard, tenancy::require_feature},
    models::tenancy::Feature,
};

/// The tenant's feature toggle for a group of routes. Runs inside `tenant_guard`.
fn gated(feature: Feature, routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(axum_middleware::from_fn_with_state(feature, require_feature))
}

pub fn create_router(app_state: AppState) -> Router {
    // Public: onboarding, login-screen lookup and login
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/tenants", post(handlers::tenancy::create_tenant))
        .route("/api/tenants/lookup/{subdomain}", get(handlers::tenancy::lookup_tenant))
        .route("/api/auth/login", post(handlers::auth::login));

    let account_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::get_me))
        .route("/api/auth/me/password", put(handlers::auth::change_password))
        .route(
            "/api/tenant",
            get(handlers::tenancy::get_current_tenant).put(handlers::tenancy::update_current_tenant),
        )
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/api/dashboard/summary", get(handlers::dashboard::get_summary));

    let document_routes = Router::new()
        .route(
            "/",
            get(handlers::documents::list_documents).post(handlers::documents::create_document),
        )
        .route("/stats", get(handlers::documents::document_stats))
        .route(
            "/{id}",
            get(handlers::documents::get_document)
                .put(handlers::documents::update_document)
                .delete(handlers::documents::delete_document),
        )
        .route("/{id}/history", get(handlers::documents::document_history))
        .route("/{id}/status", patch(handlers::documents::change_document_status))
        .route("/{id}/revise", post(handlers::documents::revise_document));

    let deviation_routes = Router::new()
        .route(
            "/",
            get(handlers::deviations::list_deviations).post(handlers::deviations::create_deviation),
        )
        .route("/stats", get(handlers::deviations::deviation_stats))
        .route(
            "/{id}",
            get(handlers::deviations::get_deviation)
                .put(handlers::deviations::update_deviation)
                .delete(handlers::deviations::delete_deviation),
        )
        .route("/{id}/history", get(handlers::deviations::deviation_history))
        .route("/{id}/status", patch(handlers::deviations::change_deviation_status))
        .route("/{id}/capa", post(handlers::deviations::raise_capa));

    let capa_routes = Router::new()
        .route(
            "/",
            get(handlers::capas::list_capas).post(handlers::capas::create_capa),
        )
        .route("/stats", get(handlers::capas::capa_stats))
        .route(
            "/{id}",
            get(handlers::capas::get_capa)
                .put(handlers::capas::update_capa)
                .delete(handlers::capas::delete_capa),
        )
        .route("/{id}/history", get(handlers::capas::capa_history))
        .route("/{id}/status", patch(handlers::capas::change_capa_status))
        .route("/{id}/effectiveness", post(handlers::capas::record_effectiveness));

    let change_control_routes = Router::new()
        .route(
            "/",
            get(handlers::change_controls::list_change_controls)
                .post(handlers::change_controls::create_change_control),
        )
        .route("/stats", get(handlers::change_controls::change_control_stats))
        .route(
            "/{id}",
            get(handlers::change_controls::get_change_control)
                .put(handlers::change_controls::update_change_control)
                .delete(handlers::change_controls::delete_change_control),
        )
        .route("/{id}/history", get(handlers::change_controls::change_control_history))
        .route("/{id}/status", patch(handlers::change_controls::update_change_control_status));

    let audit_routes = Router::new()
        .route(
            "/",
            get(handlers::audits::list_audits).post(handlers::audits::create_audit),
        )
        .route("/stats", get(handlers::audits::audit_stats))
        .route(
            "/{id}",
            get(handlers::audits::get_audit)
                .put(handlers::audits::update_audit)
                .delete(handlers::audits::delete_audit),
        )
        .route("/{id}/history", get(handlers::audits::audit_history))
        .route("/{id}/status", patch(handlers::audits::change_audit_status))
        .route("/{id}/findings", put(handlers::audits::set_audit_findings));

    // Trainings, exams, assignments and certificates share the training toggle
    let training_routes = Router::new()
        .route(
            "/api/trainings",
            get(handlers::trainings::list_trainings).post(handlers::trainings::create_training),
        )
        .route("/api/trainings/stats", get(handlers::trainings::training_stats))
        .route(
            "/api/trainings/{id}",
            get(handlers::trainings::get_training)
                .put(handlers::trainings::update_training)
                .delete(handlers::trainings::delete_training),
        )
        .route("/api/trainings/{id}/history", get(handlers::trainings::training_history))
        .route("/api/trainings/{id}/status", patch(handlers::trainings::change_training_status))
        .route(
            "/api/trainings/{id}/exam",
            put(handlers::trainings::set_training_exam).delete(handlers::trainings::remove_training_exam),
        )
        .route("/api/exams/{training_id}", get(handlers::trainings::get_exam))
        .route(
            "/api/training-assignments",
            get(handlers::assignments::list_assignments).post(handlers::assignments::assign_training),
        )
        .route("/api/training-assignments/mine", get(handlers::assignments::my_assignments))
        .route("/api/training-assignments/{id}", get(handlers::assignments::get_assignment))
        .route(
            "/api/training-assignments/{id}/progress",
            post(handlers::assignments::record_progress),
        )
        .route(
            "/api/training-assignments/{id}/contents/{content_id}/complete",
            post(handlers::assignments::complete_content),
        )
        .route("/api/training-assignments/{id}/exam", post(handlers::assignments::submit_exam))
        .route(
            "/api/certificates",
            get(handlers::certificates::list_certificates).post(handlers::certificates::issue_certificate),
        )
        .route("/api/certificates/{id}", get(handlers::certificates::get_certificate))
        .route("/api/certificates/{id}/revoke", post(handlers::certificates::revoke_certificate))
        .route("/api/certificates/{id}/pdf", get(handlers::certificates::certificate_pdf));

    let notification_routes = Router::new()
        .route("/", get(handlers::notifications::list_notifications))
        .route("/unread-count", get(handlers::notifications::unread_count))
        .route("/read-all", post(handlers::notifications::mark_all_read))
        .route("/reminders", post(handlers::notifications::send_reminders))
        .route("/{id}", delete(handlers::notifications::delete_notification))
        .route("/{id}/read", patch(handlers::notifications::mark_read));

    // Everything tenant-scoped: token + X-Tenant-ID, checked before any feature gate
    let protected_routes = Router::new()
        .merge(account_routes)
        .nest("/api/documents", gated(Feature::Documents, document_routes))
        .nest("/api/deviations", gated(Feature::Deviations, deviation_routes))
        .nest("/api/capas", gated(Feature::Capas, capa_routes))
        .nest("/api/change-controls", gated(Feature::ChangeControls, change_control_routes))
        .nest("/api/audits", gated(Feature::Audits, audit_routes))
        .merge(gated(Feature::Training, training_routes))
        .nest("/api/notifications", notification_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        models::auth::{User, UserRole},
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::Utc;
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/qms_unused".into(),
            jwt_secret: "router-test-secret".into(),
            jwt_ttl_hours: 1,
            bind_addr: "127.0.0.1:0".into(),
            db_max_connections: 1,
            fonts_dir: "./fonts".into(),
        }
    }

    // The pool never connects: every request here is rejected before touching it.
    fn test_state() -> AppState {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState::from_pool(pool, &config)
    }

    fn token_for(state: &AppState, tenant_id: Uuid) -> String {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            tenant_id,
            email: "qa@farmacia.com".into(),
            password_hash: String::new(),
            first_name: "Ana".into(),
            last_name: "Costa".into(),
            role: UserRole::QaManager,
            department: None,
            permissions: Vec::new(),
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        state.auth_service.create_token(&user).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = create_router(test_state());
        let request = Request::get("/api/documents")
            .header("x-tenant-id", Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn missing_tenant_header_is_bad_request() {
        let state = test_state();
        let token = token_for(&state, Uuid::new_v4());
        let app = create_router(state);
        let request = Request::get("/api/deviations")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_tenant_header_is_bad_request() {
        let state = test_state();
        let token = token_for(&state, Uuid::new_v4());
        let app = create_router(state);
        let request = Request::get("/api/capas")
            .header("authorization", format!("Bearer {}", token))
            .header("x-tenant-id", "farmacia-central")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn token_of_another_tenant_is_forbidden() {
        let state = test_state();
        let token = token_for(&state, Uuid::new_v4());
        let app = create_router(state);
        let request = Request::get("/api/trainings")
            .header("authorization", format!("Bearer {}", token))
            .header("x-tenant-id", Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body["message"],
            "The X-Tenant-ID header does not match the authenticated tenant."
        );
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let app = create_router(test_state());
        let request = Request::get("/api/dashboard/summary")
            .header("authorization", "Bearer not.a.jwt")
            .header("x-tenant-id", Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_requires_tenant_header() {
        let app = create_router(test_state());
        let request = Request::post("/api/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email":"qa@farmacia.com","password":"secret"}"#))
            .unwrap();
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_validates_the_payload() {
        let app = create_router(test_state());
        let request = Request::post("/api/auth/login")
            .header("content-type", "application/json")
            .header("x-tenant-id", Uuid::new_v4().to_string())
            .body(Body::from(r#"{"email":"not-an-email","password":""}"#))
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].is_object());
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = create_router(test_state());
        let (status, body) = send(
            app,
            Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/deviations/{id}/capa"].is_object());
        assert!(body["components"]["securitySchemes"]["api_jwt"].is_object());
    }
}
