// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{user_repo::UserChanges, TenantRepository, UserRepository},
    models::{
        auth::{AuthResponse, ChangePasswordPayload, Claims, User},
        tenancy::Tenant,
    },
};

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    jwt_secret: String,
    jwt_ttl_hours: i64,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        jwt_secret: String,
        jwt_ttl_hours: i64,
    ) -> Self {
        Self { user_repo, tenant_repo, jwt_secret, jwt_ttl_hours }
    }

    /// Unknown emails, wrong passwords and inactive users all fail the same way.
    pub async fn login(&self, tenant_id: Uuid, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let tenant = self
            .tenant_repo
            .find_by_id(tenant_id)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        if !tenant.is_active {
            return Err(AppError::TenantInactive);
        }

        let mut user = self
            .user_repo
            .find_by_email_in_tenant(tenant_id, email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? || !user.is_active {
            tracing::info!(tenant_id = %tenant_id, "rejected login attempt");
            return Err(AppError::InvalidCredentials);
        }

        self.user_repo.record_login(user.id).await?;
        user.last_login_at = Some(Utc::now());

        let token = self.create_token(&user)?;
        tracing::info!(user_id = %user.id, tenant_id = %tenant_id, "user logged in");
        Ok(AuthResponse { token, user })
    }

    /// Resolves a bearer token for a request scoped to `tenant_id`.
    pub async fn authenticate(&self, token: &str, tenant_id: Uuid) -> Result<(User, Tenant), AppError> {
        let claims = self.decode_token(token)?;
        if claims.tid != tenant_id {
            return Err(AppError::TenantMismatch);
        }

        let tenant = self
            .tenant_repo
            .find_by_id(tenant_id)
            .await?
            .ok_or(AppError::InvalidToken)?;
        if !tenant.is_active {
            return Err(AppError::TenantInactive);
        }

        let user = self
            .user_repo
            .find_in_tenant(tenant_id, claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidToken)?;

        Ok((user, tenant))
    }

    pub async fn change_password(
        &self,
        conn: &mut PgConnection,
        user: &User,
        payload: &ChangePasswordPayload,
    ) -> Result<(), AppError> {
        if !verify_password(&payload.current_password, &user.password_hash).await? {
            return Err(AppError::BusinessRule("The current password is incorrect.".into()));
        }

        let changes = UserChanges {
            password_hash: Some(hash_password(&payload.new_password).await?),
            ..Default::default()
        };
        self.user_repo
            .update(&mut *conn, user.tenant_id, user.id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        tracing::info!(user_id = %user.id, "password changed");
        Ok(())
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.jwt_ttl_hours);

        let claims = Claims {
            sub: user.id,
            tid: user.tenant_id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use sqlx::postgres::PgPoolOptions;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            email: "qa@example.com".into(),
            password_hash: String::new(),
            first_name: "Ana".into(),
            last_name: "Costa".into(),
            role: UserRole::QaManager,
            department: None,
            permissions: vec![],
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(secret: &str, ttl_hours: i64) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/qms_unused")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            TenantRepository::new(pool),
            secret.to_string(),
            ttl_hours,
        )
    }

    #[tokio::test]
    async fn token_round_trip_carries_tenant_and_role() {
        let auth = service("test-secret", 1);
        let user = sample_user();

        let token = auth.create_token(&user).unwrap();
        let claims = auth.decode_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.tid, user.tenant_id);
        assert_eq!(claims.role, UserRole::QaManager);
    }

    #[tokio::test]
    async fn token_signed_with_another_secret_is_rejected() {
        let token = service("secret-a", 1).create_token(&sample_user()).unwrap();
        assert!(matches!(
            service("secret-b", 1).decode_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let auth = service("test-secret", -2);
        let token = auth.create_token(&sample_user()).unwrap();
        assert!(matches!(auth.decode_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn token_for_another_tenant_is_a_mismatch() {
        let auth = service("test-secret", 1);
        let token = auth.create_token(&sample_user()).unwrap();
        let result = auth.authenticate(&token, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::TenantMismatch)));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("s3cret-pass").await.unwrap();
        assert!(verify_password("s3cret-pass", &hashed).await.unwrap());
        assert!(!verify_password("wrong", &hashed).await.unwrap());
    }
}
