// src/services/user_service.rs

use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination},
    db::{
        user_repo::{NewUser, UserChanges},
        UserRepository,
    },
    middleware::rbac::ALL_PERMISSIONS,
    models::auth::{CreateUserPayload, UpdateUserPayload, User, UserFilter},
    services::auth::hash_password,
};

fn check_permissions(permissions: &[String]) -> Result<(), AppError> {
    match permissions.iter().find(|p| !ALL_PERMISSIONS.contains(&p.as_str())) {
        Some(unknown) => Err(AppError::BusinessRule(format!("Unknown permission '{}'.", unknown))),
        None => Ok(()),
    }
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    pub fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    pub async fn list(&self, conn: &mut PgConnection, tenant_id: Uuid, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        let (limit, offset) = pagination::page(filter.limit, filter.offset);
        self.user_repo
            .list(&mut *conn, tenant_id, filter, pagination::search_term(&filter.search), limit, offset)
            .await
    }

    pub async fn get(&self, conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(&mut *conn, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payload: CreateUserPayload,
    ) -> Result<User, AppError> {
        payload.validate()?;
        check_permissions(&payload.permissions)?;

        let password_hash = hash_password(&payload.password).await?;
        let user = self
            .user_repo
            .create(
                &mut *conn,
                tenant_id,
                NewUser {
                    email: &payload.email,
                    password_hash: &password_hash,
                    first_name: &payload.first_name,
                    last_name: &payload.last_name,
                    role: payload.role,
                    department: payload.department.as_deref(),
                    permissions: &payload.permissions,
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, tenant_id = %tenant_id, role = ?user.role, "user created");
        Ok(user)
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        actor: &User,
        id: Uuid,
        payload: UpdateUserPayload,
    ) -> Result<User, AppError> {
        payload.validate()?;
        if let Some(permissions) = &payload.permissions {
            check_permissions(permissions)?;
        }
        if actor.id == id && payload.is_active == Some(false) {
            return Err(AppError::BusinessRule("You cannot deactivate your own account.".into()));
        }

        let password_hash = match &payload.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };
        let changes = UserChanges {
            first_name: payload.first_name,
            last_name: payload.last_name,
            role: payload.role,
            department: payload.department,
            permissions: payload.permissions,
            is_active: payload.is_active,
            password_hash,
        };

        self.user_repo
            .update(&mut *conn, tenant_id, id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn delete(&self, conn: &mut PgConnection, tenant_id: Uuid, actor: &User, id: Uuid) -> Result<(), AppError> {
        if actor.id == id {
            return Err(AppError::BusinessRule("You cannot delete your own account.".into()));
        }
        if !self.user_repo.delete(&mut *conn, tenant_id, id).await? {
            return Err(AppError::not_found("User"));
        }
        tracing::info!(user_id = %id, tenant_id = %tenant_id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_permission_slugs_are_rejected() {
        assert!(check_permissions(&["training:manage".to_string()]).is_ok());
        assert!(matches!(
            check_permissions(&["inventory:write".to_string()]),
            Err(AppError::BusinessRule(_))
        ));
    }
}
