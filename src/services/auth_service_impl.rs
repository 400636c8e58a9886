//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::db::repositories::user::UserWrite;
use crate::models::user::{NewUser, Permission, Role, User, UserUpdate};
use crate::services::auth_service::{AuthError, AuthService, BOOTSTRAP_ADMIN_ID, Provisioned};
use crate::services::password::{hash_password_blocking, verify_password_blocking};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn bootstrap_user(&self) -> User {
        User {
            id: BOOTSTRAP_ADMIN_ID,
            username: self.security.bootstrap_admin.username.clone(),
            role: Role::Admin,
            permissions: BTreeSet::new(),
        }
    }

    fn is_bootstrap_login(&self, username: &str, password: &str) -> bool {
        let bootstrap = &self.security.bootstrap_admin;
        self.security.mode.is_development()
            && username == bootstrap.username
            && password == bootstrap.password
    }

    fn check_username(username: &str) -> Result<(), AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if username.chars().count() > 64 {
            return Err(AuthError::Validation(
                "Username must be at most 64 characters".to_string(),
            ));
        }
        Ok(())
    }

    fn check_password(&self, password: &str) -> Result<(), AuthError> {
        let min = self.security.min_password_length;
        if password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min} characters"
            )));
        }
        Ok(())
    }

    async fn insert_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        permissions: &BTreeSet<Permission>,
    ) -> Result<User, AuthError> {
        Self::check_username(username)?;
        self.check_password(password)?;

        let hash = hash_password_blocking(password, &self.security).await?;
        self.store
            .user_repo()
            .create(username.trim(), &hash, role, permissions)
            .await?
            .ok_or(AuthError::UsernameTaken)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = username.trim();
        if self.is_bootstrap_login(username, password) {
            warn!(username, outcome = "bootstrap", "Login via development bootstrap admin");
            return Ok(self.bootstrap_user());
        }

        let Some((user, stored)) = self
            .store
            .user_repo()
            .get_by_username_with_password(username)
            .await?
        else {
            info!(username, outcome = "unknown_user", "Login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let valid = verify_password_blocking(stored, password, self.security.mode).await?;
        if !valid {
            info!(username, outcome = "bad_password", "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        info!(username, user_id = user.id, outcome = "success", "Login succeeded");
        Ok(user)
    }

    async fn current_user(&self, user_id: i32) -> Result<Option<User>, AuthError> {
        if user_id == BOOTSTRAP_ADMIN_ID {
            return Ok(self
                .security
                .mode
                .is_development()
                .then(|| self.bootstrap_user()));
        }

        Ok(self.store.user_repo().get_by_id(user_id).await?)
    }

    async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .insert_user(username, password, Role::User, &BTreeSet::new())
            .await?;
        info!(username = %user.username, user_id = user.id, "Registered new user");
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.store.user_repo().list().await?)
    }

    async fn create_user(&self, input: NewUser) -> Result<User, AuthError> {
        let user = self
            .insert_user(&input.username, &input.password, input.role, &input.permissions)
            .await?;
        info!(username = %user.username, role = %user.role, "Created user");
        Ok(user)
    }

    async fn update_user(&self, id: i32, mut update: UserUpdate) -> Result<User, AuthError> {
        if let Some(username) = update.username.as_deref() {
            Self::check_username(username)?;
            update.username = Some(username.trim().to_string());
        }

        match self.store.user_repo().update_info(id, &update).await? {
            UserWrite::Written(user) => {
                info!(user_id = id, role = %user.role, "Updated user");
                Ok(user)
            }
            UserWrite::NotFound => Err(AuthError::UserNotFound),
            UserWrite::DuplicateUsername => Err(AuthError::UsernameTaken),
        }
    }

    async fn reset_password(&self, id: i32, new_password: &str) -> Result<(), AuthError> {
        self.check_password(new_password)?;

        let hash = hash_password_blocking(new_password, &self.security).await?;
        if !self.store.user_repo().set_password(id, &hash).await? {
            return Err(AuthError::UserNotFound);
        }

        info!(user_id = id, "Password reset");
        Ok(())
    }

    async fn set_permissions(
        &self,
        id: i32,
        permissions: BTreeSet<Permission>,
    ) -> Result<User, AuthError> {
        self.store
            .user_repo()
            .set_permissions(id, &permissions)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn ensure_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Provisioned, AuthError> {
        if self
            .store
            .user_repo()
            .get_by_username(username.trim())
            .await?
            .is_some()
        {
            return Ok(Provisioned::AlreadyPresent);
        }

        match self
            .insert_user(username, password, Role::Admin, &BTreeSet::new())
            .await
        {
            Ok(user) => {
                info!(username = %user.username, "Provisioned admin account");
                Ok(Provisioned::Created)
            }
            Err(AuthError::UsernameTaken) => Ok(Provisioned::AlreadyPresent),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunMode;

    async fn service(mode: RunMode) -> SeaOrmAuthService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let security = SecurityConfig {
            mode,
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        SeaOrmAuthService::new(store, security)
    }

    #[tokio::test]
    async fn test_bootstrap_admin_in_development() {
        let auth = service(RunMode::Development).await;

        let user = auth.login("admin", "admin123").await.unwrap();
        assert_eq!(user.id, BOOTSTRAP_ADMIN_ID);
        assert!(user.is_admin());

        let again = auth.current_user(BOOTSTRAP_ADMIN_ID).await.unwrap();
        assert_eq!(again, Some(user));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_rejected_in_production() {
        let auth = service(RunMode::Production).await;

        let err = auth.login("admin", "admin123").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(auth.current_user(BOOTSTRAP_ADMIN_ID).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service(RunMode::Production).await;

        let user = auth.register("student", "long-enough").await.unwrap();
        assert_eq!(user.role, Role::User);

        let logged_in = auth.login("student", "long-enough").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert!(matches!(
            auth.login("student", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.register("student", "another-pass").await,
            Err(AuthError::UsernameTaken)
        ));
        assert!(matches!(
            auth.register("short", "123").await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_username_whitespace_ignored() {
        let auth = service(RunMode::Production).await;

        let user = auth.register(" bob ", "long-enough").await.unwrap();
        assert_eq!(user.username, "bob");

        assert_eq!(auth.login(" bob ", "long-enough").await.unwrap().id, user.id);
        assert_eq!(auth.login("bob", "long-enough").await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_role_change_visible_on_next_lookup() {
        let auth = service(RunMode::Production).await;
        let user = auth.register("editor", "long-enough").await.unwrap();

        auth.update_user(
            user.id,
            UserUpdate {
                username: None,
                role: Some(Role::Admin),
            },
        )
        .await
        .unwrap();

        let fresh = auth.current_user(user.id).await.unwrap().unwrap();
        assert!(fresh.is_admin());
    }

    #[tokio::test]
    async fn test_reset_password_is_hashed() {
        let auth = service(RunMode::Production).await;
        let user = auth.register("lecturer", "first-pass").await.unwrap();

        auth.reset_password(user.id, "second-pass").await.unwrap();
        assert!(auth.login("lecturer", "second-pass").await.is_ok());
        assert!(matches!(
            auth.reset_password(999, "second-pass").await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let auth = service(RunMode::Production).await;

        assert_eq!(
            auth.ensure_admin("root", "provisioned-pass").await.unwrap(),
            Provisioned::Created
        );
        assert_eq!(
            auth.ensure_admin("root", "other-password").await.unwrap(),
            Provisioned::AlreadyPresent
        );

        let admin = auth.login("root", "provisioned-pass").await.unwrap();
        assert!(admin.is_admin());
    }
}
