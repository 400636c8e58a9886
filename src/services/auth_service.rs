//! Domain service for authentication and user administration.
//!
//! Handles credential checks, session identity rehydration, registration and
//! the admin-side user management operations.

use std::collections::BTreeSet;
use thiserror::Error;

use crate::models::user::{NewUser, Permission, User, UserUpdate};

/// Id carried in the session for the development bootstrap admin. Never
/// assigned to a stored row.
pub const BOOTSTRAP_ADMIN_ID: i32 = -1;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Whether [`AuthService::ensure_admin`] had to create the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyPresent,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and returns the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the username is unknown or
    /// the password does not match.
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError>;

    /// Rehydrates the user behind a session id. `None` means the session no
    /// longer refers to a valid account.
    async fn current_user(&self, user_id: i32) -> Result<Option<User>, AuthError>;

    /// Self-service registration. The account always gets the `user` role.
    async fn register(&self, username: &str, password: &str) -> Result<User, AuthError>;

    async fn list_users(&self) -> Result<Vec<User>, AuthError>;

    async fn create_user(&self, input: NewUser) -> Result<User, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::UsernameTaken`] when renaming onto an existing username.
    async fn update_user(&self, id: i32, update: UserUpdate) -> Result<User, AuthError>;

    async fn reset_password(&self, id: i32, new_password: &str) -> Result<(), AuthError>;

    async fn set_permissions(
        &self,
        id: i32,
        permissions: BTreeSet<Permission>,
    ) -> Result<User, AuthError>;

    /// Creates an admin account with a hashed password unless the username
    /// already exists. Existing accounts are left untouched.
    async fn ensure_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Provisioned, AuthError>;
}
