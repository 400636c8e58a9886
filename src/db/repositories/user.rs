use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, Unchanged,
};
use std::collections::BTreeSet;

use crate::db::is_unique_violation;
use crate::entities::{prelude::*, users};
use crate::models::user::{Permission, Role, User, UserUpdate, encode_permissions};

/// Result of a write that can hit either a missing row or the username index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserWrite {
    Written(User),
    NotFound,
    DuplicateUsername,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Returns the user together with the stored password value, for login only.
    pub async fn get_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(|u| {
            let password = u.password.clone();
            (User::from(u), password)
        }))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .get_by_username_with_password(username)
            .await?
            .map(|(user, _)| user))
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Inserts a user. `password` must already be in its stored form.
    /// Returns `None` when the username is taken.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: Role,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<User>> {
        let now = Utc::now();
        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password: Set(password.to_string()),
            role: Set(role.as_str().to_string()),
            permissions: Set(Some(encode_permissions(permissions))),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(User::from(model))),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e).context("Failed to insert user"),
        }
    }

    pub async fn update_info(&self, id: i32, update: &UserUpdate) -> Result<UserWrite> {
        let mut active = users::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(username) = &update.username {
            active.username = Set(username.clone());
        }
        if let Some(role) = update.role {
            active.role = Set(role.as_str().to_string());
        }

        match active.update(&self.conn).await {
            Ok(model) => Ok(UserWrite::Written(User::from(model))),
            Err(DbErr::RecordNotUpdated) => Ok(UserWrite::NotFound),
            Err(e) if is_unique_violation(&e) => Ok(UserWrite::DuplicateUsername),
            Err(e) => Err(e).context("Failed to update user"),
        }
    }

    /// Replaces the stored password value. Returns false when the user does not exist.
    pub async fn set_password(&self, id: i32, password: &str) -> Result<bool> {
        let active = users::ActiveModel {
            id: Unchanged(id),
            password: Set(password.to_string()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        match active.update(&self.conn).await {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotUpdated) => Ok(false),
            Err(e) => Err(e).context("Failed to update password"),
        }
    }

    pub async fn set_permissions(
        &self,
        id: i32,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Option<User>> {
        let active = users::ActiveModel {
            id: Unchanged(id),
            permissions: Set(Some(encode_permissions(permissions))),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        match active.update(&self.conn).await {
            Ok(model) => Ok(Some(User::from(model))),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(e).context("Failed to update permissions"),
        }
    }
}
