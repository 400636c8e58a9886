use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::entities::users;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// Admin panel area a sub-admin may be granted. Stored and edited, but the
/// request gate only looks at [`Role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Content,
    Courses,
    Departments,
    Gallery,
    Events,
    Faqs,
    Subscribers,
    Newsletter,
    Messages,
    Users,
    Settings,
}

/// Account as exposed to the rest of the application, without password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub permissions: BTreeSet<Permission>,
}

impl User {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        let role = model.role.parse().unwrap_or_else(|e| {
            tracing::warn!(user_id = model.id, error = %e, "Treating unknown role as user");
            Role::User
        });

        Self {
            id: model.id,
            username: model.username,
            role,
            permissions: decode_permissions(model.id, model.permissions.as_deref()),
        }
    }
}

fn decode_permissions(user_id: i32, raw: Option<&str>) -> BTreeSet<Permission> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return BTreeSet::new();
    };

    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!(user_id, error = %e, "Ignoring malformed permissions column");
        BTreeSet::new()
    })
}

/// Serialize permission tags for the `users.permissions` column.
#[must_use]
pub fn encode_permissions(permissions: &BTreeSet<Permission>) -> String {
    serde_json::to_string(permissions).unwrap_or_else(|_| "[]".to_string())
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn model(role: &str, permissions: Option<&str>) -> users::Model {
        users::Model {
            id: 7,
            username: "editor".to_string(),
            password: "hash".to_string(),
            role: role.to_string(),
            permissions: permissions.map(ToString::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.to_string(), "user");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_from_model() {
        let user = User::from(model("admin", Some(r#"["gallery","events"]"#)));
        assert!(user.is_admin());
        assert!(user.permissions.contains(&Permission::Gallery));
        assert!(user.permissions.contains(&Permission::Events));
    }

    #[test]
    fn test_unknown_role_and_bad_permissions_fail_closed() {
        let user = User::from(model("superuser", Some("not json")));
        assert_eq!(user.role, Role::User);
        assert!(user.permissions.is_empty());
    }

    #[test]
    fn test_encode_permissions() {
        let perms: BTreeSet<_> = [Permission::Users, Permission::Content].into_iter().collect();
        assert_eq!(encode_permissions(&perms), r#"["content","users"]"#);
    }
}
