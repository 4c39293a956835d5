//! Users, roles and permissions.

use serde::{Deserialize, Serialize};

use super::id::{PermissionId, RoleId, UserId};

/// A permission granted through a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionInfo {
    pub id: PermissionId,
    pub name: String,
}

/// The role attached to a user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permission_infos: Vec<PermissionInfo>,
}

/// A user as returned by `users/info`, `users` and `users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub role_id: Option<RoleId>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user_role: UserRole,
}

impl UserProfile {
    /// Admins are the users whose role carries any permission at all.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        !self.user_role.permission_infos.is_empty()
    }
}

/// A role option from `GET role_infos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Display name of `role_id` among `roles`, or `-` when unknown.
#[must_use]
pub fn role_name(roles: &[RoleInfo], role_id: Option<RoleId>) -> &str {
    role_id
        .and_then(|id| roles.iter().find(|role| role.id == id))
        .map_or("-", |role| role.name.as_str())
}

/// Body of `POST users` and `PUT users/{id}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub fullname: String,
    pub email: String,
    pub avatar: String,
    pub role_id: RoleId,
    pub is_active: bool,
}

impl std::fmt::Debug for UserForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserForm")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("fullname", &self.fullname)
            .field("email", &self.email)
            .field("avatar", &self.avatar)
            .field("role_id", &self.role_id)
            .field("is_active", &self.is_active)
            .finish()
    }
}
