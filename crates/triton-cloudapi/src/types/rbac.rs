use serde::{Deserialize, Serialize};

use super::{Extra, impl_resource};

/// An RBAC sub-user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User UUID.
    pub id: String,
    /// Login name.
    pub login: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Company name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Roles the user belongs to (with `membership=true`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    /// Roles active by default (with `membership=true`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_roles: Option<Vec<String>>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

impl_resource!(User, id = id, name = login);

/// Body of `CreateUser` / `UpdateUser`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserOptions {
    /// Login name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Password (create only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Company name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

/// A role member: either a bare login or a member record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RoleMember {
    /// Bare login.
    Login(String),
    /// Member record.
    Entry {
        /// Member login.
        login: String,
        /// Member kind (`subuser`, `account`).
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        /// Whether the role is active by default for this member.
        #[serde(default)]
        default: bool,
    },
}

impl RoleMember {
    /// Member login.
    #[must_use]
    pub fn login(&self) -> &str {
        match self {
            Self::Login(login) | Self::Entry { login, .. } => login,
        }
    }
}

/// An RBAC role.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Role {
    /// Role UUID.
    pub id: String,
    /// Role name.
    pub name: String,
    /// Members.
    #[serde(default)]
    pub members: Vec<RoleMember>,
    /// Members for whom the role is active by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_members: Option<Vec<String>>,
    /// Unmodelled fields (policies, ...).
    #[serde(flatten)]
    pub extra: Extra,
}

impl_resource!(Role, id = id, name = name);

/// Body of `CreateRole` / `UpdateRole`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateRoleOptions {
    /// Role name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Member logins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
    /// Default member logins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_members: Option<Vec<String>>,
    /// Policy names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<String>>,
}

/// An RBAC policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    /// Policy UUID.
    pub id: String,
    /// Policy name.
    pub name: String,
    /// Aperture rules, e.g. `CAN listmachines`.
    #[serde(default)]
    pub rules: Vec<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unmodelled fields.
    #[serde(flatten)]
    pub extra: Extra,
}

impl_resource!(Policy, id = id, name = name);

/// Body of `CreatePolicy` / `UpdatePolicy`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePolicyOptions {
    /// Policy name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<String>>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_members_both_shapes() {
        let role: Role = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "name": "ops",
            "members": ["bob", {"type": "subuser", "login": "carol", "default": true}],
            "policies": [{"name": "read"}]
        }))
        .expect("role");
        let logins: Vec<&str> = role.members.iter().map(RoleMember::login).collect();
        assert_eq!(logins, vec!["bob", "carol"]);
        assert!(role.extra.contains_key("policies"));
    }

    #[test]
    fn test_user_camel_case() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "login": "bob",
            "firstName": "Bob",
            "defaultRoles": ["ops"]
        }))
        .expect("user");
        assert_eq!(user.first_name.as_deref(), Some("Bob"));
        assert_eq!(user.default_roles, Some(vec!["ops".to_string()]));
    }
}
