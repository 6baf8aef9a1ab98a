//! Role to permission lookup table

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Operations a role may perform on connection data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Create,
    Update,
    Delete,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::Read,
        Permission::Create,
        Permission::Update,
        Permission::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Create => "create",
            Permission::Update => "update",
            Permission::Delete => "delete",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member's role within a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl Role {
    /// Permissions granted to this role
    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::Owner | Role::Admin | Role::Member => &Permission::ALL,
            Role::Viewer => &[Permission::Read],
        }
    }

    pub fn can(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// `{"read": bool, "create": bool, ...}` for visibility conditions
    pub fn permission_flags(self) -> Value {
        let flags: Map<String, Value> = Permission::ALL
            .iter()
            .map(|p| (p.as_str().to_string(), Value::Bool(self.can(*p))))
            .collect();
        Value::Object(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writers_get_everything() {
        for role in [Role::Owner, Role::Admin, Role::Member] {
            for permission in Permission::ALL {
                assert!(role.can(permission), "{:?} should {}", role, permission);
            }
        }
    }

    #[test]
    fn viewer_is_read_only() {
        assert_eq!(Role::Viewer.permissions(), &[Permission::Read]);
        assert_eq!(
            Role::Viewer.permission_flags(),
            json!({ "read": true, "create": false, "update": false, "delete": false })
        );
    }

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_value(Role::Owner).unwrap(), json!("OWNER"));
        assert_eq!(
            serde_json::from_value::<Role>(json!("VIEWER")).unwrap(),
            Role::Viewer
        );
        assert_eq!(serde_json::to_value(Permission::Delete).unwrap(), json!("delete"));
    }
}
