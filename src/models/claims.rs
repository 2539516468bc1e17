use crate::models::PermissionLevel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Normalized identity attributes derived from a validated Descope session.
///
/// A `UserClaims` value only ever exists downstream of a successful
/// `SessionValidator::validate` call; nothing else constructs one in
/// production code.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserClaims {
    pub user_id: Option<String>,
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub tenants: Map<String, Value>,
    /// The (possibly refreshed) session JWT this record was derived from.
    #[serde(skip_serializing)]
    pub session_jwt: String,
}

/// Per-request authentication context attached to request extensions by the
/// session middleware. Lives for the duration of a single request.
#[derive(Clone, Debug, Serialize)]
pub struct AuthContext {
    #[serde(flatten)]
    pub claims: UserClaims,
    pub is_admin: bool,
    pub permission_level: PermissionLevel,
}

impl AuthContext {
    pub fn has_role(&self, role: &str) -> bool {
        self.claims.roles.iter().any(|r| r == role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.claims.permissions.iter().any(|p| p == permission)
    }

    /// True if the derived permission level is at least `required`.
    pub fn allows(&self, required: PermissionLevel) -> bool {
        self.permission_level >= required
    }
}
