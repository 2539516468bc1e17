use crate::config::DescopeConfig;
use crate::models::PermissionLevel;

/// Role names carrying an implicit MLflow permission level, consulted only
/// after the explicit `mlflow:*` permission strings fail to match.
const ROLE_LEVEL_TABLE: [(&str, PermissionLevel); 3] = [
    ("mlflow-manager", PermissionLevel::Manage),
    ("mlflow-editor", PermissionLevel::Edit),
    ("mlflow-viewer", PermissionLevel::Read),
];

/// True iff any of the user's roles is in the configured admin-role set.
pub fn is_admin(roles: &[String], admin_roles: &[String]) -> bool {
    roles.iter().any(|role| admin_roles.contains(role))
}

/// Map roles/permissions to an MLflow permission level.
///
/// Evaluation order is a contract and is not commutative:
/// 1. admin role
/// 2. `mlflow:manage`
/// 3. `mlflow:edit` / `mlflow:write`
/// 4. `mlflow:read`
/// 5. role table, first matching role in role-list order
/// 6. configured default
pub fn permission_level(
    roles: &[String],
    permissions: &[String],
    config: &DescopeConfig,
) -> PermissionLevel {
    if is_admin(roles, &config.admin_roles) {
        return PermissionLevel::Manage;
    }

    let has = |p: &str| permissions.iter().any(|granted| granted == p);

    if has("mlflow:manage") {
        return PermissionLevel::Manage;
    }
    if has("mlflow:edit") || has("mlflow:write") {
        return PermissionLevel::Edit;
    }
    if has("mlflow:read") {
        return PermissionLevel::Read;
    }

    for role in roles {
        for (mapped_role, level) in ROLE_LEVEL_TABLE {
            if role == mapped_role {
                return level;
            }
        }
    }

    config.default_permission_level()
}

impl DescopeConfig {
    /// Parsed form of the configured default. An unparseable value was
    /// already rejected at startup; fall back to read-only if it slips past.
    pub fn default_permission_level(&self) -> PermissionLevel {
        self.default_permission
            .parse()
            .unwrap_or(PermissionLevel::Read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_config(admin_roles: &[&str], default_permission: &str) -> DescopeConfig {
        DescopeConfig {
            project_id: "P2test".to_string(),
            management_key: None,
            base_url: "https://api.descope.com".to_string(),
            flow_id: "sign-up-or-in".to_string(),
            redirect_url: "/".to_string(),
            web_component_version: "3.54.0".to_string(),
            admin_roles: admin_roles.iter().map(|s| s.to_string()).collect(),
            default_permission: default_permission.to_string(),
            username_claim: "sub".to_string(),
            session_cookie: "DS".to_string(),
            refresh_cookie: "DSR".to_string(),
            cookie_secure: true,
            http_timeout_secs: 10,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn is_admin_requires_intersection() {
        let admin_roles = strings(&["admin", "mlflow-admin"]);
        assert!(is_admin(&strings(&["user", "admin"]), &admin_roles));
        assert!(is_admin(&strings(&["mlflow-admin"]), &admin_roles));
        assert!(!is_admin(&strings(&["user"]), &admin_roles));
        assert!(!is_admin(&[], &admin_roles));
    }

    #[test]
    fn admin_role_wins_even_with_empty_permissions() {
        let config = test_config(&["admin"], "READ");
        let level = permission_level(&strings(&["admin"]), &[], &config);
        assert_eq!(level, PermissionLevel::Manage);
    }

    #[test]
    fn admin_role_wins_over_lesser_permissions() {
        let config = test_config(&["admin"], "READ");
        let level = permission_level(&strings(&["admin"]), &strings(&["mlflow:read"]), &config);
        assert_eq!(level, PermissionLevel::Manage);
    }

    #[test]
    fn manage_permission_without_admin_role() {
        let config = test_config(&["admin"], "READ");
        let level = permission_level(&strings(&["user"]), &strings(&["mlflow:manage"]), &config);
        assert_eq!(level, PermissionLevel::Manage);
    }

    #[test]
    fn edit_and_write_permissions_map_to_edit() {
        let config = test_config(&["admin"], "READ");
        assert_eq!(
            permission_level(&strings(&["user"]), &strings(&["mlflow:edit"]), &config),
            PermissionLevel::Edit
        );
        assert_eq!(
            permission_level(&strings(&["user"]), &strings(&["mlflow:write"]), &config),
            PermissionLevel::Edit
        );
    }

    #[test]
    fn read_permission_maps_to_read() {
        let config = test_config(&["admin"], "EDIT");
        let level = permission_level(&strings(&["user"]), &strings(&["mlflow:read"]), &config);
        assert_eq!(level, PermissionLevel::Read);
    }

    #[test]
    fn permission_strings_beat_role_table() {
        // mlflow-manager would map to MANAGE via the role table, but the
        // explicit read permission is checked first.
        let config = test_config(&["admin"], "READ");
        let level = permission_level(
            &strings(&["mlflow-manager"]),
            &strings(&["mlflow:read"]),
            &config,
        );
        assert_eq!(level, PermissionLevel::Read);
    }

    #[test]
    fn role_table_applies_when_no_permissions_match() {
        let config = test_config(&["admin"], "READ");
        assert_eq!(
            permission_level(&strings(&["mlflow-manager"]), &[], &config),
            PermissionLevel::Manage
        );
        assert_eq!(
            permission_level(&strings(&["mlflow-editor"]), &[], &config),
            PermissionLevel::Edit
        );
        assert_eq!(
            permission_level(&strings(&["mlflow-viewer"]), &[], &config),
            PermissionLevel::Read
        );
    }

    #[test]
    fn first_matching_role_in_list_order_wins() {
        let config = test_config(&["admin"], "READ");
        let level = permission_level(
            &strings(&["mlflow-viewer", "mlflow-manager"]),
            &[],
            &config,
        );
        assert_eq!(level, PermissionLevel::Read);
    }

    #[test]
    fn unmatched_users_get_configured_default() {
        let config = test_config(&["admin"], "EDIT");
        let level = permission_level(&strings(&["user"]), &[], &config);
        assert_eq!(level, PermissionLevel::Edit);
    }

    #[test]
    fn combined_role_and_permission_scenarios() {
        let config = test_config(&["admin"], "READ");

        let roles = strings(&["admin", "user"]);
        assert!(is_admin(&roles, &config.admin_roles));
        assert_eq!(permission_level(&roles, &[], &config), PermissionLevel::Manage);

        let roles = strings(&["user"]);
        assert!(!is_admin(&roles, &config.admin_roles));
        assert_eq!(
            permission_level(&roles, &strings(&["mlflow:edit"]), &config),
            PermissionLevel::Edit
        );
    }
}
