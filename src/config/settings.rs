use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub descope: DescopeConfig,
    pub upstream: UpstreamConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DescopeConfig {
    pub project_id: String,
    pub management_key: Option<String>,
    pub base_url: String,
    pub flow_id: String,
    pub redirect_url: String,
    pub web_component_version: String,
    pub admin_roles: Vec<String>,
    pub default_permission: String,
    pub username_claim: String,
    pub session_cookie: String,
    pub refresh_cookie: String,
    pub cookie_secure: bool,
    pub http_timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub url: String,
}

impl DescopeConfig {
    /// CDN URL for the Descope web component used by the login page.
    pub fn web_component_url(&self) -> String {
        format!(
            "https://unpkg.com/@descope/web-component@{}/dist/index.js",
            self.web_component_version
        )
    }
}

/// Split a comma-separated env value into trimmed, non-empty entries.
fn parse_comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        // Server config
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::Configuration("SERVER_PORT must be a valid port number".to_string()))?;

        // Descope config - project ID is the only required setting
        let project_id = env::var("DESCOPE_PROJECT_ID")
            .map_err(|_| AppError::Configuration("DESCOPE_PROJECT_ID must be set".to_string()))?;

        let management_key = env::var("DESCOPE_MANAGEMENT_KEY").ok();

        let base_url = env::var("DESCOPE_BASE_URL")
            .unwrap_or_else(|_| "https://api.descope.com".to_string());

        let flow_id = env::var("DESCOPE_FLOW_ID").unwrap_or_else(|_| "sign-up-or-in".to_string());

        let redirect_url = env::var("DESCOPE_REDIRECT_URL").unwrap_or_else(|_| "/".to_string());

        let web_component_version =
            env::var("DESCOPE_WEB_COMPONENT_VERSION").unwrap_or_else(|_| "3.54.0".to_string());

        // Admin roles from comma-separated list
        let admin_roles = parse_comma_list(
            &env::var("DESCOPE_ADMIN_ROLES").unwrap_or_else(|_| "admin,mlflow-admin".to_string()),
        );

        let default_permission =
            env::var("DESCOPE_DEFAULT_PERMISSION").unwrap_or_else(|_| "READ".to_string());

        let username_claim = env::var("DESCOPE_USERNAME_CLAIM").unwrap_or_else(|_| "sub".to_string());

        let session_cookie = env::var("DESCOPE_SESSION_COOKIE").unwrap_or_else(|_| "DS".to_string());
        let refresh_cookie = env::var("DESCOPE_REFRESH_COOKIE").unwrap_or_else(|_| "DSR".to_string());

        let cookie_secure = env::var("DESCOPE_COOKIE_SECURE")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .map_err(|_| {
                AppError::Configuration("DESCOPE_COOKIE_SECURE must be true or false".to_string())
            })?;

        let http_timeout_secs = env::var("DESCOPE_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .map_err(|_| {
                AppError::Configuration("DESCOPE_HTTP_TIMEOUT_SECS must be a valid number".to_string())
            })?;

        // Upstream MLflow tracking server
        let upstream_url =
            env::var("MLFLOW_UPSTREAM_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());

        Ok(Self {
            server: ServerConfig {
                host: server_host,
                port: server_port,
            },
            descope: DescopeConfig {
                project_id,
                management_key,
                base_url,
                flow_id,
                redirect_url,
                web_component_version,
                admin_roles,
                default_permission,
                username_claim,
                session_cookie,
                refresh_cookie,
                cookie_secure,
                http_timeout_secs,
            },
            upstream: UpstreamConfig { url: upstream_url },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_descope_config() -> DescopeConfig {
        DescopeConfig {
            project_id: "P2test".to_string(),
            management_key: None,
            base_url: "https://api.descope.com".to_string(),
            flow_id: "sign-up-or-in".to_string(),
            redirect_url: "/".to_string(),
            web_component_version: "3.54.0".to_string(),
            admin_roles: vec!["admin".to_string(), "mlflow-admin".to_string()],
            default_permission: "READ".to_string(),
            username_claim: "sub".to_string(),
            session_cookie: "DS".to_string(),
            refresh_cookie: "DSR".to_string(),
            cookie_secure: true,
            http_timeout_secs: 10,
        }
    }

    #[test]
    fn web_component_url_uses_configured_version() {
        let mut config = test_descope_config();
        config.web_component_version = "3.60.1".to_string();

        assert_eq!(
            config.web_component_url(),
            "https://unpkg.com/@descope/web-component@3.60.1/dist/index.js"
        );
    }

    #[test]
    fn parse_comma_list_trims_and_drops_empty_entries() {
        assert_eq!(
            parse_comma_list("admin, mlflow-admin ,ops"),
            vec!["admin", "mlflow-admin", "ops"]
        );
        assert_eq!(parse_comma_list("admin,,"), vec!["admin"]);
        assert!(parse_comma_list("").is_empty());
        assert!(parse_comma_list(" , ").is_empty());
    }

    /// Every variable `from_env` reads; cleared before each env-driven test.
    const GATEWAY_VARS: [&str; 16] = [
        "SERVER_HOST",
        "SERVER_PORT",
        "DESCOPE_PROJECT_ID",
        "DESCOPE_MANAGEMENT_KEY",
        "DESCOPE_BASE_URL",
        "DESCOPE_FLOW_ID",
        "DESCOPE_REDIRECT_URL",
        "DESCOPE_WEB_COMPONENT_VERSION",
        "DESCOPE_ADMIN_ROLES",
        "DESCOPE_DEFAULT_PERMISSION",
        "DESCOPE_USERNAME_CLAIM",
        "DESCOPE_SESSION_COOKIE",
        "DESCOPE_REFRESH_COOKIE",
        "DESCOPE_COOKIE_SECURE",
        "DESCOPE_HTTP_TIMEOUT_SECS",
        "MLFLOW_UPSTREAM_URL",
    ];

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Run `f` with exactly `vars` set. The process environment is global
    /// state, so these tests serialize on a lock.
    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for name in GATEWAY_VARS {
            unsafe { env::remove_var(name) };
        }
        for (name, value) in vars {
            unsafe { env::set_var(name, value) };
        }
        let result = f();
        for (name, _) in vars {
            unsafe { env::remove_var(name) };
        }
        result
    }

    #[test]
    fn from_env_fails_without_project_id() {
        let err = with_env(&[], Settings::from_env).unwrap_err();

        match err {
            AppError::Configuration(msg) => assert!(msg.contains("DESCOPE_PROJECT_ID")),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn from_env_applies_defaults_with_only_project_id() {
        let settings =
            with_env(&[("DESCOPE_PROJECT_ID", "P2test")], Settings::from_env).unwrap();

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.descope.project_id, "P2test");
        assert_eq!(settings.descope.management_key, None);
        assert_eq!(settings.descope.base_url, "https://api.descope.com");
        assert_eq!(settings.descope.flow_id, "sign-up-or-in");
        assert_eq!(settings.descope.admin_roles, vec!["admin", "mlflow-admin"]);
        assert_eq!(settings.descope.default_permission, "READ");
        assert_eq!(settings.descope.username_claim, "sub");
        assert_eq!(settings.descope.session_cookie, "DS");
        assert_eq!(settings.descope.refresh_cookie, "DSR");
        assert!(settings.descope.cookie_secure);
        assert_eq!(settings.descope.http_timeout_secs, 10);
        assert_eq!(settings.upstream.url, "http://127.0.0.1:5000");
    }

    #[test]
    fn from_env_reads_overrides() {
        let settings = with_env(
            &[
                ("DESCOPE_PROJECT_ID", "P2live"),
                ("DESCOPE_ADMIN_ROLES", "admin, mlflow-admin ,ops"),
                ("DESCOPE_COOKIE_SECURE", "false"),
                ("SERVER_PORT", "9090"),
                ("MLFLOW_UPSTREAM_URL", "http://mlflow.internal:5000"),
            ],
            Settings::from_env,
        )
        .unwrap();

        assert_eq!(settings.descope.project_id, "P2live");
        assert_eq!(
            settings.descope.admin_roles,
            vec!["admin", "mlflow-admin", "ops"]
        );
        assert!(!settings.descope.cookie_secure);
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.upstream.url, "http://mlflow.internal:5000");
    }

    #[test]
    fn from_env_rejects_invalid_cookie_secure() {
        let err = with_env(
            &[
                ("DESCOPE_PROJECT_ID", "P2test"),
                ("DESCOPE_COOKIE_SECURE", "yes"),
            ],
            Settings::from_env,
        )
        .unwrap_err();

        assert!(matches!(err, AppError::Configuration(_)));
    }
}
