//! Hand-off of the resolved identity to whatever runtime sits downstream.
//!
//! Two concrete strategies behind one adapter trait: header injection for the
//! proxied MLflow upstream, and request-extension attachment for handlers
//! served by this process.

use crate::models::AuthContext;
use actix_web::dev::Extensions;
use log::warn;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

pub const HEADER_USERNAME: &str = "x-mlflow-descope-username";
pub const HEADER_ADMIN: &str = "x-mlflow-descope-admin";
pub const HEADER_EMAIL: &str = "x-mlflow-descope-email";
pub const HEADER_ROLES: &str = "x-mlflow-descope-roles";
pub const HEADER_PERMISSIONS: &str = "x-mlflow-descope-permissions";
pub const HEADER_REMOTE_USER: &str = "remote-user";

/// Adapter from a resolved [`AuthContext`] to a downstream hand-off target.
pub trait ClaimsPropagator {
    type Target;

    fn propagate(&self, ctx: &AuthContext, target: &mut Self::Target);
}

/// Writes identity headers onto the request forwarded to the wrapped MLflow
/// server. Without a username nothing is written at all, so the upstream sees
/// no trace of auth fields rather than empty strings.
pub struct HeaderPropagator;

impl HeaderPropagator {
    fn set(headers: &mut HeaderMap, name: &'static str, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(name), value);
            }
            Err(_) => {
                warn!("Dropping identity header {}: value not header-safe", name);
            }
        }
    }
}

impl ClaimsPropagator for HeaderPropagator {
    type Target = HeaderMap;

    fn propagate(&self, ctx: &AuthContext, headers: &mut HeaderMap) {
        let username = &ctx.claims.username;
        if username.is_empty() {
            return;
        }

        Self::set(headers, HEADER_USERNAME, username);
        Self::set(headers, HEADER_ADMIN, if ctx.is_admin { "true" } else { "false" });
        Self::set(
            headers,
            HEADER_EMAIL,
            ctx.claims.email.as_deref().unwrap_or(username),
        );
        Self::set(headers, HEADER_ROLES, &ctx.claims.roles.join(","));
        Self::set(headers, HEADER_PERMISSIONS, &ctx.claims.permissions.join(","));
        Self::set(headers, HEADER_REMOTE_USER, username);
    }
}

/// Attaches the context to actix request extensions for in-process handlers.
/// The attachment lives exactly as long as the request.
pub struct ExtensionPropagator;

impl ClaimsPropagator for ExtensionPropagator {
    type Target = Extensions;

    fn propagate(&self, ctx: &AuthContext, extensions: &mut Extensions) {
        extensions.insert(ctx.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PermissionLevel, UserClaims};
    use pretty_assertions::assert_eq;
    use serde_json::Map;

    fn context(username: &str, email: Option<&str>) -> AuthContext {
        AuthContext {
            claims: UserClaims {
                user_id: Some("U1".to_string()),
                username: username.to_string(),
                email: email.map(str::to_string),
                name: None,
                roles: vec!["admin".to_string(), "user".to_string()],
                permissions: vec!["mlflow:manage".to_string()],
                tenants: Map::new(),
                session_jwt: "jwt".to_string(),
            },
            is_admin: true,
            permission_level: PermissionLevel::Manage,
        }
    }

    #[test]
    fn header_propagation_sets_all_identity_fields() {
        let mut headers = HeaderMap::new();
        HeaderPropagator.propagate(&context("alice", Some("alice@example.com")), &mut headers);

        assert_eq!(headers.get(HEADER_USERNAME).unwrap(), "alice");
        assert_eq!(headers.get(HEADER_ADMIN).unwrap(), "true");
        assert_eq!(headers.get(HEADER_EMAIL).unwrap(), "alice@example.com");
        assert_eq!(headers.get(HEADER_ROLES).unwrap(), "admin,user");
        assert_eq!(headers.get(HEADER_PERMISSIONS).unwrap(), "mlflow:manage");
        assert_eq!(headers.get(HEADER_REMOTE_USER).unwrap(), "alice");
    }

    #[test]
    fn email_header_falls_back_to_username() {
        let mut headers = HeaderMap::new();
        HeaderPropagator.propagate(&context("alice", None), &mut headers);

        assert_eq!(headers.get(HEADER_EMAIL).unwrap(), "alice");
    }

    #[test]
    fn empty_username_writes_nothing() {
        let mut headers = HeaderMap::new();
        HeaderPropagator.propagate(&context("", None), &mut headers);

        assert!(headers.is_empty());
    }

    #[test]
    fn extension_propagation_attaches_context() {
        let mut extensions = Extensions::new();
        ExtensionPropagator.propagate(&context("alice", None), &mut extensions);

        let stored = extensions.get::<AuthContext>().unwrap();
        assert_eq!(stored.claims.username, "alice");
        assert!(stored.is_admin);
    }
}
