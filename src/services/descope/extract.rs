use crate::config::DescopeConfig;
use crate::models::UserClaims;
use crate::services::descope::SessionValidation;
use serde_json::{Map, Value};

fn str_claim(claims: &Map<String, Value>, key: &str) -> Option<String> {
    claims.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn string_list_claim(claims: &Map<String, Value>, key: &str) -> Vec<String> {
    claims
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Normalize a provider response into a [`UserClaims`] record.
///
/// Pure function of its inputs. Username resolution order is a contract:
/// configured claim, then `email`, then `sub`, then the literal `"unknown"`.
/// Missing roles/permissions/tenants become empty collections, never nulls.
pub fn extract_claims(validation: &SessionValidation, config: &DescopeConfig) -> UserClaims {
    let claims = &validation.claims;

    let username = str_claim(claims, &config.username_claim)
        .or_else(|| str_claim(claims, "email"))
        .or_else(|| str_claim(claims, "sub"))
        .unwrap_or_else(|| "unknown".to_string());

    let tenants = claims
        .get("tenants")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    UserClaims {
        user_id: str_claim(claims, "sub"),
        username,
        email: str_claim(claims, "email"),
        name: str_claim(claims, "name"),
        roles: string_list_claim(claims, "roles"),
        permissions: string_list_claim(claims, "permissions"),
        tenants,
        session_jwt: validation.session_jwt.clone(),
    }
}
