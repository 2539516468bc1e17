use crate::config::DescopeConfig;
use crate::error::AppError;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;

/// Result of a successful session validation against Descope.
///
/// Consumed immediately by the claims extractor; never stored beyond the
/// request that produced it.
#[derive(Clone, Debug)]
pub struct SessionValidation {
    /// The session JWT the caller should continue using. Differs from the
    /// inbound token only when Descope issued a refreshed session.
    pub session_jwt: String,
    pub refreshed: bool,
    /// Raw claim fields from the provider response.
    pub claims: Map<String, Value>,
}

/// Seam between the request gate and the identity provider. Production code
/// uses [`DescopeClient`]; tests inject their own implementation.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a session token, refreshing it through `refresh_token` when
    /// the provider reports it expired. Without a refresh token, expiry fails
    /// outright. Failures are never retried here.
    async fn validate(
        &self,
        session_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<SessionValidation, AppError>;

    /// Fetch the user profile associated with a refresh token.
    async fn me(&self, refresh_token: &str) -> Result<Map<String, Value>, AppError>;
}

/// HTTP client for the Descope session API.
pub struct DescopeClient {
    client: Client,
    base_url: String,
    project_id: String,
}

impl DescopeClient {
    pub fn new(config: &DescopeConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        info!(
            "Initialized Descope client for project {} against {}",
            config.project_id, config.base_url
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionValidation, AppError> {
        let url = format!("{}/v1/auth/refresh", self.base_url);
        debug!("Refreshing Descope session");

        let response = self
            .client
            .post(&url)
            .bearer_auth(format!("{}:{}", self.project_id, refresh_token))
            .send()
            .await
            .map_err(|e| AppError::External(format!("Descope refresh request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            warn!("Descope session refresh rejected: HTTP {}", status);
            return Err(AppError::Auth(format!("Session refresh rejected: HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(AppError::External(format!("Descope refresh error: HTTP {}", status)));
        }

        let claims = parse_claims_body(response).await?;
        let session_jwt = claims
            .get("sessionJwt")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AppError::External("Descope refresh response missing sessionJwt".to_string())
            })?
            .to_string();

        debug!("Session refreshed successfully");
        Ok(SessionValidation {
            session_jwt,
            refreshed: true,
            claims,
        })
    }
}

#[async_trait]
impl SessionValidator for DescopeClient {
    async fn validate(
        &self,
        session_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<SessionValidation, AppError> {
        let url = format!("{}/v1/auth/validate", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.project_id)
            .json(&serde_json::json!({ "sessionJwt": session_token }))
            .send()
            .await
            .map_err(|e| AppError::External(format!("Descope validate request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let claims = parse_claims_body(response).await?;
            debug!("Session validated successfully");
            return Ok(SessionValidation {
                session_jwt: session_token.to_string(),
                refreshed: false,
                claims,
            });
        }

        // An expired session is recoverable when the caller holds a refresh
        // token; every other client error is a hard rejection.
        if status == StatusCode::UNAUTHORIZED {
            if let Some(refresh_token) = refresh_token {
                debug!("Session validation returned 401, attempting refresh");
                return self.refresh(refresh_token).await;
            }
        }

        if status.is_client_error() {
            warn!("Descope session validation rejected: HTTP {}", status);
            return Err(AppError::Auth(format!("Invalid session: HTTP {}", status)));
        }

        Err(AppError::External(format!("Descope validate error: HTTP {}", status)))
    }

    async fn me(&self, refresh_token: &str) -> Result<Map<String, Value>, AppError> {
        let url = format!("{}/v1/auth/me", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(format!("{}:{}", self.project_id, refresh_token))
            .send()
            .await
            .map_err(|e| AppError::External(format!("Descope /me request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(AppError::Auth(format!("Invalid refresh token: HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(AppError::External(format!("Descope /me error: HTTP {}", status)));
        }

        parse_claims_body(response).await
    }
}

async fn parse_claims_body(response: reqwest::Response) -> Result<Map<String, Value>, AppError> {
    let body: Value = response
        .json()
        .await
        .map_err(|e| AppError::External(format!("Failed to parse Descope response: {}", e)))?;

    match body {
        Value::Object(map) => Ok(map),
        other => Err(AppError::External(format!(
            "Unexpected Descope response shape: {}",
            other
        ))),
    }
}
