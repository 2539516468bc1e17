use actix_web::{http::StatusCode, HttpMessage, HttpRequest, HttpResponse};
use bytes::Bytes;
use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::config::UpstreamConfig;
use crate::error::AppError;
use crate::models::AuthContext;
use crate::propagation::{self, ClaimsPropagator, HeaderPropagator};

/// Headers that must not be relayed between the client, this gateway, and
/// the upstream tracking server.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Forwards requests to the wrapped MLflow tracking server, injecting the
/// resolved identity as headers on the way through.
pub struct UpstreamProxy {
    client: Client,
    base_url: String,
}

impl UpstreamProxy {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn forward(&self, req: &HttpRequest, body: Bytes) -> Result<HttpResponse, AppError> {
        let mut url = format!("{}{}", self.base_url, req.uri().path());
        if let Some(query) = req.uri().query() {
            url.push('?');
            url.push_str(query);
        }

        let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
            .map_err(|_| AppError::BadRequest(format!("Unsupported method: {}", req.method())))?;

        // actix and reqwest sit on different `http` crate versions, so
        // headers cross the boundary by value.
        let mut headers = HeaderMap::new();
        for (name, value) in req.headers() {
            if is_hop_by_hop(name.as_str()) {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_str().as_bytes()),
                HeaderValue::from_bytes(value.as_bytes()),
            ) {
                headers.append(name, value);
            }
        }

        // Identity headers always originate here, never from the client.
        for name in [
            propagation::HEADER_USERNAME,
            propagation::HEADER_ADMIN,
            propagation::HEADER_EMAIL,
            propagation::HEADER_ROLES,
            propagation::HEADER_PERMISSIONS,
            propagation::HEADER_REMOTE_USER,
        ] {
            headers.remove(name);
        }

        let ctx = req.extensions().get::<AuthContext>().cloned();
        if let Some(ctx) = &ctx {
            HeaderPropagator.propagate(ctx, &mut headers);
            debug!(
                "Forwarding {} {} upstream as user {}",
                req.method(),
                req.uri().path(),
                ctx.claims.username
            );
        }

        let upstream = self
            .client
            .request(method, &url)
            .headers(headers)
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| {
                error!("Upstream request to {} failed: {}", url, e);
                AppError::External(format!("Upstream request failed: {}", e))
            })?;

        let status = StatusCode::from_u16(upstream.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut builder = HttpResponse::build(status);
        for (name, value) in upstream.headers() {
            if is_hop_by_hop(name.as_str()) {
                continue;
            }
            if let Ok(value) = actix_web::http::header::HeaderValue::from_bytes(value.as_bytes()) {
                builder.append_header((name.as_str(), value));
            }
        }

        let body = upstream
            .bytes()
            .await
            .map_err(|e| AppError::External(format!("Failed to read upstream response: {}", e)))?;

        Ok(builder.body(body))
    }
}
