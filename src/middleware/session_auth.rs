use actix_web::{
    body::EitherBody,
    cookie::{time::Duration, Cookie, SameSite},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponse,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::{debug, error, warn};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::config::DescopeConfig;
use crate::error::AppError;
use crate::models::AuthContext;
use crate::propagation::{ClaimsPropagator, ExtensionPropagator};
use crate::services::authz;
use crate::services::descope::{extract_claims, SessionValidator};

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGIN_ERROR_PATH: &str = "/auth/login?error=internal_error";

/// Lifetime of a refreshed session cookie, matching the Descope session TTL.
const SESSION_COOKIE_MAX_AGE_SECS: i64 = 3600;

/// Paths served without authentication. Exact matches only; accidental
/// substring matches must not open up protected routes.
const PUBLIC_ROUTES: [&str; 7] = [
    "/auth/login",
    "/auth/logout",
    "/auth/config",
    "/health",
    "/docs",
    "/openapi.json",
    "/redoc",
];

/// Static-asset prefixes, the only place prefix matching is allowed.
const PUBLIC_PREFIXES: [&str; 2] = ["/static/", "/_static/"];

pub fn is_public_route(path: &str) -> bool {
    if PUBLIC_ROUTES.contains(&path) {
        return true;
    }
    PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Session-validation middleware: the per-request authentication gate.
///
/// Public routes pass straight through. Protected routes require a valid
/// Descope session cookie; missing or rejected sessions redirect to the login
/// page, and a transparently refreshed session is written back to the client
/// as an updated cookie on the way out.
#[derive(Clone)]
pub struct SessionAuth {
    validator: Arc<dyn SessionValidator>,
    config: Arc<DescopeConfig>,
}

impl SessionAuth {
    pub fn new(validator: Arc<dyn SessionValidator>, config: Arc<DescopeConfig>) -> Self {
        Self { validator, config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SessionAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionAuthMiddleware {
            service: Rc::new(service),
            validator: Arc::clone(&self.validator),
            config: Arc::clone(&self.config),
        })
    }
}

pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
    validator: Arc<dyn SessionValidator>,
    config: Arc<DescopeConfig>,
}

/// Terminal redirect response for an unauthenticated request.
fn login_redirect<B>(req: ServiceRequest, location: &str) -> ServiceResponse<EitherBody<B>> {
    let (request, _payload) = req.into_parts();
    let response = HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
        .map_into_right_body();
    ServiceResponse::new(request, response)
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let validator = Arc::clone(&self.validator);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let path = req.path().to_string();

            // Public routes never touch the validator, whatever cookies the
            // request carries.
            if is_public_route(&path) {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let session_token = req
                .cookie(&config.session_cookie)
                .map(|c| c.value().to_string());
            let refresh_token = req
                .cookie(&config.refresh_cookie)
                .map(|c| c.value().to_string());

            let Some(session_token) = session_token else {
                debug!("No session cookie for path: {}", path);
                return Ok(login_redirect(req, LOGIN_PATH));
            };

            let validation = match validator
                .validate(&session_token, refresh_token.as_deref())
                .await
            {
                Ok(validation) => validation,
                Err(AppError::Auth(e)) => {
                    warn!("Session validation failed for path {}: {}", path, e);
                    return Ok(login_redirect(req, LOGIN_PATH));
                }
                Err(e) => {
                    // Logged in full server-side; the client only sees a
                    // generic error marker on the login page.
                    error!("Authentication error for path {}: {}", path, e);
                    return Ok(login_redirect(req, LOGIN_ERROR_PATH));
                }
            };

            let claims = extract_claims(&validation, &config);
            let is_admin = authz::is_admin(&claims.roles, &config.admin_roles);
            let permission_level = authz::permission_level(&claims.roles, &claims.permissions, &config);

            debug!(
                "Authenticated user {} (admin: {}, level: {}) for path {}",
                claims.username, is_admin, permission_level, path
            );

            let ctx = AuthContext {
                claims,
                is_admin,
                permission_level,
            };
            ExtensionPropagator.propagate(&ctx, &mut *req.extensions_mut());

            let new_session_jwt = validation.session_jwt;
            let res = service.call(req).await?;
            let mut res = res.map_into_left_body();

            // Write the cookie back only when the token actually changed;
            // an unchanged token emits no Set-Cookie at all.
            if new_session_jwt != session_token {
                let cookie = Cookie::build(config.session_cookie.clone(), new_session_jwt)
                    .path("/")
                    .max_age(Duration::seconds(SESSION_COOKIE_MAX_AGE_SECS))
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .secure(config.cookie_secure)
                    .finish();

                if let Err(e) = res.response_mut().add_cookie(&cookie) {
                    error!("Failed to set refreshed session cookie: {}", e);
                } else {
                    debug!("Updated session cookie for user {}", ctx.claims.username);
                }
            }

            Ok(res)
        })
    }
}
