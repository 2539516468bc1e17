use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    http::header,
    web, HttpRequest, HttpResponse,
};
use log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Settings;
use crate::error::AppError;
use crate::models::AuthContext;
use crate::services::descope::SessionValidator;

/// Login page embedding the Descope web component. On success the component
/// stores the session/refresh JWTs in cookies and redirects into MLflow.
const LOGIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>MLflow Login</title>
    <script src="{web_component_url}"></script>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
            margin: 0;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
        }
        .container {
            background: white;
            padding: 2.5rem;
            border-radius: 12px;
            box-shadow: 0 10px 40px rgba(0, 0, 0, 0.2);
            text-align: center;
            max-width: 400px;
            width: 90%;
        }
        .error-message {
            background: #fee2e2;
            border: 1px solid #ef4444;
            color: #dc2626;
            padding: 0.75rem;
            border-radius: 6px;
            margin-bottom: 1rem;
            font-size: 0.875rem;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>MLflow</h1>
        <p>Sign in to continue</p>
        <div id="error-container">{error_banner}</div>
        <descope-wc project-id="{project_id}" flow-id="{flow_id}"></descope-wc>
    </div>
    <script>
        const wc = document.querySelector('descope-wc');
        wc.addEventListener('success', (e) => {
            const secure = window.location.protocol === 'https:' ? '; secure' : '';
            const base = 'path=/; max-age=86400; samesite=lax' + secure;
            document.cookie = '{session_cookie}=' + e.detail.sessionJwt + '; ' + base;
            if (e.detail.refreshJwt) {
                document.cookie = '{refresh_cookie}=' + e.detail.refreshJwt + '; ' + base;
            }
            window.location.href = '{redirect_url}';
        });
    </script>
</body>
</html>"#;

#[derive(Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

pub async fn login(
    settings: web::Data<Settings>,
    query: web::Query<LoginQuery>,
) -> HttpResponse {
    // Never echo the error value back; the marker only selects a generic banner.
    let error_banner = if query.error.is_some() {
        r#"<div class="error-message">Authentication failed. Please try again.</div>"#
    } else {
        ""
    };

    let descope = &settings.descope;
    let html = LOGIN_TEMPLATE
        .replace("{web_component_url}", &descope.web_component_url())
        .replace("{project_id}", &descope.project_id)
        .replace("{flow_id}", &descope.flow_id)
        .replace("{session_cookie}", &descope.session_cookie)
        .replace("{refresh_cookie}", &descope.refresh_cookie)
        .replace("{redirect_url}", &descope.redirect_url)
        .replace("{error_banner}", error_banner);

    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html)
}

fn expired_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(name.to_string(), "")
        .path("/")
        .max_age(Duration::ZERO)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish()
}

/// Clear both auth cookies and send the user back to the login page.
pub async fn logout(settings: web::Data<Settings>) -> HttpResponse {
    let descope = &settings.descope;

    info!("User logged out");
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/auth/login"))
        .cookie(expired_cookie(&descope.session_cookie, descope.cookie_secure))
        .cookie(expired_cookie(&descope.refresh_cookie, descope.cookie_secure))
        .finish()
}

/// Current authenticated user, as resolved by the session middleware. When
/// the request carries a refresh cookie the provider profile is fetched and
/// attached under `profile`; a failed lookup degrades to the claims-only
/// response.
pub async fn user_info(
    req: HttpRequest,
    ctx: AuthContext,
    settings: web::Data<Settings>,
    validator: web::Data<dyn SessionValidator>,
) -> Result<HttpResponse, AppError> {
    let mut body = json!({
        "user_id": ctx.claims.user_id,
        "username": ctx.claims.username,
        "email": ctx.claims.email,
        "name": ctx.claims.name,
        "roles": ctx.claims.roles,
        "permissions": ctx.claims.permissions,
        "tenants": ctx.claims.tenants,
        "is_admin": ctx.is_admin,
        "permission_level": ctx.permission_level,
    });

    if let Some(refresh) = req.cookie(&settings.descope.refresh_cookie) {
        match validator.me(refresh.value()).await {
            Ok(profile) => {
                body["profile"] = Value::Object(profile);
            }
            Err(e) => warn!("Profile lookup failed for {}: {}", ctx.claims.username, e),
        }
    }

    Ok(HttpResponse::Ok().json(body))
}

/// Public bootstrap data for front-end integrations.
pub async fn auth_config(settings: web::Data<Settings>) -> HttpResponse {
    let descope = &settings.descope;

    HttpResponse::Ok().json(json!({
        "project_id": descope.project_id,
        "flow_id": descope.flow_id,
        "web_component_url": descope.web_component_url(),
        "session_cookie": descope.session_cookie,
        "refresh_cookie": descope.refresh_cookie,
    }))
}
