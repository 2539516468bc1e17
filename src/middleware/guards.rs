use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::error::{AppError, AppResult};
use crate::models::{AuthContext, PermissionLevel};

impl FromRequest for AuthContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = req.extensions().get::<AuthContext>().cloned();
        ready(ctx.ok_or_else(|| AppError::Auth("Not authenticated".to_string())))
    }
}

/// Extractor that rejects non-admin users with a typed 403.
#[derive(Debug)]
pub struct RequireAdmin(pub AuthContext);

impl FromRequest for RequireAdmin {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.extensions().get::<AuthContext>().cloned() {
            None => Err(AppError::Auth("Not authenticated".to_string())),
            Some(ctx) if !ctx.is_admin => {
                Err(AppError::Forbidden("Admin access required".to_string()))
            }
            Some(ctx) => Ok(RequireAdmin(ctx)),
        };
        ready(result)
    }
}

/// Guard for a specific Descope permission string.
pub fn require_permission(ctx: &AuthContext, permission: &str) -> AppResult<()> {
    if ctx.has_permission(permission) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Missing required permission: {}",
            permission
        )))
    }
}

/// Guard for a minimum MLflow permission level.
pub fn require_level(ctx: &AuthContext, level: PermissionLevel) -> AppResult<()> {
    if ctx.allows(level) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Requires {} access, user has {}",
            level, ctx.permission_level
        )))
    }
}
