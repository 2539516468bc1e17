use actix_web::web;

use crate::handlers::{auth, health, proxy};

/// Gateway-served routes. Everything else falls through to the MLflow
/// upstream via the catch-all default service.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::get().to(auth::login))
            .route("/logout", web::get().to(auth::logout))
            .route("/user", web::get().to(auth::user_info))
            .route("/config", web::get().to(auth::auth_config)),
    );

    cfg.route("/health", web::get().to(health::health_check));

    cfg.default_service(web::route().to(proxy::forward_to_mlflow));
}
