use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;

use descope_gateway::config::Settings;
use descope_gateway::middleware::SessionAuth;
use descope_gateway::models::PermissionLevel;
use descope_gateway::routes::configure_routes;
use descope_gateway::services::descope::{DescopeClient, SessionValidator};
use descope_gateway::services::proxy::UpstreamProxy;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load application settings
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load application settings: {}", e);
            log::error!("Cannot start gateway without valid settings");
            std::process::exit(1);
        }
    };

    // Reject a bad default permission now rather than per request
    if let Err(e) = settings.descope.default_permission.parse::<PermissionLevel>() {
        log::error!("Invalid DESCOPE_DEFAULT_PERMISSION: {}", e);
        std::process::exit(1);
    }

    // Initialize Descope client
    let descope_client: Arc<dyn SessionValidator> = match DescopeClient::new(&settings.descope) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("Failed to initialize Descope client: {}", e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Descope authentication enabled for project {}",
        settings.descope.project_id
    );

    // Upstream MLflow forwarder
    let upstream_proxy = web::Data::new(UpstreamProxy::new(&settings.upstream));
    log::info!("Proxying authenticated traffic to {}", settings.upstream.url);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    log::info!("Starting gateway at http://{}:{}", host, port);

    let listener = TcpListener::bind(format!("{}:{}", host, port))?;
    let descope_config = Arc::new(settings.descope.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(SessionAuth::new(
                Arc::clone(&descope_client),
                Arc::clone(&descope_config),
            ))
            .app_data(web::Data::from(Arc::clone(&descope_client)))
            .app_data(web::Data::new(settings.clone()))
            .app_data(upstream_proxy.clone())
            .configure(configure_routes)
    })
    .listen(listener)?
    .run()
    .await
}
