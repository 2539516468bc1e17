use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::config::Settings;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    status: String,
    service: String,
    project_id: String,
}

pub async fn health_check(settings: web::Data<Settings>) -> impl Responder {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        project_id: settings.descope.project_id.clone(),
    };

    HttpResponse::Ok().json(response)
}
