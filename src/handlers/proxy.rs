use actix_web::{web, HttpRequest, HttpResponse};
use bytes::Bytes;

use crate::error::AppError;
use crate::services::proxy::UpstreamProxy;

/// Catch-all: everything the gateway does not serve itself goes to the
/// wrapped MLflow tracking server.
pub async fn forward_to_mlflow(
    req: HttpRequest,
    body: Bytes,
    proxy: web::Data<UpstreamProxy>,
) -> Result<HttpResponse, AppError> {
    proxy.forward(&req, body).await
}
