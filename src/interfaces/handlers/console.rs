use actix_web::{HttpResponse, Responder};
use tracing::instrument;

use crate::{errors::AppError, use_cases::extractors::Gallery};

#[instrument(skip(gallery))]
pub async fn list_servers(gallery: Gallery) -> Result<impl Responder, AppError> {
    let servers = gallery.list_servers().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": servers.len(),
        "servers": servers
    })))
}
