use actix_web::{get, web, HttpResponse, Responder};
use humantime::format_duration;
use serde::Serialize;
use std::time::Duration;

use crate::{constants::START_TIME, AppState};

#[derive(Serialize)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    start_at: String,
    backend: String,
    storage: String,
    version: String,
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now_utc = chrono::Utc::now();
    let uptime = now_utc.signed_duration_since(*START_TIME).num_seconds().max(0) as u64;

    let storage = match state.provider.check_connection().await {
        Ok(_) => "OK",
        Err(e) => {
            tracing::warn!("Storage health check failed: {}", e);
            "Unavailable"
        }
    };

    let response = HealthCheckResponse {
        status: if storage == "OK" { "healthy" } else { "degraded" }.to_string(),
        uptime: format_duration(Duration::from_secs(uptime)).to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        backend: state.provider.backend().to_string(),
        storage: storage.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    if storage == "OK" {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
