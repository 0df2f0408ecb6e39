// src/web/handlers/system_handlers.rs
use crate::web::types::HealthResponse;

use rocket::serde::json::Json;
use tracing::debug;

pub async fn health_handler() -> Json<HealthResponse> {
    debug!("Health check");
    Json(HealthResponse::ok())
}
