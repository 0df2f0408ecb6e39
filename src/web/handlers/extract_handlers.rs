// src/web/handlers/extract_handlers.rs
use crate::extraction::JobExtractor;
use crate::types::{ExtractRequest, ExtractResponse};

use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::State;
use tracing::{error, info, warn};

pub async fn extract_handler(
    request: Result<Json<ExtractRequest>, json::Error<'_>>,
    extractor: &State<JobExtractor>,
) -> (Status, Json<ExtractResponse>) {
    // A body that is not `{"url": "<string>"}` is treated like a missing URL
    let url = match request {
        Ok(Json(request)) => request.url,
        Err(e) => {
            warn!("Unreadable extract request body: {}", e);
            None
        }
    };

    match extractor.extract(url.as_deref()).await {
        Ok(record) => {
            info!("Extraction succeeded for {}", url.as_deref().unwrap_or_default());
            (Status::Ok, Json(ExtractResponse::success(record)))
        }
        Err(e) => {
            let status = Status::from_code(e.status_code()).unwrap_or(Status::InternalServerError);
            if status.code >= 500 {
                error!("Extraction failed: {}", e);
            } else {
                warn!("Extraction rejected: {}", e);
            }
            (status, Json(ExtractResponse::from(&e)))
        }
    }
}
