// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use crate::environment::ServerSettings;
use crate::extraction::JobExtractor;
use crate::types::{ExtractRequest, ExtractResponse};
use anyhow::{Context, Result};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::{self, Json};
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use tracing::info;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new("Access-Control-Allow-Methods", "POST, GET, OPTIONS"));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

#[post("/extract", data = "<request>")]
pub async fn extract(
    request: Result<Json<ExtractRequest>, json::Error<'_>>,
    extractor: &State<JobExtractor>,
) -> (Status, Json<ExtractResponse>) {
    handlers::extract_handler(request, extractor).await
}

#[get("/health")]
pub async fn health() -> Json<HealthResponse> {
    handlers::health_handler().await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<ExtractResponse> {
    Json(ExtractResponse::failure(
        "Invalid request format".to_string(),
        "BAD_REQUEST",
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<ExtractResponse> {
    Json(ExtractResponse::failure("Not found".to_string(), "NOT_FOUND"))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<ExtractResponse> {
    Json(ExtractResponse::failure(
        "Invalid or missing URL".to_string(),
        "INVALID_URL",
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ExtractResponse> {
    Json(ExtractResponse::failure(
        "Server error during job extraction".to_string(),
        "INTERNAL_ERROR",
    ))
}

pub fn build_rocket(settings: &ServerSettings, extractor: JobExtractor) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", settings.address.clone()))
        .merge(("port", settings.port));

    rocket::custom(figment)
        .attach(Cors)
        .manage(extractor)
        .register(
            "/",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
        .mount("/api", routes![extract, health, options])
}

// Main server start function
pub async fn start_web_server(settings: &ServerSettings, extractor: JobExtractor) -> Result<()> {
    info!(
        "Starting job extraction API on http://{}:{}",
        settings.address, settings.port
    );

    let _rocket = build_rocket(settings, extractor)
        .launch()
        .await
        .context("Rocket server failed")?;

    Ok(())
}
