// src/lib.rs
//! Job posting extraction: fetch or render a listing page, then map it to a
//! structured record via JSON-LD markup or a completion model.

pub mod browser;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod extraction;
pub mod types;
pub mod utils;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ExtractorConfig;
pub use error::{BrowserError, ExtractError};
pub use extraction::JobExtractor;
pub use types::{JobRecord, SavedJob};
pub use web::start_web_server;
