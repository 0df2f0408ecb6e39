// src/extraction/mod.rs
use async_trait::async_trait;

use crate::error::ExtractError;
use crate::types::JobRecord;

pub mod ai_client;
pub mod content;
pub mod job_extractor;
pub mod job_fetcher;
pub mod json_ld;
pub mod url_rewrite;

pub use ai_client::AiClient;
pub use job_extractor::JobExtractor;
pub use job_fetcher::JobFetcher;

/// Where a page's HTML came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Fetch,
    Browser,
}

/// Retrieved HTML, consumed once by the content normalizer.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub html: String,
    pub provenance: Provenance,
}

impl RawPage {
    pub fn new(html: String, provenance: Provenance) -> Self {
        Self { html, provenance }
    }
}

/// A way of turning a URL into HTML. Implementations never fail loudly:
/// every failure mode collapses to `None`.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Option<RawPage>;
}

/// Turns normalized page text into a job record.
///
/// An empty record is a valid (degraded) answer; only configuration
/// problems are returned as errors.
#[async_trait]
pub trait RecordExtractor: Send + Sync {
    async fn extract_record(&self, text: &str) -> Result<JobRecord, ExtractError>;
}
