// src/extraction/job_extractor.rs
use super::content::extract_clean_text;
use super::json_ld::extract_job_posting;
use super::url_rewrite::normalize_job_url;
use super::{AiClient, JobFetcher, PageSource, RecordExtractor};
use crate::browser::{BrowserAutomator, ChromeLauncher};
use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use crate::types::JobRecord;
use crate::utils::char_len;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Plain-fetch pages shorter than this are usually client-rendered shells.
pub const RENDER_THRESHOLD_CHARS: usize = 10_000;

/// Below this much readable text (and no structured markup) there is
/// nothing worth extracting.
pub const MIN_TEXT_CHARS: usize = 100;

const LOGIN_MARKERS: &[&str] = &[
    "Sign in",
    "Sign up",
    "Enter your email",
    "Get connected",
    "Log in",
    "Join now",
    "Create account",
];

/// URL in, job record out.
pub struct JobExtractor {
    fetcher: Arc<dyn PageSource>,
    browser: Arc<dyn PageSource>,
    ai: Arc<dyn RecordExtractor>,
}

impl JobExtractor {
    pub fn new(
        fetcher: Arc<dyn PageSource>,
        browser: Arc<dyn PageSource>,
        ai: Arc<dyn RecordExtractor>,
    ) -> Self {
        Self { fetcher, browser, ai }
    }

    /// Wire the production stages from resolved configuration.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        let fetcher = JobFetcher::new()?;
        let browser = BrowserAutomator::new(
            Arc::new(ChromeLauncher::new(config.environment.browser.clone())),
            config.credentials.clone(),
            config.environment.browser.clone(),
            config.fast_mode,
        );
        let ai = AiClient::new(config.ai_api_key.clone(), config.environment.ai.clone())?;

        Ok(Self::new(Arc::new(fetcher), Arc::new(browser), Arc::new(ai)))
    }

    pub async fn extract(&self, url: Option<&str>) -> Result<JobRecord, ExtractError> {
        let span = info_span!("extract", extraction_id = %Uuid::new_v4());
        self.run(url).instrument(span).await
    }

    async fn run(&self, url: Option<&str>) -> Result<JobRecord, ExtractError> {
        let url = validate_url(url)?;
        let url = normalize_job_url(url);
        info!("Extracting job from {}", url);

        let mut page = self.fetcher.fetch_page(&url).await;
        let fetched_html = page.as_ref().map(|p| p.html.as_str());
        if needs_rendering(fetched_html) {
            info!("Plain fetch insufficient, rendering {} in browser", url);
            page = self.browser.fetch_page(&url).await;
        }

        let Some(page) = page else {
            warn!("No HTML retrieved for {}", url);
            return Err(ExtractError::RetrievalFailure { url });
        };

        let text = extract_clean_text(&page.html);
        let markup = extract_job_posting(&page.html);
        let text_len = char_len(&text);

        if text_len < MIN_TEXT_CHARS && markup.is_none() {
            warn!("Only {} characters of readable text on {}", text_len, url);
            return Err(ExtractError::InsufficientContent { url, text_len });
        }

        if let Some(record) = markup {
            info!("Using JSON-LD JobPosting markup");
            return Ok(record);
        }

        info!("No structured markup, sending {} characters to AI", text_len);
        self.ai.extract_record(&text).await
    }
}

fn validate_url(url: Option<&str>) -> Result<&str, ExtractError> {
    let invalid = || ExtractError::InvalidInput {
        url: url.map(str::to_string),
    };

    let url = url.map(str::trim).filter(|u| u.starts_with("http")).ok_or_else(invalid)?;
    let parsed = url::Url::parse(url).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(url),
        _ => Err(invalid()),
    }
}

/// Escalate to the browser when the plain fetch failed, looks like a
/// client-rendered shell, or shows a login prompt.
pub fn needs_rendering(html: Option<&str>) -> bool {
    match html {
        None => true,
        Some(html) => {
            char_len(html) < RENDER_THRESHOLD_CHARS
                || LOGIN_MARKERS.iter().any(|marker| html.contains(marker))
        }
    }
}
