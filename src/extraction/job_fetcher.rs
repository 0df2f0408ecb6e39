// src/extraction/job_fetcher.rs
use super::{PageSource, Provenance, RawPage};
use crate::utils::char_len;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Bodies at or below this many characters are redirects, error pages or
/// login gates rather than postings.
pub const MIN_BODY_CHARS: usize = 500;

/// Plain HTTP retrieval, the cheap first attempt for every URL.
pub struct JobFetcher {
    client: Client,
}

impl JobFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Option<RawPage> {
        info!("Fetching job post: {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Job fetch failed for {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Job fetch for {} returned HTTP {}", url, response.status());
            return None;
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to read response body for {}: {}", url, e);
                return None;
            }
        };

        accept_body(html).map(|html| RawPage::new(html, Provenance::Fetch))
    }
}

#[async_trait]
impl PageSource for JobFetcher {
    async fn fetch_page(&self, url: &str) -> Option<RawPage> {
        self.fetch(url).await
    }
}

fn accept_body(html: String) -> Option<String> {
    let len = char_len(&html);
    if len > MIN_BODY_CHARS {
        Some(html)
    } else {
        debug!("Discarding thin response body ({} chars)", len);
        None
    }
}
