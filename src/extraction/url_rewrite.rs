// src/extraction/url_rewrite.rs
//! Site-specific rewrites from listing/search links to canonical job pages

use regex::Regex;
use std::sync::OnceLock;

fn handshake_job_id() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"job-search/(\d+)").ok()).as_ref()
}

fn linkedin_current_job_id() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"currentJobId=(\d+)").ok()).as_ref()
}

/// Rewrite a job URL to the page that actually renders the posting.
/// Unmatched URLs pass through unchanged.
pub fn normalize_job_url(url: &str) -> String {
    let mut url = url.to_string();

    if url.contains("joinhandshake.com/job-search/") {
        if let Some(job_id) = capture_id(handshake_job_id(), &url) {
            url = format!("https://app.joinhandshake.com/jobs/{}", job_id);
        }
    }

    if url.contains("linkedin.com/jobs/collections") && url.contains("currentJobId=") {
        if let Some(job_id) = capture_id(linkedin_current_job_id(), &url) {
            url = format!("https://www.linkedin.com/jobs/view/{}", job_id);
        }
    }

    url
}

fn capture_id(re: Option<&Regex>, url: &str) -> Option<String> {
    re?.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn is_handshake(url: &str) -> bool {
    url.contains("joinhandshake.com")
}
