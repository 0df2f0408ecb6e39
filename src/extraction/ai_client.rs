// src/extraction/ai_client.rs
use super::RecordExtractor;
use crate::environment::AiSettings;
use crate::error::ExtractError;
use crate::types::response::{ChatMessage, ChatRequest, ChatResponse};
use crate::types::JobRecord;
use crate::utils::strip_code_fence;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

const SYSTEM_PROMPT: &str =
    "You extract job info into structured JSON. Keep answers concise; omit fluff.";

/// Chat-completion client that turns page text into a [`JobRecord`].
pub struct AiClient {
    client: Client,
    api_key: Option<String>,
    settings: AiSettings,
}

impl AiClient {
    pub fn new(api_key: Option<String>, settings: AiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            settings,
        })
    }

    /// Ask the model for a structured record. Transient failures are retried
    /// with exponential backoff; once retries are exhausted an empty record
    /// is returned instead of an error.
    pub async fn extract_job(&self, text: &str) -> Result<JobRecord, ExtractError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            error!("Missing OpenRouter API key. Set OPENROUTER_API_KEY in the environment or .env file.");
            ExtractError::Configuration("Missing OpenRouter API key".to_string())
        })?;

        let request = self.build_request(text);
        let base_delay = Duration::from_millis(self.settings.backoff_base_ms);

        let record = retry_with_backoff(self.settings.max_attempts, base_delay, || {
            self.send_completion(api_key, &request)
        })
        .await;

        Ok(record.unwrap_or_default())
    }

    fn build_request(&self, text: &str) -> ChatRequest {
        ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(text),
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    async fn send_completion(&self, api_key: &str, request: &ChatRequest) -> Result<JobRecord> {
        let response = self
            .client
            .post(&self.settings.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .context("Failed to send request to AI service")?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .context("Failed to read AI service response")?;

        if !status.is_success() {
            error!("AI API call failed with status: {}, response: {}", status, raw);
            anyhow::bail!("AI API error: {}", status);
        }

        let chat: ChatResponse =
            serde_json::from_str(&raw).context("Failed to parse AI service response")?;
        let content = chat
            .first_content()
            .context("AI response missing expected content")?;

        let value: serde_json::Value = serde_json::from_str(strip_code_fence(content))
            .context("Invalid JSON from AI")?;

        JobRecord::from_loose_json(&value).context("AI returned JSON that is not an object")
    }
}

#[async_trait]
impl RecordExtractor for AiClient {
    async fn extract_record(&self, text: &str) -> Result<JobRecord, ExtractError> {
        self.extract_job(text).await
    }
}

/// Run `attempt` up to `max_attempts` times, sleeping [`backoff_delay`]
/// between failures. `None` once every attempt has failed.
async fn retry_with_backoff<T, F, Fut>(max_attempts: u32, base_delay: Duration, mut attempt: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);

    for n in 1..=max_attempts {
        match attempt().await {
            Ok(value) => {
                info!(attempt = n, "Received structured job data from AI service");
                return Some(value);
            }
            Err(e) if n < max_attempts => {
                let delay = backoff_delay(base_delay, n);
                warn!(
                    attempt = n,
                    "AI extraction attempt failed: {:#}. Retrying in {:?}", e, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                error!(
                    attempts = max_attempts,
                    "AI extraction failed after multiple retries: {:#}", e
                );
            }
        }
    }

    None
}

/// Delay after the `failed_attempts`-th failure: base · 2ⁿ (2s, 4s, 8s for a
/// one second base).
pub fn backoff_delay(base: Duration, failed_attempts: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(failed_attempts))
}

pub fn build_prompt(text: &str) -> String {
    format!(
        r#"
Extract the following fields from the job post. Be as accurate and detailed as possible.

Return only raw JSON — do not wrap in code blocks.

{{
  "title": "Job title",
  "company": "Company name",
  "location": "City, state, remote, or hybrid",
  "description": "Full description of the role",
  "requirements": "List of key qualifications or expectations",
  "salary": "Any salary info mentioned",
  "duration": "If internship, how long?",
  "remote": "true/false if it's remote-friendly",
  "application_deadline": "If listed",
  "job_type": "Full-time, part-time, contract, etc",
  "posted_date": "Date the posting started.",
  "benefits": "Any listed benefits",
  "contact": "Contact name or email if available"
}}

Here is the job text:
"""{}"""
"#,
        text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    const COMPLETIONS_PATH: &str = "/api/v1/chat/completions";

    fn settings_for(server: &MockServer, backoff_base_ms: u64) -> AiSettings {
        AiSettings {
            endpoint: server.url(COMPLETIONS_PATH),
            backoff_base_ms,
            ..AiSettings::default()
        }
    }

    fn client_for(server: &MockServer, backoff_base_ms: u64) -> AiClient {
        AiClient::new(Some("sk-test".to_string()), settings_for(server, backoff_base_ms)).unwrap()
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "gen-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn test_parses_completion_into_record() {
        let server = MockServer::start_async().await;
        let content = r#"{"title": "Barista", "company": "Bean Co", "remote": false, "salary": "$18/hr"}"#;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(COMPLETIONS_PATH)
                    .header("Authorization", "Bearer sk-test");
                then.status(200).json_body(completion(content));
            })
            .await;

        let record = client_for(&server, 1).extract_job("Barista wanted").await.unwrap();

        assert_eq!(record.title.as_deref(), Some("Barista"));
        assert_eq!(record.company.as_deref(), Some("Bean Co"));
        assert_eq!(record.remote, Some(false));
        assert_eq!(record.salary.as_deref(), Some("$18/hr"));
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_fenced_completion_is_accepted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(COMPLETIONS_PATH);
                then.status(200)
                    .json_body(completion("```json\n{\"title\": \"Chef\"}\n```"));
            })
            .await;

        let record = client_for(&server, 1).extract_job("Chef needed").await.unwrap();
        assert_eq!(record.title.as_deref(), Some("Chef"));
    }

    #[tokio::test]
    async fn test_persistent_failure_yields_empty_record_after_three_attempts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(COMPLETIONS_PATH);
                then.status(500).body("upstream down");
            })
            .await;

        let record = client_for(&server, 1).extract_job("some text").await.unwrap();

        assert!(record.is_empty());
        assert_eq!(mock.hits_async().await, 3);
    }

    #[tokio::test]
    async fn test_invalid_json_content_is_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(COMPLETIONS_PATH);
                then.status(200)
                    .json_body(completion("Sure! Here is the data: title=Chef"));
            })
            .await;

        let record = client_for(&server, 1).extract_job("Chef needed").await.unwrap();

        assert!(record.is_empty());
        assert_eq!(mock.hits_async().await, 3);
    }

    #[tokio::test]
    async fn test_server_error_then_success() {
        let server = MockServer::start_async().await;
        let mut failing = server
            .mock_async(|when, then| {
                when.method(POST).path(COMPLETIONS_PATH);
                then.status(500).body("upstream down");
            })
            .await;
        let client = client_for(&server, 250);

        let extraction = tokio::spawn(async move { client.extract_job("Chef needed").await });

        // The client backs off for 500ms after the first failure
        while failing.hits_async().await == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        failing.delete_async().await;
        let succeeding = server
            .mock_async(|when, then| {
                when.method(POST).path(COMPLETIONS_PATH);
                then.status(200).json_body(completion(r#"{"title": "Chef"}"#));
            })
            .await;

        let record = extraction.await.unwrap().unwrap();
        assert_eq!(record.title.as_deref(), Some("Chef"));
        assert_eq!(succeeding.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_failed_attempts_are_spaced_by_backoff() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(COMPLETIONS_PATH);
                then.status(503);
            })
            .await;
        let started = std::time::Instant::now();

        let record = client_for(&server, 100).extract_job("text").await.unwrap();

        assert!(record.is_empty());
        assert_eq!(mock.hits_async().await, 3);
        // 200ms + 400ms
        assert!(started.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(COMPLETIONS_PATH);
                then.status(200).json_body(completion("{}"));
            })
            .await;
        let client = AiClient::new(None, settings_for(&server, 1)).unwrap();

        let err = client.extract_job("text").await.unwrap_err();
        assert!(matches!(err, ExtractError::Configuration(_)));
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_sleeps_two_then_four_seconds() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Option<()> = retry_with_backoff(3, Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow::anyhow!("upstream down")) }
        })
        .await;

        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_at_first_success() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = retry_with_backoff(3, Duration::from_secs(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(anyhow::anyhow!("upstream down"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[test]
    fn test_backoff_schedule() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(8));
    }

    #[test]
    fn test_prompt_embeds_text_and_schema() {
        let prompt = build_prompt("Line cook, evenings");
        assert!(prompt.contains("\"\"\"Line cook, evenings\"\"\""));
        for key in [
            "title",
            "company",
            "location",
            "description",
            "requirements",
            "salary",
            "duration",
            "remote",
            "application_deadline",
            "job_type",
            "posted_date",
            "benefits",
            "contact",
        ] {
            assert!(prompt.contains(&format!("\"{}\":", key)), "missing {}", key);
        }
    }
}
