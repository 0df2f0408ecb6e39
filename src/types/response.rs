use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::types::job_record::JobRecord;

// ===== Inbound API Types =====

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractRequest {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JobRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ExtractResponse {
    pub fn success(record: JobRecord) -> Self {
        Self {
            success: true,
            data: Some(record),
            error: None,
            error_code: None,
        }
    }

    pub fn failure(error: String, error_code: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            error_code: Some(error_code.to_string()),
        }
    }
}

impl From<&ExtractError> for ExtractResponse {
    fn from(err: &ExtractError) -> Self {
        Self::failure(err.to_string(), err.error_code())
    }
}

// ===== Chat Completion Service Types =====

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if the service returned any.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
            .filter(|content| !content.trim().is_empty())
    }
}
