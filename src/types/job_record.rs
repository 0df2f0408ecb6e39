// src/types/job_record.rs
//! Canonical job record shared by the JSON-LD and AI extraction paths

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ===== Canonical Record =====

/// Structured job posting. Every field is optional; a missing value is `None`
/// and is serialized as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub salary: Option<String>,
    pub duration: Option<String>,
    pub remote: Option<bool>,
    pub application_deadline: Option<String>,
    pub job_type: Option<String>,
    pub posted_date: Option<String>,
    pub benefits: Option<String>,
    pub contact: Option<String>,
}

impl JobRecord {
    /// True when no field carries a value (the degraded AI result).
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build a record from a loosely-typed JSON object, as returned by a
    /// completion model. Returns `None` if the value is not an object.
    pub fn from_loose_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| obj.get(key).and_then(loose_string);

        Some(Self {
            title: text("title"),
            company: text("company"),
            location: text("location"),
            description: text("description"),
            requirements: text("requirements"),
            salary: text("salary"),
            duration: text("duration"),
            remote: obj.get("remote").and_then(loose_bool),
            application_deadline: text("application_deadline"),
            job_type: text("job_type"),
            posted_date: text("posted_date"),
            benefits: text("benefits"),
            contact: text("contact"),
        })
    }

    /// Attach the identifier and application date assigned at save time.
    pub fn into_saved(self) -> SavedJob {
        SavedJob {
            id: Uuid::new_v4(),
            application_date: Utc::now(),
            record: self,
        }
    }
}

// ===== Persisted Shape =====

/// The shape handed to the document store: record fields plus the
/// server-assigned id and application timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedJob {
    pub id: Uuid,
    pub application_date: DateTime<Utc>,
    #[serde(flatten)]
    pub record: JobRecord,
}

// ===== Lenient Value Readers =====

/// Read a JSON value as display text. Arrays are joined with ", ",
/// blanks and nulls become `None`.
pub fn loose_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(loose_string)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => return None,
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub fn loose_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "remote" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
