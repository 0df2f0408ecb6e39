// src/extraction/json_ld.rs
//! JSON-LD `JobPosting` markup mapped onto the canonical record

use super::content::strip_html_fragment;
use crate::types::job_record::{loose_string, JobRecord};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

const REMOTE_LOCATION_TYPES: &[&str] = &["TELECOMMUTE", "REMOTE", "Hybrid"];

// Precedence order for picking a location out of a PostalAddress
const ADDRESS_FIELDS: &[&str] = &[
    "addressLocality",
    "addressRegion",
    "addressCountry",
    "streetAddress",
    "postalCode",
];

/// Find the first `JobPosting` in the page's structured-data blocks and map
/// it to a record. Malformed blocks are skipped.
pub fn extract_job_posting(html: &str) -> Option<JobRecord> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;

    for element in document.select(&selector) {
        let raw = element.text().collect::<String>();
        let parsed = match serde_json::from_str::<Value>(raw.trim()) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Skipping malformed JSON-LD block: {}", e);
                continue;
            }
        };

        if let Some(posting) = find_job_posting(&parsed) {
            return Some(map_job_posting(posting));
        }
    }

    None
}

fn find_job_posting(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_job_posting),
        Value::Object(obj) => {
            if is_job_posting(value) {
                Some(value)
            } else {
                obj.get("@graph").and_then(find_job_posting)
            }
        }
        _ => None,
    }
}

fn is_job_posting(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(kind)) => kind == "JobPosting",
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some("JobPosting")),
        _ => false,
    }
}

fn map_job_posting(posting: &Value) -> JobRecord {
    let field = |key: &str| posting.get(key).and_then(loose_string);
    let organization = posting.get("hiringOrganization");
    let location_type = posting.get("jobLocationType").and_then(Value::as_str);

    JobRecord {
        title: field("title"),
        company: organization
            .and_then(|org| org.get("name"))
            .and_then(loose_string),
        location: location_from(posting).or_else(|| location_type.map(str::to_string)),
        description: posting
            .get("description")
            .and_then(Value::as_str)
            .map(strip_html_fragment)
            .filter(|text| !text.is_empty()),
        requirements: field("skills").or_else(|| field("qualifications")),
        salary: salary_from(posting),
        duration: field("employmentType"),
        remote: Some(location_type.is_some_and(|t| REMOTE_LOCATION_TYPES.contains(&t))),
        application_deadline: field("validThrough"),
        job_type: field("employmentType"),
        posted_date: field("datePosted"),
        benefits: field("jobBenefits"),
        contact: organization
            .and_then(|org| org.get("sameAs"))
            .and_then(loose_string),
    }
}

fn location_from(posting: &Value) -> Option<String> {
    let location = match posting.get("jobLocation")? {
        Value::Array(places) => places.first()?,
        place => place,
    };

    match location.get("address")? {
        Value::String(address) => Some(address.trim().to_string()).filter(|a| !a.is_empty()),
        address => ADDRESS_FIELDS
            .iter()
            .find_map(|key| address.get(*key).and_then(loose_string)),
    }
}

fn salary_from(posting: &Value) -> Option<String> {
    let base = posting.get("baseSalary")?;

    if let Some(value) = base.get("value") {
        let amount = value.get("value").and_then(loose_string);
        let unit = value.get("unitText").and_then(loose_string);
        if let (Some(amount), Some(unit)) = (amount, unit) {
            return Some(format!("{} {}", amount, unit));
        }
        if let Some(currency) = value.get("currency").and_then(loose_string) {
            return Some(currency);
        }
        if !value.is_object() {
            if let Some(scalar) = loose_string(value) {
                return Some(scalar);
            }
        }
    }

    base.get("currency").and_then(loose_string)
}
