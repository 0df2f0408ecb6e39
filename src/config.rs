// src/config.rs
use std::fmt;

use crate::environment::EnvironmentConfig;

/// Login for one job site.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SiteCredentials {
    pub linkedin: Option<Credentials>,
    pub handshake: Option<Credentials>,
}

/// Everything the extraction pipeline needs, resolved once at start-up and
/// passed down explicitly.
#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    pub environment: EnvironmentConfig,
    pub credentials: SiteCredentials,
    pub ai_api_key: Option<String>,
    pub fast_mode: bool,
}

impl ExtractorConfig {
    /// Read `.env`, `config.yaml` and the process environment.
    pub fn load() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        let environment = EnvironmentConfig::load()?;
        Ok(Self::from_lookup(environment, |key| std::env::var(key).ok()))
    }

    pub fn from_lookup<F>(environment: EnvironmentConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let pair = |email_key: &str, password_key: &str| {
            match (non_empty(email_key), lookup(password_key)) {
                (Some(email), Some(password)) if !password.is_empty() => {
                    Some(Credentials { email, password })
                }
                _ => None,
            }
        };

        Self {
            credentials: SiteCredentials {
                linkedin: pair("LINKEDIN_EMAIL", "LINKEDIN_PASSWORD"),
                handshake: pair("HANDSHAKE_EMAIL", "HANDSHAKE_PASSWORD"),
            },
            ai_api_key: non_empty("OPENROUTER_API_KEY"),
            fast_mode: non_empty("FAST_MODE").as_deref() == Some("true"),
            environment,
        }
    }
}
