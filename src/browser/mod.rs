// src/browser/mod.rs
//! Rendered retrieval through a headless browser, including site logins

pub mod chrome;
pub mod handshake;
pub mod linkedin;
pub mod policy;
pub mod session;

pub use chrome::ChromeLauncher;
pub use session::{BrowserLauncher, BrowserSession, LaunchOptions, Target};

use crate::config::SiteCredentials;
use crate::environment::BrowserSettings;
use crate::error::BrowserError;
use crate::extraction::job_fetcher::USER_AGENT;
use crate::extraction::url_rewrite::is_handshake;
use crate::extraction::{PageSource, Provenance, RawPage};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Post-login content waits. Fast mode trades robustness for latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTimings {
    pub content_selector: Duration,
    pub content_body: Duration,
    pub content_settle: Duration,
}

impl FlowTimings {
    pub fn for_mode(fast: bool) -> Self {
        if fast {
            Self {
                content_selector: Duration::from_millis(500),
                content_body: Duration::from_millis(800),
                content_settle: Duration::from_millis(80),
            }
        } else {
            Self {
                content_selector: Duration::from_millis(900),
                content_body: Duration::from_millis(1500),
                content_settle: Duration::from_millis(180),
            }
        }
    }
}

/// Fetches pages through a fresh browser per call. At most
/// `max_concurrent` browsers run at once.
pub struct BrowserAutomator {
    launcher: Arc<dyn BrowserLauncher>,
    credentials: SiteCredentials,
    settings: BrowserSettings,
    timings: FlowTimings,
    permits: Semaphore,
}

impl BrowserAutomator {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        credentials: SiteCredentials,
        settings: BrowserSettings,
        fast_mode: bool,
    ) -> Self {
        let permits = Semaphore::new(settings.max_concurrent.max(1));
        Self {
            launcher,
            credentials,
            settings,
            timings: FlowTimings::for_mode(fast_mode),
            permits,
        }
    }

    pub async fn fetch_rendered(&self, url: &str) -> Option<RawPage> {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                error!("Browser pool unavailable: {}", e);
                return None;
            }
        };

        let options = LaunchOptions {
            user_agent: USER_AGENT.to_string(),
            allow_visual_assets: is_handshake(url),
        };

        info!("Launching browser for {}", url);
        let mut session = match self.launcher.launch(&options).await {
            Ok(session) => session,
            Err(e) => {
                error!("Browser fetch failed for {}: {}", url, e);
                return None;
            }
        };

        let html = match self.drive(session.as_mut(), url).await {
            Ok(html) => Some(html),
            Err(e) => {
                error!("Browser fetch failed for {}: {}", url, e);
                self.capture_diagnostic(session.as_mut()).await;
                None
            }
        };

        if let Err(e) = session.close().await {
            warn!("Failed to close browser: {}", e);
        }

        html.map(|html| RawPage::new(html, Provenance::Browser))
    }

    async fn drive(&self, session: &mut dyn BrowserSession, url: &str) -> Result<String, BrowserError> {
        let timeout = Duration::from_secs(self.settings.navigation_timeout_secs);

        match session.navigate(url, timeout).await {
            Err(BrowserError::NavigationTimeout { .. }) => {
                warn!("Initial navigation timed out; retrying with same options");
                session.navigate(url, timeout).await?;
            }
            other => other?,
        }

        linkedin::run(session, url, self.credentials.linkedin.as_ref()).await;

        if is_handshake(url) {
            handshake::run(session, url, self.credentials.handshake.as_ref(), &self.timings).await;
        }

        session.content().await
    }

    async fn capture_diagnostic(&self, session: &mut dyn BrowserSession) {
        let path = self.settings.screenshot_dir.join(format!(
            "extract_error_{}.png",
            chrono::Utc::now().timestamp_millis()
        ));

        match session.screenshot(&path).await {
            Ok(()) => info!("Saved error screenshot to {}", path.display()),
            Err(e) => warn!("Failed to capture error screenshot: {}", e),
        }
    }
}

#[async_trait]
impl PageSource for BrowserAutomator {
    async fn fetch_page(&self, url: &str) -> Option<RawPage> {
        self.fetch_rendered(url).await
    }
}
