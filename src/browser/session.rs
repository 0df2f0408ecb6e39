// src/browser/session.rs
//! Narrow browser capability used by the login flows, so they can run
//! against a real Chrome or a scripted fake

use crate::error::BrowserError;
use async_trait::async_trait;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Something on the page to wait for or click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// First element matching a CSS selector
    Css(&'a str),
    /// First `<button>` whose trimmed text equals the given string exactly
    ButtonText(&'a str),
}

/// One page in one browser instance.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait until the DOM is ready (not network idle).
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    async fn current_url(&mut self) -> Option<String>;

    /// Resolve once `target` is present (and rendered, if `visible`).
    async fn wait_for(
        &mut self,
        target: Target<'_>,
        visible: bool,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    async fn exists(&mut self, target: Target<'_>) -> bool;

    async fn click(&mut self, target: Target<'_>) -> Result<(), BrowserError>;

    /// Replace the value of an input with `text`.
    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError>;

    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<(), BrowserError>;

    async fn content(&mut self) -> Result<String, BrowserError>;

    async fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError>;

    /// Release the browser process. Must be safe to call more than once.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Settings for one launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub user_agent: String,
    /// Let images and stylesheets through the request filter.
    pub allow_visual_assets: bool,
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// Run a best-effort step. Failure or timeout is logged and reported as
/// `false`; it never aborts the surrounding flow.
pub async fn try_step<F, T>(label: &str, timeout: Duration, action: F) -> bool
where
    F: Future<Output = Result<T, BrowserError>>,
{
    match tokio::time::timeout(timeout, action).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            warn!("{}: {}. Continuing...", label, e);
            false
        }
        Err(_) => {
            warn!("{}: no result after {:?}. Continuing...", label, timeout);
            false
        }
    }
}
