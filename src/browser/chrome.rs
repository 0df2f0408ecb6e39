// src/browser/chrome.rs
//! Headless Chrome over the DevTools protocol

use super::policy::should_block;
use super::session::{BrowserLauncher, BrowserSession, LaunchOptions, Target};
use crate::environment::BrowserSettings;
use crate::error::BrowserError;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, SetUserAgentOverrideParams};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

const LAUNCH_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-setuid-sandbox",
    "--no-sandbox",
    "--disable-extensions",
    "--disable-features=IsolateOrigins,site-per-process",
];

const POLL_INTERVAL: Duration = Duration::from_millis(100);

const READY_STATE_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
        }
    })
"#;

pub struct ChromeLauncher {
    settings: BrowserSettings,
}

impl ChromeLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn config(&self, profile_dir: &Path) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .window_size(1024, 600)
            .viewport(None::<Viewport>)
            .user_data_dir(profile_dir);

        if !self.settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.settings.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        for arg in LAUNCH_ARGS {
            builder = builder.arg(*arg);
        }

        builder.build().map_err(BrowserError::Launch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError> {
        // Fresh profile per launch: no cookies or storage shared between calls
        let profile_dir = std::env::temp_dir().join(format!("jobtrack-chrome-{}", uuid::Uuid::new_v4()));
        let config = self.config(&profile_dir)?;

        let (mut browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        let handler_task = spawn_handler_task(handler);

        match prepare_page(&browser, options).await {
            Ok((page, intercept_task)) => Ok(Box::new(ChromeSession {
                browser: Some(browser),
                page,
                handler_task,
                intercept_task,
                profile_dir,
            })),
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                remove_profile(&profile_dir).await;
                Err(e)
            }
        }
    }
}

fn spawn_handler_task(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("chromiumoxide handler event error: {}", e);
            }
        }
    })
}

async fn prepare_page(
    browser: &Browser,
    options: &LaunchOptions,
) -> Result<(Page, JoinHandle<()>), BrowserError> {
    let page = browser.new_page("about:blank").await.map_err(protocol)?;

    page.execute(SetUserAgentOverrideParams::new(options.user_agent.clone()))
        .await
        .map_err(protocol)?;

    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(protocol)?;
    let allow_visual_assets = options.allow_visual_assets;
    let intercept_page = page.clone();
    let intercept_task = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let resource_type = format!("{:?}", event.resource_type);
            let outcome = if should_block(&resource_type, &event.request.url, allow_visual_assets) {
                intercept_page
                    .execute(FailRequestParams::new(
                        event.request_id.clone(),
                        ErrorReason::BlockedByClient,
                    ))
                    .await
                    .map(|_| ())
            } else {
                intercept_page
                    .execute(ContinueRequestParams::new(event.request_id.clone()))
                    .await
                    .map(|_| ())
            };
            if let Err(e) = outcome {
                debug!("Request interception reply failed: {}", e);
            }
        }
    });

    if let Err(e) = page.execute(FetchEnableParams::default()).await {
        intercept_task.abort();
        return Err(protocol(e));
    }

    Ok((page, intercept_task))
}

pub struct ChromeSession {
    browser: Option<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    intercept_task: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl ChromeSession {
    async fn probe(&self, target: Target<'_>, visible: bool) -> bool {
        match self.page.evaluate(probe_script(target, visible)).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            // Context destroyed mid-navigation
            Err(_) => false,
        }
    }

    async fn dom_click(&self, target: Target<'_>) -> Result<(), BrowserError> {
        let script = format!(
            "(() => {{ const el = {}; if (!el) return false; el.click(); return true; }})()",
            finder_js(target)
        );
        let clicked = self
            .page
            .evaluate(script)
            .await
            .map_err(protocol)?
            .into_value::<bool>()
            .unwrap_or(false);

        if clicked {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound(describe(target)))
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|reason| BrowserError::Navigation {
                url: url.to_string(),
                reason,
            })?;

        let page = &self.page;
        let navigation = async {
            let response = page.execute(params).await.map_err(|e| navigation_error(url, e))?;
            if let Some(reason) = response.result.error_text.clone() {
                return Err(BrowserError::Navigation {
                    url: url.to_string(),
                    reason,
                });
            }
            page.evaluate(READY_STATE_SCRIPT.to_string())
                .await
                .map_err(|e| navigation_error(url, e))?;
            Ok(())
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
            }),
        }
    }

    async fn current_url(&mut self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }

    async fn wait_for(
        &mut self,
        target: Target<'_>,
        visible: bool,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.probe(target, visible).await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::ElementNotFound(describe(target)));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn exists(&mut self, target: Target<'_>) -> bool {
        self.probe(target, false).await
    }

    async fn click(&mut self, target: Target<'_>) -> Result<(), BrowserError> {
        if let Target::Css(selector) = target {
            let element = self
                .page
                .find_element(selector)
                .await
                .map_err(|_| BrowserError::ElementNotFound(describe(target)))?;
            if element.click().await.is_ok() {
                return Ok(());
            }
            debug!("Mouse click on {} failed, dispatching DOM click", selector);
        }
        self.dom_click(target).await
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element.click().await.map_err(protocol)?;

        let clear = format!(
            "(() => {{ const el = document.querySelector({}); if (el) {{ el.value = ''; }} }})()",
            js_string(selector)
        );
        self.page.evaluate(clear).await.map_err(protocol)?;

        element.type_str(text).await.map_err(protocol)?;
        Ok(())
    }

    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<(), BrowserError> {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(protocol(e)),
            Err(_) => Err(BrowserError::NavigationTimeout {
                url: self.page.url().await.ok().flatten().unwrap_or_default(),
            }),
        }
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        self.page.content().await.map_err(protocol)
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError> {
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await
            .map(|_| ())
            .map_err(protocol)
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        self.intercept_task.abort();
        let closed = browser.close().await.map(|_| ()).map_err(protocol);
        if let Err(e) = browser.wait().await {
            warn!("Failed waiting for browser exit: {}", e);
        }
        self.handler_task.abort();
        remove_profile(&self.profile_dir).await;
        closed
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.intercept_task.abort();
        self.handler_task.abort();
    }
}

async fn remove_profile(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        debug!("Failed to remove browser profile {}: {}", dir.display(), e);
    }
}

fn protocol(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Protocol(e.to_string())
}

fn navigation_error(url: &str, e: CdpError) -> BrowserError {
    match e {
        CdpError::Timeout => BrowserError::NavigationTimeout {
            url: url.to_string(),
        },
        other => BrowserError::Navigation {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn finder_js(target: Target<'_>) -> String {
    match target {
        Target::Css(selector) => format!("document.querySelector({})", js_string(selector)),
        Target::ButtonText(text) => format!(
            "(Array.from(document.querySelectorAll('button')).find(b => (b.textContent || '').trim() === {}) || null)",
            js_string(text)
        ),
    }
}

fn probe_script(target: Target<'_>, visible: bool) -> String {
    format!(
        r#"(() => {{
    const el = {finder};
    if (!el) return false;
    if (!{visible}) return true;
    const style = window.getComputedStyle(el);
    return style.visibility !== 'hidden' && style.display !== 'none' && el.getClientRects().length > 0;
}})()"#,
        finder = finder_js(target),
        visible = visible
    )
}

fn describe(target: Target<'_>) -> String {
    match target {
        Target::Css(selector) => selector.to_string(),
        Target::ButtonText(text) => format!("button \"{}\"", text),
    }
}
