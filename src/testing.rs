// src/testing.rs
//! Test doubles shared by the unit tests

use crate::browser::session::{BrowserLauncher, BrowserSession, LaunchOptions, Target};
use crate::error::{BrowserError, ExtractError};
use crate::extraction::{PageSource, Provenance, RawPage, RecordExtractor};
use crate::types::JobRecord;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Pipeline stages =====

pub struct MockPageSource {
    html: Option<String>,
    provenance: Provenance,
    requested: Mutex<Vec<String>>,
}

impl MockPageSource {
    pub fn returning(html: Option<&str>, provenance: Provenance) -> Self {
        Self {
            html: html.map(str::to_string),
            provenance,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn fetch_page(&self, url: &str) -> Option<RawPage> {
        self.requested.lock().unwrap().push(url.to_string());
        self.html
            .clone()
            .map(|html| RawPage::new(html, self.provenance))
    }
}

pub struct MockExtractor {
    record: Option<JobRecord>,
    texts: Mutex<Vec<String>>,
}

impl MockExtractor {
    pub fn returning(record: JobRecord) -> Self {
        Self {
            record: Some(record),
            texts: Mutex::new(Vec::new()),
        }
    }

    /// Behaves like a client with no API key.
    pub fn unconfigured() -> Self {
        Self {
            record: None,
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.texts.lock().unwrap().len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordExtractor for MockExtractor {
    async fn extract_record(&self, text: &str) -> Result<JobRecord, ExtractError> {
        self.texts.lock().unwrap().push(text.to_string());
        self.record
            .clone()
            .ok_or_else(|| ExtractError::Configuration("Missing OpenRouter API key".to_string()))
    }
}

// ===== Browser =====

/// Static description of what a page contains.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    url: String,
    elements: HashSet<String>,
    hidden: HashSet<String>,
    buttons: Vec<String>,
    html: String,
}

impl FakePage {
    /// A page that stays at `url` whatever is navigated to.
    pub fn at(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    /// A page that takes the URL of the first navigation.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &str) -> Self {
        self.elements.insert(selector.to_string());
        self
    }

    /// Present in the DOM but not rendered.
    pub fn with_hidden(mut self, selector: &str) -> Self {
        self.hidden.insert(selector.to_string());
        self
    }

    pub fn with_button(mut self, text: &str) -> Self {
        self.buttons.push(text.to_string());
        self
    }

    pub fn with_html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    fn has(&self, target: Target<'_>, visible: bool) -> bool {
        match target {
            Target::Css(selector) => {
                self.elements.contains(selector) || (!visible && self.hidden.contains(selector))
            }
            Target::ButtonText(text) => self.buttons.iter().any(|b| b == text),
        }
    }
}

/// Everything sessions did, shared with the test after the session moves.
#[derive(Debug, Default)]
pub struct FakeLog {
    pub navigations: Vec<String>,
    pub typed: Vec<(String, String)>,
    pub clicked: Vec<String>,
    pub screenshots: Vec<PathBuf>,
    pub launches: Vec<LaunchOptions>,
    pub closed: usize,
    pub open: usize,
    pub peak_open: usize,
}

/// Scripted session. A successful click moves to the next queued page.
pub struct FakeSession {
    page: FakePage,
    next_pages: VecDeque<FakePage>,
    log: Arc<Mutex<FakeLog>>,
    navigation_timeouts: usize,
    navigation_error: bool,
    content_error: bool,
    content_delay: Duration,
    closed: bool,
}

impl FakeSession {
    pub fn new(page: FakePage) -> Self {
        Self {
            page,
            next_pages: VecDeque::new(),
            log: Arc::new(Mutex::new(FakeLog::default())),
            navigation_timeouts: 0,
            navigation_error: false,
            content_error: false,
            content_delay: Duration::ZERO,
            closed: false,
        }
    }

    pub fn then(mut self, page: FakePage) -> Self {
        self.next_pages.push_back(page);
        self
    }

    /// Time out the next `n` navigations.
    pub fn timing_out_navigations(mut self, n: usize) -> Self {
        self.navigation_timeouts = n;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.navigation_error = true;
        self
    }

    pub fn failing_content(mut self) -> Self {
        self.content_error = true;
        self
    }

    pub fn slow_content(mut self, delay: Duration) -> Self {
        self.content_delay = delay;
        self
    }

    pub fn sharing_log(mut self, log: Arc<Mutex<FakeLog>>) -> Self {
        self.log = log;
        self
    }

    pub fn log(&self) -> Arc<Mutex<FakeLog>> {
        self.log.clone()
    }

    fn advance(&mut self) {
        if let Some(next) = self.next_pages.pop_front() {
            self.page = next;
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        self.log.lock().unwrap().navigations.push(url.to_string());
        if self.navigation_timeouts > 0 {
            self.navigation_timeouts -= 1;
            return Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
            });
        }
        if self.navigation_error {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        if self.page.url.is_empty() {
            self.page.url = url.to_string();
        }
        Ok(())
    }

    async fn current_url(&mut self) -> Option<String> {
        Some(self.page.url.clone())
    }

    async fn wait_for(
        &mut self,
        target: Target<'_>,
        visible: bool,
        _timeout: Duration,
    ) -> Result<(), BrowserError> {
        if self.page.has(target, visible) {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound(format!("{:?}", target)))
        }
    }

    async fn exists(&mut self, target: Target<'_>) -> bool {
        self.page.has(target, false)
    }

    async fn click(&mut self, target: Target<'_>) -> Result<(), BrowserError> {
        if !self.page.has(target, false) {
            return Err(BrowserError::ElementNotFound(format!("{:?}", target)));
        }
        let label = match target {
            Target::Css(selector) => selector.to_string(),
            Target::ButtonText(text) => format!("button:{}", text),
        };
        self.log.lock().unwrap().clicked.push(label);
        self.advance();
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        if !self.page.has(Target::Css(selector), false) {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.log
            .lock()
            .unwrap()
            .typed
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn wait_for_navigation(&mut self, _timeout: Duration) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        if !self.content_delay.is_zero() {
            tokio::time::sleep(self.content_delay).await;
        }
        if self.content_error {
            return Err(BrowserError::Protocol("target closed".to_string()));
        }
        Ok(self.page.html.clone())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError> {
        self.log.lock().unwrap().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if !self.closed {
            self.closed = true;
            let mut log = self.log.lock().unwrap();
            log.closed += 1;
            log.open = log.open.saturating_sub(1);
        }
        Ok(())
    }
}

type SessionFactory = Box<dyn Fn() -> FakeSession + Send + Sync>;

/// Hands out fresh fake sessions that all write to one shared log.
pub struct FakeLauncher {
    factory: Option<SessionFactory>,
    log: Arc<Mutex<FakeLog>>,
}

impl FakeLauncher {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> FakeSession + Send + Sync + 'static,
    {
        Self {
            factory: Some(Box::new(factory)),
            log: Arc::new(Mutex::new(FakeLog::default())),
        }
    }

    /// Every launch fails.
    pub fn broken() -> Self {
        Self {
            factory: None,
            log: Arc::new(Mutex::new(FakeLog::default())),
        }
    }

    pub fn log(&self) -> Arc<Mutex<FakeLog>> {
        self.log.clone()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let factory = self
            .factory
            .as_ref()
            .ok_or_else(|| BrowserError::Launch("no chrome binary".to_string()))?;

        {
            let mut log = self.log.lock().unwrap();
            log.launches.push(options.clone());
            log.open += 1;
            log.peak_open = log.peak_open.max(log.open);
        }

        Ok(Box::new(factory().sharing_log(self.log.clone())))
    }
}
