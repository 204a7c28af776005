//! Headless Chrome over the DevTools protocol.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

use super::browser::{BrowserDriver, BrowserSession, PageElement};
use super::error::{ScrapeError, ScrapeResult};

const SCROLL_AND_CLICK: &str = "function() { this.scrollIntoView({block: 'center'}); this.click(); }";
const IS_DISPLAYED: &str = "function() { const s = window.getComputedStyle(this); \
     return this.offsetParent !== null && s.visibility !== 'hidden' && s.display !== 'none'; }";

/// Launch settings for Chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromiumOptions {
    pub headless: bool,
    /// Explicit Chrome binary; auto-detected when unset.
    pub executable: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: Option<String>,
    pub navigation_timeout: Duration,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            window_width: 1920,
            window_height: 1080,
            user_agent: None,
            navigation_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChromiumDriver {
    options: ChromiumOptions,
}

impl ChromiumDriver {
    pub fn new(options: ChromiumOptions) -> Self {
        Self { options }
    }

    fn browser_config(&self) -> ScrapeResult<BrowserConfig> {
        let opts = &self.options;
        let mut builder = BrowserConfig::builder()
            .window_size(opts.window_width, opts.window_height)
            .request_timeout(opts.navigation_timeout)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage");
        if !opts.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &opts.executable {
            builder = builder.chrome_executable(path);
        }
        if let Some(agent) = &opts.user_agent {
            builder = builder.arg(format!("--user-agent={agent}"));
        }
        builder.build().map_err(ScrapeError::browser)
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn launch(&self) -> ScrapeResult<Box<dyn BrowserSession>> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::browser_with("Failed to launch Chrome", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler stopped");
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(ScrapeError::browser_with("Failed to open browser tab", e));
            }
        };
        tracing::debug!(headless = self.options.headless, "Chrome launched");

        Ok(Box::new(ChromiumSession {
            browser: Mutex::new(Some(browser)),
            page,
            handler: handler_task,
            navigation_timeout: self.options.navigation_timeout,
        }))
    }
}

pub struct ChromiumSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl ChromiumSession {
    async fn goto(&self, url: &str) -> ScrapeResult<()> {
        let navigation = self.page.goto(url);
        match tokio::time::timeout(self.navigation_timeout, navigation).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ScrapeError::browser_with(format!("Failed to open {url}"), e)),
            Err(_) => Err(ScrapeError::browser(format!(
                "Navigation to {url} timed out after {}s",
                self.navigation_timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn open(&self, url: &str) -> ScrapeResult<()> {
        tracing::debug!(url, "Opening page");
        self.goto(url).await
    }

    async fn find_all(&self, css: &str) -> ScrapeResult<Vec<Box<dyn PageElement>>> {
        let elements = self
            .page
            .find_elements(css)
            .await
            .map_err(|e| ScrapeError::browser_with(format!("Lookup of '{css}' failed"), e))?;
        Ok(wrap(elements))
    }

    /// Chrome keeps cross-origin frames in a separate target, so the frame
    /// document is loaded into the page itself.
    async fn switch_into(&self, frame: &dyn PageElement) -> ScrapeResult<()> {
        let src = frame
            .attribute("src")
            .await?
            .filter(|src| !src.trim().is_empty())
            .ok_or_else(|| ScrapeError::browser("Listing frame has no src"))?;
        let base = self.current_url().await?;
        let target = Url::parse(&base)
            .and_then(|base| base.join(src.trim()))
            .or_else(|_| Url::parse(src.trim()))
            .map_err(|e| ScrapeError::browser_with(format!("Invalid frame src '{src}'"), e))?;
        tracing::debug!(frame = %target, "Entering listing frame");
        self.goto(target.as_str()).await
    }

    async fn current_url(&self) -> ScrapeResult<String> {
        self.page
            .url()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| ScrapeError::browser_with("Failed to read page url", e))
    }

    async fn close(&self) -> ScrapeResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        let result = browser.close().await;
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "Chrome process did not exit cleanly");
        }
        self.handler.abort();
        result
            .map(|_| ())
            .map_err(|e| ScrapeError::browser_with("Failed to close Chrome", e))
    }
}

fn wrap(elements: Vec<Element>) -> Vec<Box<dyn PageElement>> {
    elements
        .into_iter()
        .map(|element| Box::new(ChromiumElement(element)) as Box<dyn PageElement>)
        .collect()
}

struct ChromiumElement(Element);

#[async_trait]
impl PageElement for ChromiumElement {
    async fn text(&self) -> ScrapeResult<String> {
        self.0
            .inner_text()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| ScrapeError::browser_with("Failed to read element text", e))
    }

    async fn attribute(&self, name: &str) -> ScrapeResult<Option<String>> {
        self.0
            .attribute(name)
            .await
            .map_err(|e| ScrapeError::browser_with(format!("Failed to read attribute '{name}'"), e))
    }

    async fn find(&self, css: &str) -> ScrapeResult<Option<Box<dyn PageElement>>> {
        Ok(self.find_all(css).await?.into_iter().next())
    }

    async fn find_all(&self, css: &str) -> ScrapeResult<Vec<Box<dyn PageElement>>> {
        let elements = self
            .0
            .find_elements(css)
            .await
            .map_err(|e| ScrapeError::browser_with(format!("Lookup of '{css}' failed"), e))?;
        Ok(wrap(elements))
    }

    async fn is_displayed(&self) -> ScrapeResult<bool> {
        let returns = self
            .0
            .call_js_fn(IS_DISPLAYED, false)
            .await
            .map_err(|e| ScrapeError::browser_with("Visibility check failed", e))?;
        Ok(returns
            .result
            .value
            .and_then(|value| value.as_bool())
            .unwrap_or(false))
    }

    async fn click(&self) -> ScrapeResult<()> {
        self.0
            .call_js_fn(SCROLL_AND_CLICK, false)
            .await
            .map(|_| ())
            .map_err(|e| ScrapeError::browser_with("Click failed", e))
    }
}
