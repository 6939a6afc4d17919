//! Browser session management
//!
//! Launches and controls one isolated Chromium instance per account. Each
//! session gets a fresh user-data directory, so no cookies or storage leak
//! between accounts.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::BrowserError;

/// Counter for sequential session naming (session-1, session-2, ...)
static SESSION_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Configuration for a browser session
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Upper bound for any single automation action, in seconds
    pub action_timeout_secs: u64,
    /// Ceiling for resolving a named control, distinct from the page-level
    /// timeout, in seconds
    pub locate_timeout_secs: u64,
    /// Quiet period with no new network activity that counts as idle, in
    /// milliseconds
    pub idle_window_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            action_timeout_secs: 45,
            locate_timeout_secs: 10,
            idle_window_ms: 500,
        }
    }
}

/// Factory for isolated automation sessions, one per account.
#[async_trait]
pub trait LoginAutomation: Send + Sync {
    /// Acquire a fresh isolated session, equivalent to a private profile.
    async fn acquire(&self) -> Result<Box<dyn LoginSession>, BrowserError>;
}

/// The narrow per-session surface the login flow drives.
#[async_trait]
pub trait LoginSession: Send + Sync {
    /// Load `url` and wait until the document structure is parsed (not full
    /// resource load).
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Whether the current page already exposes both credential fields.
    async fn has_credential_form(&self) -> Result<bool, BrowserError>;

    /// Click the link with the given accessible name, bounded by the locate
    /// timeout.
    async fn click_link(&self, name: &str) -> Result<(), BrowserError>;

    /// Fill the first element matching `selector` with `text`.
    async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError>;

    /// Click the button with the given accessible name.
    async fn click_button(&self, name: &str) -> Result<(), BrowserError>;

    /// Wait until no new network activity has been observed for a full idle
    /// window.
    async fn wait_network_idle(&self) -> Result<(), BrowserError>;

    /// Full rendered content of the current page.
    async fn content(&self) -> Result<String, BrowserError>;

    /// Close the page and the browser behind it. Must be safe to call on
    /// every exit path.
    async fn close(&self);
}

/// Launches real Chromium sessions over CDP.
pub struct ChromiumAutomation {
    config: SessionConfig,
}

impl ChromiumAutomation {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LoginAutomation for ChromiumAutomation {
    async fn acquire(&self) -> Result<Box<dyn LoginSession>, BrowserError> {
        let session = ChromiumSession::launch(self.config.clone()).await?;
        Ok(Box::new(session))
    }
}

/// One Chromium instance plus the single page the login flow drives.
pub struct ChromiumSession {
    /// Display name, e.g. "session-1"
    id: String,
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
    config: SessionConfig,
}

impl ChromiumSession {
    /// Launch a fresh Chromium instance with an isolated profile.
    pub async fn launch(config: SessionConfig) -> Result<Self, BrowserError> {
        let session_id = format!("session-{}", SESSION_COUNTER.fetch_add(1, Ordering::Relaxed));

        info!(
            "Launching browser {} (headless: {})",
            session_id, config.headless
        );

        // Fresh user-data directory per session keeps cookies and storage
        // isolated between accounts.
        let user_data_dir = std::env::temp_dir()
            .join("netlib-keeper")
            .join(format!("{}-{}", std::process::id(), session_id));
        std::fs::create_dir_all(&user_data_dir)
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            // Required when running as root (e.g. in CI containers)
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu");

        builder = if config.headless {
            builder.headless_mode(HeadlessMode::New)
        } else {
            builder.with_head()
        };

        let browser_config = builder.build().map_err(BrowserError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // Drive the CDP event stream until the browser disconnects.
        let handler_id = session_id.clone();
        let handler_task = tokio::spawn(async move {
            while handler.next().await.is_some() {}
            debug!("Browser {} event stream ended", handler_id);
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        Ok(Self {
            id: session_id,
            browser: Mutex::new(Some(browser)),
            page,
            handler_task,
            config,
        })
    }

    fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.config.action_timeout_secs)
    }

    /// Poll until the document structure has been parsed. `goto` resolves on
    /// the navigation response, which can be earlier.
    async fn wait_for_document(&self) -> Result<(), BrowserError> {
        loop {
            let state = self
                .page
                .evaluate("document.readyState")
                .await
                .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?
                .into_value::<String>()
                .unwrap_or_default();
            if state == "interactive" || state == "complete" {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
    }

    /// Resolve a control by accessible name among `selector` matches and
    /// click it, polling until `ceiling` expires.
    async fn click_named(
        &self,
        selector: &str,
        name: &str,
        ceiling: Duration,
    ) -> Result<(), BrowserError> {
        let script = format!(
            r#"(function() {{
                const wanted = {name:?}.trim().toLowerCase();
                for (const el of document.querySelectorAll({selector:?})) {{
                    const label =
                        (el.innerText || el.value || el.getAttribute('aria-label') || '')
                            .trim().toLowerCase();
                    if (label === wanted) {{ el.click(); return true; }}
                }}
                return false;
            }})()"#
        );

        let deadline = tokio::time::Instant::now() + ceiling;
        loop {
            let clicked = self
                .page
                .evaluate(script.as_str())
                .await
                .map_err(|e| BrowserError::JavaScriptError(format!("{}: {}", name, e)))?
                .into_value::<bool>()
                .unwrap_or(false);

            if clicked {
                debug!("{} clicked control {:?}", self.id, name);
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "control {:?} did not appear within {}s",
                    name,
                    ceiling.as_secs()
                )));
            }
            sleep(Duration::from_millis(250)).await;
        }
    }
}

#[async_trait]
impl LoginSession for ChromiumSession {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        debug!("{} navigating to {}", self.id, url);
        timeout(self.action_timeout(), self.page.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout(format!("navigation to {} timed out", url)))?
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;

        timeout(self.action_timeout(), self.wait_for_document())
            .await
            .map_err(|_| BrowserError::Timeout("document never finished parsing".into()))?
    }

    async fn has_credential_form(&self) -> Result<bool, BrowserError> {
        let script = r#"
            !!document.querySelector('input[name="username"], input[type="text"]') &&
            !!document.querySelector('input[name="password"], input[type="password"]')
        "#;
        let present = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?
            .into_value::<bool>()
            .unwrap_or(false);
        Ok(present)
    }

    async fn click_link(&self, name: &str) -> Result<(), BrowserError> {
        self.click_named("a", name, Duration::from_secs(self.config.locate_timeout_secs))
            .await
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element = timeout(self.action_timeout(), self.page.find_element(selector))
            .await
            .map_err(|_| BrowserError::Timeout(format!("element {} did not resolve", selector)))?
            .map_err(|e| BrowserError::ElementNotFound(format!("{}: {}", selector, e)))?;

        // Focus the field before typing; a failed focus click is not fatal.
        element.click().await.ok();
        element
            .type_str(text)
            .await
            .map_err(|e| BrowserError::InputFailed(e.to_string()))?;
        Ok(())
    }

    async fn click_button(&self, name: &str) -> Result<(), BrowserError> {
        self.click_named(
            "button, input[type='submit'], input[type='button']",
            name,
            self.action_timeout(),
        )
        .await
    }

    async fn wait_network_idle(&self) -> Result<(), BrowserError> {
        let idle_window = Duration::from_millis(self.config.idle_window_ms);
        timeout(self.action_timeout(), async {
            // Quiescent once the page's resource-entry count stops moving for
            // a full idle window. Evaluation errors during an in-flight
            // navigation reset the window instead of failing the wait.
            let mut last_count: i64 = -1;
            let mut stable_since = tokio::time::Instant::now();
            loop {
                let count = match self
                    .page
                    .evaluate("performance.getEntriesByType('resource').length")
                    .await
                {
                    Ok(result) => result.into_value::<i64>().unwrap_or(0),
                    Err(_) => {
                        stable_since = tokio::time::Instant::now();
                        sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                };

                if count != last_count {
                    last_count = count;
                    stable_since = tokio::time::Instant::now();
                } else if stable_since.elapsed() >= idle_window {
                    return;
                }
                sleep(Duration::from_millis(100)).await;
            }
        })
        .await
        .map_err(|_| BrowserError::Timeout("network never settled".into()))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        timeout(self.action_timeout(), self.page.content())
            .await
            .map_err(|_| BrowserError::Timeout("reading page content timed out".into()))?
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))
    }

    async fn close(&self) {
        if let Err(e) = self.page.clone().close().await {
            debug!("{} page close: {}", self.id, e);
        }

        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                warn!("{} browser close: {}", self.id, e);
            }
            let _ = browser.wait().await;
        }

        self.handler_task.abort();
        info!("Browser {} closed", self.id);
    }
}
