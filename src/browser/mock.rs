//! Mock automation collaborator for testing without a real browser
//!
//! Scripted responses for the narrow session surface the login flow drives.
//! Counters track session acquire/release pairing and which navigation
//! branch was taken.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{BrowserError, LoginAutomation, LoginSession};

/// Which step a mock session should fail at, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    None,
    Acquire,
    Navigate,
    LocateLogin,
    FillUsername,
    FillPassword,
    Submit,
    Settle,
}

/// Mock automation collaborator with scripted behavior.
pub struct MockAutomation {
    /// Page content every session reports, drives classification.
    page_content: String,
    /// Whether the landing page already exposes the credential fields.
    form_on_landing: bool,
    failure: MockFailure,
    /// Sessions handed out so far.
    pub acquired: Arc<AtomicUsize>,
    /// Sessions closed so far; must equal `acquired` after every run.
    pub released: Arc<AtomicUsize>,
    /// Times the explicit login link was followed.
    pub link_clicks: Arc<AtomicUsize>,
}

impl MockAutomation {
    /// Sessions succeed at every step and report `page_content` at Classify.
    pub fn returning(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            form_on_landing: false,
            failure: MockFailure::None,
            acquired: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
            link_clicks: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sessions fail at the given step with a timeout-flavored error.
    pub fn failing_at(failure: MockFailure) -> Self {
        let mut automation = Self::returning("");
        automation.failure = failure;
        automation
    }

    pub fn with_form_on_landing(mut self, on_landing: bool) -> Self {
        self.form_on_landing = on_landing;
        self
    }
}

#[async_trait]
impl LoginAutomation for MockAutomation {
    async fn acquire(&self) -> Result<Box<dyn LoginSession>, BrowserError> {
        if self.failure == MockFailure::Acquire {
            return Err(BrowserError::LaunchFailed("no browser available".into()));
        }
        self.acquired.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(MockSession {
            page_content: self.page_content.clone(),
            form_on_landing: self.form_on_landing,
            failure: self.failure,
            released: self.released.clone(),
            link_clicks: self.link_clicks.clone(),
        }))
    }
}

struct MockSession {
    page_content: String,
    form_on_landing: bool,
    failure: MockFailure,
    released: Arc<AtomicUsize>,
    link_clicks: Arc<AtomicUsize>,
}

impl MockSession {
    fn step(&self, at: MockFailure, what: &str) -> Result<(), BrowserError> {
        if self.failure == at {
            return Err(BrowserError::Timeout(format!("{} timed out", what)));
        }
        Ok(())
    }
}

#[async_trait]
impl LoginSession for MockSession {
    async fn goto(&self, _url: &str) -> Result<(), BrowserError> {
        self.step(MockFailure::Navigate, "navigation")
    }

    async fn has_credential_form(&self) -> Result<bool, BrowserError> {
        Ok(self.form_on_landing)
    }

    async fn click_link(&self, name: &str) -> Result<(), BrowserError> {
        self.step(MockFailure::LocateLogin, name)?;
        self.link_clicks.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn fill(&self, selector: &str, _text: &str) -> Result<(), BrowserError> {
        let at = if selector.contains("password") {
            MockFailure::FillPassword
        } else {
            MockFailure::FillUsername
        };
        self.step(at, selector)
    }

    async fn click_button(&self, name: &str) -> Result<(), BrowserError> {
        self.step(MockFailure::Submit, name)
    }

    async fn wait_network_idle(&self) -> Result<(), BrowserError> {
        self.step(MockFailure::Settle, "network idle")
    }

    async fn content(&self) -> Result<String, BrowserError> {
        Ok(self.page_content.clone())
    }

    async fn close(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }
}
