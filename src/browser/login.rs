//! Login flow
//!
//! Drives one automation session per account through a linear state machine:
//! navigate, locate the credential form, fill, submit, settle, classify.
//! Nothing escapes [`LoginDriver::login`]: every failure becomes a failed
//! outcome so the batch can continue with the next account.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use super::{BrowserError, LoginAutomation, LoginSession};
use crate::accounts::Credential;
use crate::pacing;

/// Content literal that marks a signed-in page. Together with the username
/// check this is a heuristic against live markup, not a server-side status.
const SUCCESS_MARKER: &str = "exclusive owner";

/// Selector chains for the credential fields; name match first, type second.
const USERNAME_SELECTOR: &str = r#"input[name="username"], input[type="text"]"#;
const PASSWORD_SELECTOR: &str = r#"input[name="password"], input[type="password"]"#;

/// Accessible names of the login entry link and the submit button.
const LOGIN_LINK: &str = "Login";
const SUBMIT_BUTTON: &str = "Validate";

/// Fixed grace after network quiescence, for client-side redirects.
const SETTLE_GRACE: Duration = Duration::from_secs(5);

/// Per-account result record, immutable once returned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub user: String,
    pub success: bool,
    pub message: String,
}

/// Drives the login state machine, one session per account.
pub struct LoginDriver {
    automation: Box<dyn LoginAutomation>,
    target_url: String,
}

impl LoginDriver {
    pub fn new(automation: Box<dyn LoginAutomation>, target_url: impl Into<String>) -> Self {
        Self {
            automation,
            target_url: target_url.into(),
        }
    }

    /// Log one account in.
    pub async fn login(&self, credential: &Credential) -> LoginOutcome {
        let user = credential.user.clone();
        info!("Starting login for {}", user);

        let session = match self.automation.acquire().await {
            Ok(session) => session,
            Err(e) => {
                warn!("{} - browser session failed: {}", user, e);
                return LoginOutcome {
                    message: format!("❌ {} login error: {}", user, e),
                    user,
                    success: false,
                };
            }
        };

        let result = self.attempt(session.as_ref(), credential).await;

        // Teardown runs on every path out of the attempt.
        session.close().await;

        match result {
            Ok(true) => {
                info!("{} - login succeeded", user);
                LoginOutcome {
                    message: format!("✅ {} login succeeded", user),
                    user,
                    success: true,
                }
            }
            Ok(false) => {
                warn!("{} - login failed, page shows no success marker", user);
                LoginOutcome {
                    message: format!("❌ {} login failed", user),
                    user,
                    success: false,
                }
            }
            Err(e) => {
                warn!("{} - login error: {}", user, e);
                LoginOutcome {
                    message: format!("❌ {} login error: {}", user, e),
                    user,
                    success: false,
                }
            }
        }
    }

    /// The linear state machine between Navigate and Classify.
    async fn attempt(
        &self,
        page: &dyn LoginSession,
        credential: &Credential,
    ) -> Result<bool, BrowserError> {
        let user = &credential.user;

        info!("{} - opening {}", user, self.target_url);
        page.goto(&self.target_url).await?;
        let waited = pacing::pause(pacing::PAGE_OBSERVE).await;
        info!("{} - observed landing page for {:.1}s", user, waited.as_secs_f64());

        // The landing page normally links to a separate credential page; the
        // explicit navigation is skipped when the fields are already present.
        if page.has_credential_form().await? {
            info!("{} - credential form already present", user);
        } else {
            info!("{} - following the {:?} link", user, LOGIN_LINK);
            page.click_link(LOGIN_LINK).await?;
        }
        let waited = pacing::pause(pacing::FORM_SETTLE).await;
        info!("{} - settled on the form for {:.1}s", user, waited.as_secs_f64());

        info!("{} - filling username", user);
        page.fill(USERNAME_SELECTOR, &credential.user).await?;
        pacing::pause(pacing::FIELD_ENTRY).await;

        info!("{} - filling password", user);
        page.fill(PASSWORD_SELECTOR, &credential.pass).await?;
        pacing::pause(pacing::FIELD_ENTRY).await;

        info!("{} - submitting", user);
        page.click_button(SUBMIT_BUTTON).await?;

        info!("{} - waiting for the page to settle", user);
        page.wait_network_idle().await?;
        tokio::time::sleep(SETTLE_GRACE).await;

        let content = page.content().await?;
        Ok(content.contains(SUCCESS_MARKER) || content.contains(user.as_str()))
    }
}
