//! Telegram summary notification
//!
//! Sends the aggregate run summary as a single message. Delivery is
//! best-effort: a failure is logged and swallowed so it can never mask the
//! login results already computed.

use std::time::Duration;

use chrono::{FixedOffset, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::runner::RunSummary;

/// Telegram Bot API host.
const API_BASE: &str = "https://api.telegram.org";

/// Delivery ceiling; there is no retry.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// The operator reads the report in UTC+8.
const REPORT_OFFSET_SECS: i32 = 8 * 3600;

/// Notification delivery errors. Logged, never propagated.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Telegram API returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Best-effort Telegram reporter. Inactive when the destination is not
/// configured.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    /// Bot token and chat id; both required for delivery.
    destination: Option<(String, String)>,
}

impl TelegramNotifier {
    pub fn new(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: API_BASE.to_string(),
            destination: bot_token.zip(chat_id),
        }
    }

    /// Point the notifier at a different API host.
    #[cfg(test)]
    fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Render the summary message: one timestamped header line plus one line
    /// per outcome, in batch order. The timestamp is taken at send time.
    pub fn format_summary(summary: &RunSummary) -> String {
        let offset = FixedOffset::east_opt(REPORT_OFFSET_SECS).expect("static UTC+8 offset");
        let timestamp = Utc::now().with_timezone(&offset).format("%Y-%m-%d %H:%M:%S");

        let mut lines = Vec::with_capacity(summary.outcomes.len() + 1);
        lines.push(format!(
            "📊 Login summary {} HKT: {}/{} accounts succeeded",
            timestamp, summary.success_count, summary.total_count
        ));
        for outcome in &summary.outcomes {
            lines.push(outcome.message.clone());
        }
        lines.join("\n")
    }

    /// Send the formatted summary. Failures are logged, never propagated.
    pub async fn report(&self, summary: &RunSummary) {
        let Some((token, chat_id)) = &self.destination else {
            info!("Telegram destination not configured, skipping notification");
            return;
        };

        let text = Self::format_summary(summary);
        match self.send(token, chat_id, &text).await {
            Ok(()) => info!("Telegram notification sent"),
            Err(e) => warn!("Telegram notification failed: {}", e),
        }
    }

    async fn send(&self, token: &str, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, token);
        let response = self
            .client
            .post(&url)
            .timeout(SEND_TIMEOUT)
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::LoginOutcome;

    fn summary(flags: &[bool]) -> RunSummary {
        let outcomes: Vec<LoginOutcome> = flags
            .iter()
            .enumerate()
            .map(|(i, &success)| LoginOutcome {
                user: format!("u{}", i + 1),
                success,
                message: if success {
                    format!("✅ u{} login succeeded", i + 1)
                } else {
                    format!("❌ u{} login failed", i + 1)
                },
            })
            .collect();
        RunSummary {
            success_count: flags.iter().filter(|&&s| s).count(),
            total_count: flags.len(),
            outcomes,
        }
    }

    #[test]
    fn test_message_has_one_line_per_outcome_plus_header() {
        let message = TelegramNotifier::format_summary(&summary(&[true, false, true]));
        assert_eq!(message.lines().count(), 4);
    }

    #[test]
    fn test_header_counts_and_outcome_order() {
        let message = TelegramNotifier::format_summary(&summary(&[true, false]));
        let lines: Vec<&str> = message.lines().collect();
        assert!(lines[0].contains("1/2 accounts succeeded"));
        assert!(lines[0].contains("HKT"));
        assert!(lines[1].contains("u1"));
        assert!(lines[2].contains("u2"));
    }

    #[test]
    fn test_all_failure_summary() {
        let message = TelegramNotifier::format_summary(&summary(&[false, false]));
        assert!(message.lines().next().unwrap().contains("0/2"));
    }

    #[test]
    fn test_empty_outcomes_is_header_only() {
        let message = TelegramNotifier::format_summary(&summary(&[]));
        assert_eq!(message.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_report_delivers_to_configured_destination() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "chat_id": "42",
            })))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let notifier = TelegramNotifier::new(Some("TOKEN".into()), Some("42".into()))
            .with_api_base(server.url());
        notifier.report(&summary(&[true])).await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .with_status(500)
            .create_async()
            .await;

        let notifier = TelegramNotifier::new(Some("TOKEN".into()), Some("42".into()))
            .with_api_base(server.url());
        // Must not panic or propagate.
        notifier.report(&summary(&[false])).await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unconfigured_destination_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let notifier =
            TelegramNotifier::new(Some("TOKEN".into()), None).with_api_base(server.url());
        notifier.report(&summary(&[true])).await;

        mock.assert_async().await;
    }
}
