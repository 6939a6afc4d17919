//! Netlib Keeper entry point
//!
//! Environment variables:
//! - `ACCOUNTS` - credential batch, `user1:pass1,user2:pass2` (required)
//! - `BOT_TOKEN` / `CHAT_ID` - Telegram destination (notification skipped if unset)
//! - `NETLIB_URL` - landing page override (default: https://www.netlib.re/)
//! - `HEADLESS` - set to `0` or `false` to watch the browser
//!
//! Exits non-zero only on configuration errors, before any browser session
//! is opened. Individual login failures never change the exit status.

use tracing::info;

use netlib_keeper::accounts;
use netlib_keeper::browser::{ChromiumAutomation, LoginDriver, SessionConfig};
use netlib_keeper::notify::TelegramNotifier;
use netlib_keeper::runner::BatchRunner;
use netlib_keeper::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = netlib_keeper::init_logging();

    info!("Starting Netlib Keeper");
    if let Some(dir) = netlib_keeper::log_dir() {
        info!("Log files saved to: {}", dir.display());
    }

    let config = AppConfig::from_env();

    // Credential configuration is the only fatal input.
    let batch = accounts::parse(config.accounts.as_deref())?;
    info!("Found {} account(s) to log in", batch.len());

    let session_config = SessionConfig {
        headless: config.headless,
        action_timeout_secs: config.action_timeout_secs,
        ..SessionConfig::default()
    };
    let automation = ChromiumAutomation::new(session_config);
    let driver = LoginDriver::new(Box::new(automation), config.target_url.clone());
    let runner = BatchRunner::new(driver);

    let summary = runner.run(&batch).await;

    // Best-effort: a failed notification never fails the run.
    TelegramNotifier::new(config.bot_token.clone(), config.chat_id.clone())
        .report(&summary)
        .await;

    info!("All accounts processed");
    Ok(())
}
