//! Netlib Keeper
//!
//! Keeps a batch of netlib.re accounts alive by signing each one in through
//! a real Chromium instance, one isolated session at a time with randomized
//! human-like pacing, then reports an aggregate summary to a Telegram chat.

pub mod accounts;
pub mod browser;
pub mod notify;
pub mod pacing;
pub mod runner;

use std::path::PathBuf;

/// Application configuration
///
/// Read once from the process environment at startup; everything downstream
/// works off this value and never touches the environment itself.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Raw account batch, `username:password` pairs separated by `,` or `;`
    pub accounts: Option<String>,
    /// Telegram bot token (notification skipped when absent)
    pub bot_token: Option<String>,
    /// Telegram chat id (notification skipped when absent)
    pub chat_id: Option<String>,
    /// Landing page of the target service
    pub target_url: String,
    /// Run Chromium in headless mode
    pub headless: bool,
    /// Upper bound for any single automation action, in seconds
    pub action_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            accounts: None,
            bot_token: None,
            chat_id: None,
            target_url: "https://www.netlib.re/".to_string(),
            headless: true,
            action_timeout_secs: 45,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        fn non_empty(key: &str) -> Option<String> {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let defaults = Self::default();
        Self {
            accounts: non_empty("ACCOUNTS"),
            bot_token: non_empty("BOT_TOKEN"),
            chat_id: non_empty("CHAT_ID"),
            target_url: non_empty("NETLIB_URL").unwrap_or(defaults.target_url),
            headless: non_empty("HEADLESS")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(defaults.headless),
            action_timeout_secs: defaults.action_timeout_secs,
        }
    }
}

/// Get log directory path
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("netlib-keeper").join("logs"))
}

/// Initialize logging: console layer plus a daily-rolling file layer.
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "netlib-keeper.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}
