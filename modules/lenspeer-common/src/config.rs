use std::env;
use std::time::Duration;

use tracing::info;

const DEFAULT_API_URL: &str = "https://api-v2.lens.dev";
const DEFAULT_MESSAGE: &str =
    "Hello! Check out Web3Names.AI, where you can claim your own web3 domain!";

/// Agent configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Lens API.
    pub api_url: String,
    /// Bearer credential for the profile and message endpoints.
    pub auth_token: String,
    /// SQLite database URL.
    pub database_url: String,
    /// Outbound message text.
    pub message: String,
    /// Max profiles requested per explore query.
    pub page_size: u32,
    /// Delay between cycles.
    pub cycle_delay: Duration,
    /// Fetch attempts per cycle before giving up.
    pub fetch_attempts: u32,
    /// Delay between fetch attempts.
    pub fetch_retry_delay: Duration,
    /// Delay between consecutive sends.
    pub send_pacing: Duration,
    /// Replay every stored record each cycle instead of only undelivered ones.
    pub replay_all: bool,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("LENS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            auth_token: required_env("LENS_AUTH_TOKEN"),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:sent_profiles.db?mode=rwc".to_string()),
            message: env::var("OUTREACH_MESSAGE").unwrap_or_else(|_| DEFAULT_MESSAGE.to_string()),
            page_size: parsed_env("PAGE_SIZE", 10),
            cycle_delay: Duration::from_secs(parsed_env("CYCLE_DELAY_SECS", 600)),
            fetch_attempts: parsed_env("FETCH_ATTEMPTS", 3),
            fetch_retry_delay: Duration::from_secs(parsed_env("FETCH_RETRY_DELAY_SECS", 2)),
            send_pacing: Duration::from_secs(parsed_env("SEND_PACING_SECS", 2)),
            replay_all: env::var("REPLAY_ALL")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    /// Log the non-secret settings at startup.
    pub fn log_redacted(&self) {
        info!(
            api_url = self.api_url.as_str(),
            database_url = self.database_url.as_str(),
            page_size = self.page_size,
            cycle_delay_secs = self.cycle_delay.as_secs(),
            fetch_attempts = self.fetch_attempts,
            replay_all = self.replay_all,
            "Config loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
