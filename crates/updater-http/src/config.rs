use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Idle window after which an attempt is aborted.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 60_000;
/// Redirect hops a download may follow.
pub const DEFAULT_DOWNLOAD_MAX_REDIRECTS: usize = 5;
/// Redirect hops an API request may follow.
pub const DEFAULT_API_MAX_REDIRECTS: usize = 10;
/// Sent on every request; some hosts answer 401 when it is missing.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Tunables shared by both executors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutorConfig {
    #[serde(default = "ExecutorConfig::default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    #[serde(default = "ExecutorConfig::default_download_max_redirects")]
    pub download_max_redirects: usize,
    #[serde(default = "ExecutorConfig::default_api_max_redirects")]
    pub api_max_redirects: usize,
    #[serde(default = "ExecutorConfig::default_user_agent")]
    pub user_agent: String,
}

impl ExecutorConfig {
    fn default_idle_timeout_ms() -> u64 {
        DEFAULT_IDLE_TIMEOUT_MS
    }

    fn default_download_max_redirects() -> usize {
        DEFAULT_DOWNLOAD_MAX_REDIRECTS
    }

    fn default_api_max_redirects() -> usize {
        DEFAULT_API_MAX_REDIRECTS
    }

    fn default_user_agent() -> String {
        DEFAULT_USER_AGENT.to_string()
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            download_max_redirects: DEFAULT_DOWNLOAD_MAX_REDIRECTS,
            api_max_redirects: DEFAULT_API_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
