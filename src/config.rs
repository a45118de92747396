//! Configuration management

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Page size requested from `users.list`
    pub users_page_limit: u32,

    /// Page size requested from `conversations.list`
    pub conversations_page_limit: u32,

    /// Directory cache TTL in seconds
    pub cache_ttl_secs: u64,

    /// Rate-limit retries per page, after the first attempt
    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            users_page_limit: 500,
            conversations_page_limit: 500,
            cache_ttl_secs: 14_400,
            max_retries: 3,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let users_page_limit = std::env::var("SLACK_USERS_PAGE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.users_page_limit);

        let conversations_page_limit = std::env::var("SLACK_CONVERSATIONS_PAGE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.conversations_page_limit);

        let cache_ttl_secs = std::env::var("SLACK_DIRECTORY_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.cache_ttl_secs);

        let max_retries = std::env::var("SLACK_RATELIMIT_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_retries);

        Self {
            users_page_limit,
            conversations_page_limit,
            cache_ttl_secs,
            max_retries,
        }
    }
}
