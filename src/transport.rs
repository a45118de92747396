//! Remote boundary contract
//!
//! The engine never talks to Slack directly; it drives a [`SlackClient`]
//! implementation supplied by the backend. The record types mirror the
//! fields of `users.list` / `conversations.list` payloads this core reads,
//! so a transport can deserialize API responses straight into them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure modes a transport can report.
///
/// Rate limiting is the single distinguished condition: the paginator
/// retries it with the server-supplied delay. Everything else propagates
/// to the caller untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The remote answered `ratelimited`; retry no sooner than the given delay.
    #[error("rate limited by slack, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Any other API failure (HTTP error, non-ok response, decode failure).
    #[error("slack api call failed: {0}")]
    Api(String),
}

/// Profile subset attached to a user record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: Option<String>,
}

/// One member from `users.list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// One channel from `conversations.list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub is_private: bool,
}

/// One page of records plus the continuation token.
///
/// Slack signals the end of the stream with an empty `next_cursor`; both the
/// empty string and an absent field mean "no more pages".
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A terminal page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    /// True once the cursor no longer points anywhere.
    pub fn is_last(&self) -> bool {
        match &self.next_cursor {
            None => true,
            Some(cursor) => cursor.is_empty(),
        }
    }
}

/// Query parameters for the channel directory.
///
/// `joined_only` is deliberately absent: membership is filtered in memory
/// after the fetch, so it never fragments the cache key space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelFilter {
    pub exclude_archived: bool,
    /// Value for the `types` parameter of `conversations.list`.
    pub types: String,
}

impl Default for ChannelFilter {
    fn default() -> Self {
        Self {
            exclude_archived: true,
            types: "public_channel,private_channel".to_string(),
        }
    }
}

/// The page-fetch and point-lookup surface a backend must supply.
#[async_trait]
pub trait SlackClient: Send + Sync {
    /// Fetch one page of `users.list`.
    async fn users_page(
        &self,
        cursor: Option<String>,
        limit: u32,
    ) -> Result<Page<UserRecord>, TransportError>;

    /// Fetch one page of `conversations.list` under the given filter.
    async fn conversations_page(
        &self,
        cursor: Option<String>,
        limit: u32,
        filter: &ChannelFilter,
    ) -> Result<Page<ChannelRecord>, TransportError>;

    /// Point lookup via `users.info`; `Ok(None)` when no such user exists.
    async fn user_info(&self, userid: &str) -> Result<Option<UserRecord>, TransportError>;

    /// Point lookup via `conversations.info`; `Ok(None)` when no such channel exists.
    async fn conversation_info(
        &self,
        channelid: &str,
    ) -> Result<Option<ChannelRecord>, TransportError>;

    /// Open (or look up) the direct-message channel to a user.
    ///
    /// Implementations map the `cannot_dm_bot` API error to `Ok(None)`.
    async fn open_im(&self, userid: &str) -> Result<Option<String>, TransportError>;
}
