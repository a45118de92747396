//! Directory Cache
//!
//! TTL-memoized full listings of users and channels, one Moka cache per
//! resource kind. Loads are single-flight: concurrent callers asking for the
//! same directory share one in-flight fetch instead of issuing duplicates.
//!
//! Lookups that miss a cached directory force exactly one refresh before
//! reporting absence, so a record created remotely after the cache was
//! populated is still found without ever looping.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::config::Config;
use crate::errors::DirectoryError;
use crate::paginator::fetch_all;
use crate::transport::{ChannelFilter, ChannelRecord, SlackClient, UserRecord};

/// Process-wide directory cache for one Slack workspace.
///
/// Constructed at backend startup and shared (via `Arc`) by every resolver;
/// torn down at shutdown. Both kinds can be invalidated independently.
pub struct DirectoryCache {
    client: Arc<dyn SlackClient>,
    config: Config,
    // The user directory takes no query parameters, hence the unit key.
    users: Cache<(), Arc<Vec<UserRecord>>>,
    channels: Cache<ChannelFilter, Arc<Vec<ChannelRecord>>>,
}

impl DirectoryCache {
    pub fn new(client: Arc<dyn SlackClient>, config: Config) -> Self {
        // TTL-only: directories are a small per-kind working set, so there
        // is no capacity-based eviction.
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        let users = Cache::builder().time_to_live(ttl).build();
        let channels = Cache::builder().time_to_live(ttl).build();

        Self {
            client,
            config,
            users,
            channels,
        }
    }

    pub fn client(&self) -> &Arc<dyn SlackClient> {
        &self.client
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The full user directory, fetched at most once per TTL window.
    pub async fn users(&self) -> Result<Arc<Vec<UserRecord>>, DirectoryError> {
        self.users
            .try_get_with((), async {
                debug!("user directory miss, fetching all pages");
                let client = self.client.clone();
                let limit = self.config.users_page_limit;
                let records = fetch_all(
                    move |cursor| {
                        let client = client.clone();
                        async move { client.users_page(cursor, limit).await }
                    },
                    self.config.max_retries,
                )
                .await?;
                debug!(count = records.len(), "user directory fetched");
                Ok(Arc::new(records))
            })
            .await
            .map_err(|e: Arc<DirectoryError>| (*e).clone())
    }

    /// The full channel directory for one filter, fetched at most once per
    /// TTL window per distinct filter.
    pub async fn channels(
        &self,
        filter: &ChannelFilter,
    ) -> Result<Arc<Vec<ChannelRecord>>, DirectoryError> {
        self.channels
            .try_get_with(filter.clone(), async {
                debug!(?filter, "channel directory miss, fetching all pages");
                let client = self.client.clone();
                let limit = self.config.conversations_page_limit;
                let filter = filter.clone();
                let records = fetch_all(
                    move |cursor| {
                        let client = client.clone();
                        let filter = filter.clone();
                        async move { client.conversations_page(cursor, limit, &filter).await }
                    },
                    self.config.max_retries,
                )
                .await?;
                debug!(count = records.len(), "channel directory fetched");
                Ok(Arc::new(records))
            })
            .await
            .map_err(|e: Arc<DirectoryError>| (*e).clone())
    }

    /// Channels under a filter, optionally narrowed to ones the bot joined.
    ///
    /// Membership is filtered in memory so every `joined_only` value shares
    /// the same cached directory.
    pub async fn channels_filtered(
        &self,
        filter: &ChannelFilter,
        joined_only: bool,
    ) -> Result<Vec<ChannelRecord>, DirectoryError> {
        let directory = self.channels(filter).await?;
        Ok(directory
            .iter()
            .filter(|c| c.is_member || !joined_only)
            .cloned()
            .collect())
    }

    /// Every user whose display name matches, refreshing the directory once
    /// if the cached copy has no match.
    ///
    /// May return multiple records: Slack display names are not unique, and
    /// classifying that is the caller's decision.
    pub async fn find_users_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<UserRecord>, DirectoryError> {
        let name = name.trim_start_matches('@');

        let directory = self.users().await?;
        let matches = users_named(&directory, name);
        if !matches.is_empty() {
            return Ok(matches);
        }

        debug!(name, "user not in cached directory, forcing one refresh");
        self.users.invalidate(&()).await;
        let directory = self.users().await?;
        Ok(users_named(&directory, name))
    }

    /// The first channel with a matching name, refreshing the directory once
    /// if the cached copy has no match.
    pub async fn find_channel_by_name(
        &self,
        filter: &ChannelFilter,
        name: &str,
    ) -> Result<Option<ChannelRecord>, DirectoryError> {
        let name = name.trim_start_matches('#');

        let directory = self.channels(filter).await?;
        if let Some(channel) = channel_named(&directory, name) {
            return Ok(Some(channel));
        }

        debug!(name, "channel not in cached directory, forcing one refresh");
        self.channels.invalidate(filter).await;
        let directory = self.channels(filter).await?;
        Ok(channel_named(&directory, name))
    }

    /// Drop every cached user directory entry.
    pub fn invalidate_users(&self) {
        self.users.invalidate_all();
    }

    /// Drop every cached channel directory entry, across all filters.
    pub fn invalidate_channels(&self) {
        self.channels.invalidate_all();
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.invalidate_users();
        self.invalidate_channels();
    }
}

fn users_named(directory: &[UserRecord], name: &str) -> Vec<UserRecord> {
    directory.iter().filter(|u| u.name == name).cloned().collect()
}

fn channel_named(directory: &[ChannelRecord], name: &str) -> Option<ChannelRecord> {
    directory.iter().find(|c| c.name == name).cloned()
}
