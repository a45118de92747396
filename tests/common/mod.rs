//! Shared test transport: an in-memory Slack workspace with paginated
//! listings and call counters.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use slack_directory::transport::UserProfile;
use slack_directory::{
    ChannelFilter, ChannelRecord, Config, DirectoryCache, Page, SlackClient, TransportError,
    UserRecord,
};

/// Route engine logs to the test output; `RUST_LOG=debug` shows cache
/// hit/miss and backoff traces.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn user(id: &str, name: &str) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        name: name.to_string(),
        real_name: Some(format!("{name} fullname")),
        profile: UserProfile::default(),
        is_bot: false,
        deleted: false,
    }
}

pub fn bot(id: &str, name: &str) -> UserRecord {
    UserRecord {
        is_bot: true,
        ..user(id, name)
    }
}

pub fn channel(id: &str, name: &str) -> ChannelRecord {
    ChannelRecord {
        id: id.to_string(),
        name: name.to_string(),
        is_archived: false,
        is_member: false,
        is_private: false,
    }
}

/// In-memory workspace. Listings are served in pages of the requested
/// limit; `*_cycles` counts full fetch cycles (calls with an empty cursor).
pub struct TestClient {
    pub users: Mutex<Vec<UserRecord>>,
    pub channels: Mutex<Vec<ChannelRecord>>,
    pub user_cycles: AtomicU32,
    pub channel_cycles: AtomicU32,
    pub user_pages: AtomicU32,
}

impl TestClient {
    pub fn new(users: Vec<UserRecord>, channels: Vec<ChannelRecord>) -> Arc<Self> {
        Arc::new(Self {
            users: Mutex::new(users),
            channels: Mutex::new(channels),
            user_cycles: AtomicU32::new(0),
            channel_cycles: AtomicU32::new(0),
            user_pages: AtomicU32::new(0),
        })
    }
}

fn paginate<T: Clone>(items: &[T], cursor: Option<String>, limit: u32) -> Page<T> {
    let start: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
    let end = (start + limit as usize).min(items.len());
    let next_cursor = if end < items.len() {
        Some(end.to_string())
    } else {
        Some(String::new())
    };
    Page {
        items: items[start..end].to_vec(),
        next_cursor,
    }
}

#[async_trait]
impl SlackClient for TestClient {
    async fn users_page(
        &self,
        cursor: Option<String>,
        limit: u32,
    ) -> Result<Page<UserRecord>, TransportError> {
        if cursor.is_none() {
            self.user_cycles.fetch_add(1, Ordering::SeqCst);
        }
        self.user_pages.fetch_add(1, Ordering::SeqCst);
        Ok(paginate(&self.users.lock().unwrap(), cursor, limit))
    }

    async fn conversations_page(
        &self,
        cursor: Option<String>,
        limit: u32,
        filter: &ChannelFilter,
    ) -> Result<Page<ChannelRecord>, TransportError> {
        if cursor.is_none() {
            self.channel_cycles.fetch_add(1, Ordering::SeqCst);
        }
        let channels: Vec<ChannelRecord> = self
            .channels
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !(filter.exclude_archived && c.is_archived))
            .cloned()
            .collect();
        Ok(paginate(&channels, cursor, limit))
    }

    async fn user_info(&self, userid: &str) -> Result<Option<UserRecord>, TransportError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == userid)
            .cloned())
    }

    async fn conversation_info(
        &self,
        channelid: &str,
    ) -> Result<Option<ChannelRecord>, TransportError> {
        Ok(self
            .channels
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == channelid)
            .cloned())
    }

    async fn open_im(&self, userid: &str) -> Result<Option<String>, TransportError> {
        let users = self.users.lock().unwrap();
        match users.iter().find(|u| u.id == userid) {
            Some(u) if u.is_bot => Ok(None),
            Some(u) => Ok(Some(format!("D{}", &u.id[1..]))),
            None => Err(TransportError::Api("user_not_found".to_string())),
        }
    }
}

/// A cache over the test client with a small page size, so every listing
/// actually paginates.
pub fn directory(client: Arc<TestClient>) -> Arc<DirectoryCache> {
    let config = Config {
        users_page_limit: 2,
        conversations_page_limit: 2,
        ..Config::default()
    };
    Arc::new(DirectoryCache::new(client, config))
}
