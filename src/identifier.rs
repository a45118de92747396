//! Identifier value types
//!
//! `SlackPerson`, `SlackRoom` and `SlackRoomOccupant` are immutable
//! references to remote entities. Equality and hashing are defined over the
//! remote IDs only: two values naming the same entity compare equal even if
//! one cached a display name before a rename.
//!
//! Display attributes are resolved lazily through explicit async accessors,
//! backed by a once-cell filled by a single point lookup per instance.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::directory::DirectoryCache;
use crate::errors::DirectoryError;
use crate::transport::{ChannelFilter, ChannelRecord, SlackClient, UserRecord};

/// Prefix letters of valid user and bot IDs.
pub const USER_ID_PREFIXES: [char; 3] = ['U', 'B', 'W'];
/// Prefix letters of valid channel IDs (public, private/group, DM).
pub const CHANNEL_ID_PREFIXES: [char; 3] = ['C', 'G', 'D'];

pub(crate) fn validate_user_id(id: &str) -> Result<(), DirectoryError> {
    if id.starts_with(USER_ID_PREFIXES) {
        Ok(())
    } else {
        Err(DirectoryError::InvalidId {
            id: id.to_string(),
            expected: "U, B or W",
        })
    }
}

pub(crate) fn validate_channel_id(id: &str) -> Result<(), DirectoryError> {
    if id.starts_with(CHANNEL_ID_PREFIXES) {
        Ok(())
    } else {
        Err(DirectoryError::InvalidId {
            id: id.to_string(),
            expected: "C, G or D",
        })
    }
}

/// A resolved reference to a person, a room, or a person inside a room.
///
/// Closed union: consumers match exhaustively instead of probing runtime
/// types.
#[derive(Debug, Clone)]
pub enum SlackIdentifier {
    Person(SlackPerson),
    Room(SlackRoom),
    RoomOccupant(SlackRoomOccupant),
}

/// A person (or bot) on the workspace, keyed by user ID.
#[derive(Clone)]
pub struct SlackPerson {
    userid: String,
    dm_channelid: Option<String>,
    client: Arc<dyn SlackClient>,
    profile: Arc<OnceCell<UserRecord>>,
}

impl SlackPerson {
    /// Build a person from a user ID, validating its prefix class.
    ///
    /// `dm_channelid`, when known, is the direct-message channel to reach
    /// this person on.
    pub fn new(
        client: Arc<dyn SlackClient>,
        userid: impl Into<String>,
        dm_channelid: Option<String>,
    ) -> Result<Self, DirectoryError> {
        let userid = userid.into();
        validate_user_id(&userid)?;
        if let Some(ref channelid) = dm_channelid {
            validate_channel_id(channelid)?;
        }
        Ok(Self {
            userid,
            dm_channelid,
            client,
            profile: Arc::new(OnceCell::new()),
        })
    }

    pub fn userid(&self) -> &str {
        &self.userid
    }

    pub fn dm_channelid(&self) -> Option<&str> {
        self.dm_channelid.as_deref()
    }

    /// The user record, fetched at most once per instance.
    async fn profile(&self) -> Result<&UserRecord, DirectoryError> {
        self.profile
            .get_or_try_init(|| async {
                self.client
                    .user_info(&self.userid)
                    .await?
                    .ok_or_else(|| DirectoryError::UserNotFound(self.userid.clone()))
            })
            .await
    }

    /// The user's display name.
    pub async fn username(&self) -> Result<&str, DirectoryError> {
        Ok(&self.profile().await?.name)
    }

    /// The user's full (real) name.
    pub async fn fullname(&self) -> Result<Option<&str>, DirectoryError> {
        Ok(self.profile().await?.real_name.as_deref())
    }

    pub async fn email(&self) -> Result<Option<&str>, DirectoryError> {
        Ok(self.profile().await?.profile.email.as_deref())
    }

    pub async fn is_bot(&self) -> Result<bool, DirectoryError> {
        Ok(self.profile().await?.is_bot)
    }

    pub async fn is_deleted(&self) -> Result<bool, DirectoryError> {
        Ok(self.profile().await?.deleted)
    }
}

impl fmt::Debug for SlackPerson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackPerson")
            .field("userid", &self.userid)
            .field("dm_channelid", &self.dm_channelid)
            .finish()
    }
}

impl PartialEq for SlackPerson {
    fn eq(&self, other: &Self) -> bool {
        self.userid == other.userid
    }
}

impl Eq for SlackPerson {}

impl Hash for SlackPerson {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.userid.hash(state);
    }
}

/// A channel on the workspace.
///
/// Constructed from exactly one of {ID, name}; the other side resolves
/// lazily — the name through a point lookup, the ID through the channel
/// directory.
#[derive(Clone)]
pub struct SlackRoom {
    directory: Arc<DirectoryCache>,
    id: Arc<OnceCell<String>>,
    name: Arc<OnceCell<String>>,
    info: Arc<OnceCell<ChannelRecord>>,
}

impl SlackRoom {
    /// Build a room from a channel ID, validating its prefix class.
    pub fn with_id(
        directory: Arc<DirectoryCache>,
        channelid: impl Into<String>,
    ) -> Result<Self, DirectoryError> {
        let channelid = channelid.into();
        validate_channel_id(&channelid)?;
        Ok(Self {
            directory,
            id: Arc::new(OnceCell::new_with(Some(channelid))),
            name: Arc::new(OnceCell::new()),
            info: Arc::new(OnceCell::new()),
        })
    }

    /// Build a room from a channel name; a leading `#` is stripped.
    pub fn with_name(directory: Arc<DirectoryCache>, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.strip_prefix('#').unwrap_or(&name).to_string();
        Self {
            directory,
            id: Arc::new(OnceCell::new()),
            name: Arc::new(OnceCell::new_with(Some(name))),
            info: Arc::new(OnceCell::new()),
        }
    }

    /// The ID, if already known without a remote call.
    pub fn raw_id(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }

    /// The name, if already known without a remote call.
    pub fn raw_name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    /// The channel ID, resolving the name through the directory on first use.
    pub async fn id(&self) -> Result<&str, DirectoryError> {
        self.id
            .get_or_try_init(|| async {
                let name = self
                    .name
                    .get()
                    .ok_or(DirectoryError::Inconsistent("room has neither id nor name"))?;
                let channel = self
                    .directory
                    .find_channel_by_name(&ChannelFilter::default(), name)
                    .await?
                    .ok_or_else(|| DirectoryError::RoomNotFound(name.clone()))?;
                Ok(channel.id)
            })
            .await
            .map(String::as_str)
    }

    /// The channel name, resolving the ID through a point lookup on first use.
    pub async fn name(&self) -> Result<&str, DirectoryError> {
        if let Some(name) = self.name.get() {
            return Ok(name.as_str());
        }
        let record = self.info().await?;
        let _ = self.name.set(record.name.clone());
        // The set above only loses a race against an identical value.
        self.name
            .get()
            .map(String::as_str)
            .ok_or(DirectoryError::Inconsistent("room name cell empty after fill"))
    }

    pub async fn is_archived(&self) -> Result<bool, DirectoryError> {
        Ok(self.info().await?.is_archived)
    }

    pub async fn is_private(&self) -> Result<bool, DirectoryError> {
        Ok(self.info().await?.is_private)
    }

    async fn info(&self) -> Result<&ChannelRecord, DirectoryError> {
        self.info
            .get_or_try_init(|| async {
                let id = self.id().await?;
                self.directory
                    .client()
                    .conversation_info(id)
                    .await?
                    .ok_or_else(|| DirectoryError::RoomNotFound(id.to_string()))
            })
            .await
    }
}

impl fmt::Debug for SlackRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackRoom")
            .field("id", &self.id.get())
            .field("name", &self.name.get())
            .finish()
    }
}

impl PartialEq for SlackRoom {
    fn eq(&self, other: &Self) -> bool {
        match (self.raw_id(), other.raw_id()) {
            (Some(a), Some(b)) => a == b,
            // Without both IDs resolved, names are the best identity we have.
            _ => match (self.raw_name(), other.raw_name()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

/// A person addressed inside a specific room.
#[derive(Debug, Clone)]
pub struct SlackRoomOccupant {
    person: SlackPerson,
    room: SlackRoom,
}

impl SlackRoomOccupant {
    /// Build an occupant from a user ID and the ID of the room they occupy.
    pub fn new(
        directory: Arc<DirectoryCache>,
        userid: impl Into<String>,
        channelid: impl Into<String>,
    ) -> Result<Self, DirectoryError> {
        let person = SlackPerson::new(directory.client().clone(), userid, None)?;
        let room = SlackRoom::with_id(directory, channelid)?;
        Ok(Self { person, room })
    }

    pub fn person(&self) -> &SlackPerson {
        &self.person
    }

    pub fn room(&self) -> &SlackRoom {
        &self.room
    }

    pub fn userid(&self) -> &str {
        self.person.userid()
    }
}

impl PartialEq for SlackRoomOccupant {
    fn eq(&self, other: &Self) -> bool {
        // Occupant rooms are always ID-seeded, so this is an ID comparison.
        self.person == other.person
            && match (self.room.raw_id(), other.room.raw_id()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
    }
}

impl Eq for SlackRoomOccupant {}

impl Hash for SlackRoomOccupant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.person.hash(state);
        self.room.raw_id().hash(state);
    }
}
