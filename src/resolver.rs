//! Identifier Resolver
//!
//! Parses textual references in the Slack mention grammar and resolves them
//! to typed identifiers through the directory cache. Accepted forms:
//!
//! ```text
//! <#C12345>
//! <@U12345>
//! <@U12345|user>
//! @user
//! #channel/user
//! #channel
//! ```
//!
//! Parsing is pure syntax; resolution is where names become IDs (and can
//! fail with not-found or ambiguity errors).

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::directory::DirectoryCache;
use crate::errors::DirectoryError;
use crate::identifier::{
    SlackIdentifier, SlackPerson, SlackRoom, SlackRoomOccupant, CHANNEL_ID_PREFIXES,
    USER_ID_PREFIXES,
};
use crate::transport::ChannelFilter;

/// Slack turns `#channel` into a clickable `<#C12345>` hyperlink; other
/// clients see that token.
static CHANNEL_HYPERLINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<#(?P<id>[CG][0-9A-Z]+)>$").unwrap());

/// Mention tokens embedded in message text.
static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<@[^>]+>").unwrap());

/// The fields of a reference determinable from syntax alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedIdentifiers {
    pub username: Option<String>,
    pub userid: Option<String>,
    pub roomname: Option<String>,
    pub roomid: Option<String>,
}

/// Parse a textual reference without touching the network.
///
/// Returns whichever of username / userid / roomname / roomid the syntax
/// carries; anything outside the grammar fails with
/// [`DirectoryError::Unparseable`].
pub fn extract_identifiers(text: &str) -> Result<ExtractedIdentifiers, DirectoryError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DirectoryError::Unparseable(String::new()));
    }

    let mut extracted = ExtractedIdentifiers::default();

    if text.starts_with('<') && text.ends_with('>') {
        // Strip "<@" / "<#" and the closing ">"; the ID class is decided by
        // the prefix letter of what remains.
        let inner = text
            .get(2..text.len() - 1)
            .filter(|inner| !inner.is_empty())
            .ok_or_else(|| DirectoryError::Unparseable(text.to_string()))?;

        if inner.starts_with(USER_ID_PREFIXES) {
            match inner.split_once('|') {
                Some((userid, username)) => {
                    extracted.userid = Some(userid.to_string());
                    extracted.username = Some(username.to_string());
                }
                None => extracted.userid = Some(inner.to_string()),
            }
        } else if inner.starts_with(CHANNEL_ID_PREFIXES) {
            let roomid = inner.split_once('|').map_or(inner, |(id, _)| id);
            extracted.roomid = Some(roomid.to_string());
        } else {
            return Err(DirectoryError::Unparseable(text.to_string()));
        }
    } else if let Some(rest) = text.strip_prefix('@') {
        extracted.username = Some(rest.to_string());
    } else if let Some(rest) = text.strip_prefix('#') {
        match rest.split_once('/') {
            Some((roomname, username)) => {
                extracted.roomname = Some(roomname.to_string());
                extracted.username = Some(username.to_string());
            }
            None => extracted.roomname = Some(rest.to_string()),
        }
    } else {
        return Err(DirectoryError::Unparseable(text.to_string()));
    }

    Ok(extracted)
}

/// Resolves textual references against a shared [`DirectoryCache`].
///
/// Stateless per call; the only memory between invocations is the cache's
/// TTL entries.
pub struct IdentifierResolver {
    directory: Arc<DirectoryCache>,
}

impl IdentifierResolver {
    pub fn new(directory: Arc<DirectoryCache>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Arc<DirectoryCache> {
        &self.directory
    }

    /// Parse and resolve a reference into a typed identifier.
    pub async fn build_identifier(&self, text: &str) -> Result<SlackIdentifier, DirectoryError> {
        debug!(text, "building identifier");
        let parsed = extract_identifiers(text)?;

        let userid = match (parsed.userid, parsed.username.as_deref()) {
            (Some(userid), _) => Some(userid),
            (None, Some(username)) => Some(self.username_to_userid(username).await?),
            (None, None) => None,
        };

        let mut room_err = None;
        let roomid = match (parsed.roomid, parsed.roomname.as_deref()) {
            (Some(roomid), _) => Some(roomid),
            (None, Some(roomname)) => match self.roomname_to_roomid(roomname).await {
                Ok(roomid) => Some(roomid),
                Err(err @ DirectoryError::RoomNotFound(_)) => {
                    // Held until we know no combination below can apply.
                    room_err = Some(err);
                    None
                }
                Err(err) => return Err(err),
            },
            (None, None) => None,
        };

        match (userid, roomid) {
            (Some(userid), Some(roomid)) => Ok(SlackIdentifier::RoomOccupant(
                SlackRoomOccupant::new(self.directory.clone(), userid, roomid)?,
            )),
            (Some(userid), None) => {
                if let Some(err) = room_err {
                    // `#missing/user`: half a reference is not a Person.
                    return Err(err);
                }
                let dm_channelid = self.directory.client().open_im(&userid).await?;
                Ok(SlackIdentifier::Person(SlackPerson::new(
                    self.directory.client().clone(),
                    userid,
                    dm_channelid,
                )?))
            }
            (None, Some(roomid)) => Ok(SlackIdentifier::Room(SlackRoom::with_id(
                self.directory.clone(),
                roomid,
            )?)),
            (None, None) => Err(room_err.unwrap_or(DirectoryError::Inconsistent(
                "parsed a reference but resolved neither a user nor a room",
            ))),
        }
    }

    /// Convert a display name to a user ID via the user directory.
    ///
    /// Display names are not unique on Slack; more than one match is an
    /// error rather than an arbitrary pick.
    pub async fn username_to_userid(&self, name: &str) -> Result<String, DirectoryError> {
        let name = name.trim_start_matches('@');
        let mut matches = self.directory.find_users_by_name(name).await?;
        match matches.len() {
            0 => Err(DirectoryError::UserNotFound(name.to_string())),
            1 => Ok(matches.remove(0).id),
            count => {
                warn!(name, count, "display name is not unique");
                Err(DirectoryError::UserNotUnique {
                    name: name.to_string(),
                    count,
                })
            }
        }
    }

    /// Convert a user ID to its display name via a point lookup.
    pub async fn userid_to_username(&self, userid: &str) -> Result<String, DirectoryError> {
        self.directory
            .client()
            .user_info(userid)
            .await?
            .map(|user| user.name)
            .ok_or_else(|| DirectoryError::UserNotFound(userid.to_string()))
    }

    /// Convert a channel name to its ID via the channel directory.
    ///
    /// Channel names are assumed unique; the first match wins.
    pub async fn roomname_to_roomid(&self, name: &str) -> Result<String, DirectoryError> {
        let name = name.trim_start_matches('#');
        self.directory
            .find_channel_by_name(&ChannelFilter::default(), name)
            .await?
            .map(|channel| channel.id)
            .ok_or_else(|| DirectoryError::RoomNotFound(name.to_string()))
    }

    /// Convert a channel ID to its name via a point lookup.
    pub async fn roomid_to_roomname(&self, roomid: &str) -> Result<String, DirectoryError> {
        self.directory
            .client()
            .conversation_info(roomid)
            .await?
            .map(|channel| channel.name)
            .ok_or_else(|| DirectoryError::RoomNotFound(roomid.to_string()))
    }

    /// Build a room from a raw ID, a `<#C12345>` hyperlink, or a plain name.
    pub fn room_from_text(&self, text: &str) -> Result<SlackRoom, DirectoryError> {
        if text.starts_with(['C', 'G']) {
            return SlackRoom::with_id(self.directory.clone(), text);
        }
        if let Some(captures) = CHANNEL_HYPERLINK.captures(text) {
            return SlackRoom::with_id(self.directory.clone(), &captures["id"]);
        }
        Ok(SlackRoom::with_name(self.directory.clone(), text))
    }

    /// Rewrite `<@U...>` mention tokens in `text` to `@username` and collect
    /// the mentioned persons.
    ///
    /// Tokens that fail to parse or resolve are left in place and skipped.
    pub async fn process_mentions(&self, text: &str) -> (String, Vec<SlackPerson>) {
        let mut rewritten = text.to_string();
        let mut mentioned = Vec::new();

        for token in MENTION.find_iter(text) {
            let identifier = match self.build_identifier(token.as_str()).await {
                Ok(identifier) => identifier,
                Err(err) => {
                    debug!(token = token.as_str(), %err, "skipping unresolvable mention");
                    continue;
                }
            };

            // Only person mentions are tracked.
            if let SlackIdentifier::Person(person) = identifier {
                match person.username().await {
                    Ok(username) => {
                        rewritten = rewritten.replace(token.as_str(), &format!("@{username}"));
                        mentioned.push(person);
                    }
                    Err(err) => {
                        debug!(token = token.as_str(), %err, "mentioned user has no profile");
                    }
                }
            }
        }

        (rewritten, mentioned)
    }
}
