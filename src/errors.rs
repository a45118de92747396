//! Error taxonomy for directory resolution

use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by the paginator, the directory cache and the resolver.
///
/// `Clone` is required so directory load failures can flow back out of the
/// single-flight cache, which shares one result among concurrent waiters.
#[derive(Error, Debug, Clone)]
pub enum DirectoryError {
    /// The rate-limit retry ceiling was exhausted for a single page.
    #[error("rate limit exceeded after {attempts} attempts on the same page")]
    RateLimitExceeded { attempts: u32 },

    /// A username was absent from the directory, even after a forced refresh.
    #[error("cannot find user {0}")]
    UserNotFound(String),

    /// A channel name or ID was absent, even after a forced refresh.
    #[error("no channel named {0} exists")]
    RoomNotFound(String),

    /// A display name matched more than one user record.
    #[error("failed to uniquely identify {name}: {count} users share this name")]
    UserNotUnique { name: String, count: usize },

    /// A textual reference matched none of the accepted formats.
    #[error(
        "unparseable slack identifier, should be of the format `<#C12345>`, `<@U12345>`, \
         `<@U12345|user>`, `@user`, `#channel/user` or `#channel` (got `{0}`)"
    )]
    Unparseable(String),

    /// An identifier was constructed with an ID outside its prefix class.
    #[error("invalid slack id `{id}`: should start with one of {expected}")]
    InvalidId { id: String, expected: &'static str },

    /// A non-rate-limit failure from the remote boundary, unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A state the resolution protocol should never reach.
    #[error("internal inconsistency: {0} (this is a bug, please report it)")]
    Inconsistent(&'static str),
}
