//! Slack Directory Engine
//!
//! Resolution and caching core for Slack bot backends: turns human-friendly
//! references (`@user`, `#channel/user`, `<@U123|name>`) into stable Slack
//! IDs without hammering the paginated Web API.
//!
//! # Features
//!
//! - **Paginator**: cursor-driven full fetch with rate-limit backoff and a
//!   bounded per-page retry ceiling
//! - **Directory Cache**: TTL-memoized user/channel directories (Moka) with
//!   single-flight loads and a forced refresh-once on stale misses
//! - **Identifier Resolver**: the Slack mention grammar, name↔ID
//!   conversions, and mention extraction from free text
//! - **Identifier Types**: `SlackPerson` / `SlackRoom` / `SlackRoomOccupant`
//!   with ID-based equality and lazy profile resolution
//!
//! # Architecture
//!
//! ```text
//! caller ──► IdentifierResolver ──► DirectoryCache ──► fetch_all ──► SlackClient
//!                   │                 (Moka + TTL)      (cursors,    (trait, yours)
//!                   ▼                                    backoff)
//!            SlackIdentifier
//!         (Person/Room/Occupant)
//! ```
//!
//! The wire protocol is not owned here: implement [`SlackClient`] over your
//! HTTP stack and hand it to [`DirectoryCache`].

pub mod config;
pub mod directory;
pub mod errors;
pub mod identifier;
pub mod paginator;
pub mod resolver;
pub mod transport;

pub use config::Config;
pub use directory::DirectoryCache;
pub use errors::DirectoryError;
pub use identifier::{SlackIdentifier, SlackPerson, SlackRoom, SlackRoomOccupant};
pub use paginator::fetch_all;
pub use resolver::{ExtractedIdentifiers, IdentifierResolver};
pub use transport::{ChannelFilter, ChannelRecord, Page, SlackClient, TransportError, UserRecord};
