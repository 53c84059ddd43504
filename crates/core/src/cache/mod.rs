//! SQLite-backed cache storage for captured responses.
//!
//! Mirrors the browser's Cache Storage: a [`CacheDb`] holds any number of
//! named namespaces, and a [`Namespace`] handle maps request identity
//! (method + absolute URL) to a stored [`crate::Response`]. It supports:
//!
//! - Content-addressed keys using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - All-or-nothing batch writes and whole-namespace deletion

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod namespaces;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedEntry;
pub use namespaces::Namespace;
