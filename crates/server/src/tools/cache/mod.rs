//! Cache-related MCP tools.
//!
//! These read and purge the namespaces directly, without going through the
//! worker's strategies.

pub mod get;
pub mod list;
pub mod purge;

pub use get::{CacheGetParams, get_impl};
pub use list::{CacheListParams, list_impl};
pub use purge::{CachePurgeParams, purge_impl};
