//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Request/response model shared by the worker and the cache
//! - Cache storage with SQLite backend (namespaces of captured responses)
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CachedEntry, Namespace};
pub use config::{AppConfig, ConfigError, NotificationConfig};
pub use error::Error;
pub use http::{Destination, Request, Response};
