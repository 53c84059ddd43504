//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn validate_paths(field: &str, paths: &[String]) -> Result<(), ConfigError> {
    for path in paths {
        if !path.starts_with('/') || path.starts_with("//") {
            return Err(invalid(field, format!("'{path}' must be a root-relative path")));
        }
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - `cache_version` is empty or contains whitespace
    /// - an asset path or `offline_shell` is not root-relative
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent`, `sync_tag` or `notification.tag` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = url::Url::parse(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", "must use http or https"));
        }
        if origin.path() != "/" || origin.query().is_some() {
            tracing::warn!(origin = %self.origin, "origin has a path or query; only scheme, host and port are used");
        }

        if self.cache_version.is_empty() || self.cache_version.chars().any(char::is_whitespace) {
            return Err(invalid("cache_version", "must be non-empty and contain no whitespace"));
        }

        validate_paths("static_assets", &self.static_assets)?;
        validate_paths("image_assets", &self.image_assets)?;
        validate_paths("offline_shell", std::slice::from_ref(&self.offline_shell))?;

        if !self.static_assets.contains(&self.offline_shell) {
            tracing::warn!(
                offline_shell = %self.offline_shell,
                "offline shell is not in static_assets; offline navigations fall back to an empty 404"
            );
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.sync_tag.is_empty() {
            return Err(invalid("sync_tag", "must not be empty"));
        }
        if self.notification.tag.is_empty() {
            return Err(invalid("notification.tag", "must not be empty"));
        }

        Ok(())
    }
}
