//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*, nested keys separated by `__`)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the site the worker controls, e.g. `https://example.org`.
    ///
    /// Set via SWCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version suffix shared by the three namespace names.
    ///
    /// Bumping it invalidates every cached entry on the next activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Also bounds how long a network-first request waits before it falls
    /// back to the cache.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Root-relative URLs stored in the static namespace at install.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Root-relative URLs stored in the image namespace at install.
    #[serde(default = "default_image_assets")]
    pub image_assets: Vec<String>,

    /// Shell page served from the static namespace when a navigation fails.
    #[serde(default = "default_offline_shell")]
    pub offline_shell: String,

    /// Background sync tag that drains the analytics queue.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Run install and activate when the server starts.
    #[serde(default = "default_true")]
    pub install_on_start: bool,

    #[serde(default)]
    pub notification: NotificationConfig,
}

/// Fixed presentation of push notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_notification_title")]
    pub title: String,

    #[serde(default = "default_notification_image")]
    pub icon: String,

    #[serde(default = "default_notification_image")]
    pub badge: String,

    /// Notifications sharing a tag replace each other instead of stacking.
    #[serde(default = "default_notification_tag")]
    pub tag: String,
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_version() -> String {
    "1.1.0".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_static_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/regles.html",
        "/guide.html",
        "/styles/main.css",
        "/styles/main.js",
        "/styles/seo-optimizer.js",
        "/styles/performance-optimizer.js",
        "/manifest.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_image_assets() -> Vec<String> {
    [
        "/images/final_logo_little.png",
        "/images/final_logo_little.webp",
        "/images/final_logo_centered_little.png",
        "/images/final_logo_centered_little.webp",
        "/images/banner.jpg",
        "/images/banner.webp",
        "/images/banner.avif",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_shell() -> String {
    "/index.html".into()
}

fn default_sync_tag() -> String {
    "analytics-sync".into()
}

fn default_true() -> bool {
    true
}

fn default_notification_title() -> String {
    "Projet Résurgence".into()
}

fn default_notification_image() -> String {
    "/images/final_logo_little.png".into()
}

fn default_notification_tag() -> String {
    "resurgence-notification".into()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: default_notification_title(),
            icon: default_notification_image(),
            badge: default_notification_image(),
            tag: default_notification_tag(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_version: default_cache_version(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            static_assets: default_static_assets(),
            image_assets: default_image_assets(),
            offline_shell: default_offline_shell(),
            sync_tag: default_sync_tag(),
            install_on_start: true,
            notification: NotificationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
