//! Process-wide worker context.
//!
//! Everything version- or site-specific lives here so the rest of the
//! worker never spells a namespace name or an origin as a literal.

use swcache_core::{AppConfig, Error, NotificationConfig, Request};
use url::Url;

use crate::fetch::{parse_origin, resolve};

/// The three namespaces a worker version owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    /// HTML shell, stylesheets, scripts, manifest.
    Static,
    /// Documents fetched over the network.
    Dynamic,
    /// Bitmap assets.
    Image,
}

/// Version-qualified namespace names, derived from one version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    pub static_assets: String,
    pub dynamic: String,
    pub images: String,
}

impl CacheNames {
    pub fn for_version(version: &str) -> Self {
        Self {
            static_assets: format!("static-v{version}"),
            dynamic: format!("dynamic-v{version}"),
            images: format!("images-v{version}"),
        }
    }

    pub fn get(&self, kind: NamespaceKind) -> &str {
        match kind {
            NamespaceKind::Static => &self.static_assets,
            NamespaceKind::Dynamic => &self.dynamic,
            NamespaceKind::Image => &self.images,
        }
    }

    pub fn all(&self) -> [&str; 3] {
        [&self.static_assets, &self.dynamic, &self.images]
    }

    /// Whether a namespace belongs to this version.
    pub fn is_current(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}

/// Immutable configuration of one worker version.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    origin: Url,
    version: String,
    names: CacheNames,
    static_manifest: Vec<String>,
    image_manifest: Vec<String>,
    offline_shell: String,
    sync_tag: String,
    notification: NotificationConfig,
}

impl WorkerContext {
    /// Context for `origin` at `version` with the default manifests.
    pub fn new(origin: &str, version: &str) -> Result<Self, Error> {
        let defaults = AppConfig { origin: origin.to_string(), cache_version: version.to_string(), ..Default::default() };
        Self::from_config(&defaults)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            origin,
            version: config.cache_version.clone(),
            names: CacheNames::for_version(&config.cache_version),
            static_manifest: config.static_assets.clone(),
            image_manifest: config.image_assets.clone(),
            offline_shell: config.offline_shell.clone(),
            sync_tag: config.sync_tag.clone(),
            notification: config.notification.clone(),
        })
    }

    /// Replace both install manifests.
    pub fn with_manifest(mut self, static_assets: &[&str], image_assets: &[&str]) -> Self {
        self.static_manifest = static_assets.iter().map(|s| s.to_string()).collect();
        self.image_manifest = image_assets.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    pub fn static_manifest(&self) -> &[String] {
        &self.static_manifest
    }

    pub fn image_manifest(&self) -> &[String] {
        &self.image_manifest
    }

    pub fn sync_tag(&self) -> &str {
        &self.sync_tag
    }

    pub fn notification(&self) -> &NotificationConfig {
        &self.notification
    }

    /// Resolve a path or URL against the site origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        resolve(&self.origin, input).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))
    }

    /// The request whose cached response is served to offline navigations.
    pub fn shell_request(&self) -> Result<Request, Error> {
        self.resolve(&self.offline_shell).map(Request::get)
    }

    /// Site root, where notification clicks land.
    pub fn root_url(&self) -> Url {
        self.origin.clone()
    }
}
