//! Install, activate and teardown.
//!
//! Install pre-populates the static and image namespaces from the
//! manifests; activate deletes every namespace left over from another
//! version.

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use swcache_core::{Error, Request, Response};

use super::strategy::CacheManager;

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Not installed yet.
    #[default]
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    /// Controlling clients; fetches are intercepted.
    Activated,
    /// Install failed.
    Redundant,
}

impl WorkerState {
    pub fn can_install(&self) -> bool {
        matches!(self, WorkerState::Parsed | WorkerState::Redundant)
    }
}

/// Entries written by a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub static_entries: usize,
    pub image_entries: usize,
}

impl CacheManager {
    /// Populate the static and image namespaces.
    ///
    /// Each namespace is all-or-nothing: if any listed asset fails to fetch
    /// or answers with a non-2xx status, nothing is written to it and the
    /// install fails.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let names = self.ctx.names();
        let (static_entries, image_entries) = tokio::try_join!(
            self.install_namespace(&names.static_assets, self.ctx.static_manifest()),
            self.install_namespace(&names.images, self.ctx.image_manifest()),
        )?;

        Ok(InstallReport { static_entries, image_entries })
    }

    async fn install_namespace(&self, namespace: &str, paths: &[String]) -> Result<usize, Error> {
        let cache = self.cache.open_namespace(namespace).await?;

        let requests = paths
            .iter()
            .map(|path| self.ctx.resolve(path).map(Request::get))
            .collect::<Result<Vec<_>, _>>()?;

        let fetches = requests.into_iter().map(|request| async move {
            let response: Response = self.network.fetch(&request).await.map_err(|e| Error::InstallFailed {
                namespace: namespace.to_string(),
                reason: e.to_string(),
            })?;
            if !response.is_success() {
                return Err(Error::InstallFailed {
                    namespace: namespace.to_string(),
                    reason: format!("{} returned status {}", request.url, response.status),
                });
            }
            Ok((request, response))
        });

        let entries = try_join_all(fetches).await?;
        let written = cache.put_all(entries).await?;

        tracing::info!(namespace, entries = written, "cached install assets");
        Ok(written)
    }

    /// Delete every namespace that does not belong to the current version.
    ///
    /// Returns the deleted names.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        let names = self.ctx.names();
        let mut deleted = Vec::new();

        for name in self.cache.namespace_names().await? {
            if names.is_current(&name) {
                continue;
            }
            tracing::info!(namespace = %name, "deleting old cache");
            if self.cache.delete_namespace(&name).await? {
                deleted.push(name);
            }
        }

        Ok(deleted)
    }

    /// Delete the current version's namespaces.
    pub async fn teardown(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.ctx.names().all() {
            if self.cache.delete_namespace(name).await? {
                tracing::info!(namespace = name, "deleted cache");
                deleted.push(name.to_string());
            }
        }
        Ok(deleted)
    }
}
