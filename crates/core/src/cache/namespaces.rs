//! Named cache namespaces.
//!
//! A namespace is the unit of invalidation: entries never expire on their
//! own, a whole namespace is dropped when its name stops being current.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;

/// Handle to one named namespace inside a [`CacheDb`].
///
/// Obtained from [`CacheDb::open_namespace`]. Entry operations live in
/// `entries.rs`.
#[derive(Clone, Debug)]
pub struct Namespace {
    pub(crate) db: CacheDb,
    pub(crate) name: String,
}

impl Namespace {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CacheDb {
    /// Open a namespace, creating it if it does not exist yet.
    pub async fn open_namespace(&self, name: &str) -> Result<Namespace, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("namespace name cannot be empty".into()));
        }

        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_namespaces (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Namespace { db: self.clone(), name: name.to_string() })
    }

    /// Check whether a namespace exists.
    pub async fn has_namespace(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_namespaces WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List every namespace name, oldest first.
    pub async fn namespace_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_namespaces ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a namespace and all of its entries.
    ///
    /// Returns false if the namespace did not exist.
    pub async fn delete_namespace(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM cache_entries WHERE namespace = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM cache_namespaces WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_namespace() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.has_namespace("static-v1.1.0").await.unwrap());

        let ns = db.open_namespace("static-v1.1.0").await.unwrap();
        assert_eq!(ns.name(), "static-v1.1.0");
        assert!(db.has_namespace("static-v1.1.0").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_namespace("images-v1.1.0").await.unwrap();
        db.open_namespace("images-v1.1.0").await.unwrap();

        assert_eq!(db.namespace_names().await.unwrap(), vec!["images-v1.1.0".to_string()]);
    }

    #[tokio::test]
    async fn test_open_empty_name() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.open_namespace("  ").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_delete_namespace() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_namespace("static-v1.0.0").await.unwrap();
        db.open_namespace("static-v1.1.0").await.unwrap();

        assert!(db.delete_namespace("static-v1.0.0").await.unwrap());
        assert!(!db.delete_namespace("static-v1.0.0").await.unwrap());
        assert_eq!(db.namespace_names().await.unwrap(), vec!["static-v1.1.0".to_string()]);
    }
}
