//! Entry operations on a cache namespace.
//!
//! Keys are request identity (method + absolute URL). Values are full
//! response snapshots. Only `GET` requests are accepted.

use super::hash::compute_cache_key;
use super::namespaces::Namespace;
use crate::{Error, Request, Response};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response together with the request identity it answers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachedEntry {
    pub namespace: String,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub response: Response,
    pub stored_at: String,
}

fn ensure_cacheable(request: &Request) -> Result<(), Error> {
    if request.is_cacheable_method() {
        Ok(())
    } else {
        Err(Error::UnsupportedMethod(format!("{} {}", request.method, request.url)))
    }
}

fn encode_headers(headers: &[(String, String)]) -> Result<String, Error> {
    serde_json::to_string(headers).map_err(|e| Error::CorruptEntry(e.to_string()))
}

/// Writes never recreate a namespace deleted after the handle was opened.
fn ensure_namespace(conn: &rusqlite::Connection, namespace: &str) -> Result<(), Error> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM cache_namespaces WHERE name = ?1)",
        params![namespace],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(Error::CacheMiss(format!("namespace {namespace} no longer exists")))
    }
}

fn insert_entry(
    conn: &rusqlite::Connection, namespace: &str, method: &str, url: &str, response: &Response, stored_at: &str,
) -> Result<(), Error> {
    let key_hash = compute_cache_key(method, url);
    let headers_json = encode_headers(&response.headers)?;
    conn.execute(
        "INSERT INTO cache_entries (
            namespace, key_hash, method, url, status_code, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(namespace, key_hash) DO UPDATE SET
            status_code = excluded.status_code,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![namespace, key_hash, method, url, response.status as i64, headers_json, &response.body, stored_at],
    )?;
    Ok(())
}

impl Namespace {
    /// Look up the entry for a request.
    ///
    /// Non-GET requests never match.
    pub async fn match_request(&self, request: &Request) -> Result<Option<CachedEntry>, Error> {
        if !request.is_cacheable_method() {
            return Ok(None);
        }
        self.match_key(&compute_cache_key(&request.method, request.url.as_str()))
            .await
    }

    /// Look up an entry by its key hash.
    pub async fn match_key(&self, key_hash: &str) -> Result<Option<CachedEntry>, Error> {
        let namespace = self.name.clone();
        let key_hash = key_hash.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT namespace, key_hash, method, url, status_code, headers_json, body, stored_at
                     FROM cache_entries WHERE namespace = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![namespace, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Vec<u8>>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                });

                let (namespace, key_hash, method, url, status, headers_json, body, stored_at) = match result {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let headers: Vec<(String, String)> =
                    serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
                let status = u16::try_from(status).map_err(|e| Error::CorruptEntry(e.to_string()))?;

                Ok(Some(CachedEntry {
                    namespace,
                    key_hash,
                    method,
                    url,
                    response: Response { status, headers, body },
                    stored_at,
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response under the request's identity, replacing any
    /// previous entry.
    ///
    /// Fails with `CACHE_MISS` if the namespace was deleted since it was
    /// opened.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        ensure_cacheable(request)?;

        let namespace = self.name.clone();
        let method = request.method.clone();
        let url = request.url.to_string();
        let response = response.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_namespace(&tx, &namespace)?;
                insert_entry(&tx, &namespace, &method, &url, &response, &stored_at)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store several responses in one transaction: either every entry is
    /// written or none is.
    pub async fn put_all(&self, entries: Vec<(Request, Response)>) -> Result<usize, Error> {
        for (request, _) in &entries {
            ensure_cacheable(request)?;
        }

        let namespace = self.name.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();
        let rows: Vec<(String, String, Response)> = entries
            .into_iter()
            .map(|(req, resp)| (req.method, req.url.to_string(), resp))
            .collect();

        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                ensure_namespace(&tx, &namespace)?;
                for (method, url, response) in &rows {
                    insert_entry(&tx, &namespace, method, url, response, &stored_at)?;
                }
                tx.commit()?;
                Ok(rows.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry for a request. Returns false if there was none.
    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let namespace = self.name.clone();
        let key_hash = compute_cache_key(&request.method, request.url.as_str());
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE namespace = ?1 AND key_hash = ?2",
                    params![namespace, key_hash],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List the (method, url) identity of every entry, ordered by URL.
    pub async fn keys(&self) -> Result<Vec<(String, String)>, Error> {
        let namespace = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<(String, String)>, Error> {
                let mut stmt =
                    conn.prepare("SELECT method, url FROM cache_entries WHERE namespace = ?1 ORDER BY url ASC")?;
                let keys = stmt
                    .query_map(params![namespace], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
