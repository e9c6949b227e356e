//! Named caches of request/response pairs.
//!
//! Mirrors the browser Cache Storage surface: a set of caches addressed by
//! name, each mapping request URLs to stored responses. Every call is one
//! statement on the shared connection, so individual operations are
//! serialized but a lookup followed by a store is not atomic.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::http::{Request, Response};

/// Metadata for one stored entry.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryInfo {
    pub cache: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub size: usize,
    pub stored_at: String,
}

/// Handle to one named cache.
///
/// The handle stays usable after its cache is deleted, but writes through
/// it are dropped and reads miss.
#[derive(Clone, Debug)]
pub struct NamedCache {
    db: CacheDb,
    name: String,
}

fn decode_headers(json: &str) -> Result<BTreeMap<String, String>, Error> {
    serde_json::from_str(json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))
}

fn decode_response(status: u16, headers_json: &str, body: Vec<u8>) -> Result<Response, Error> {
    Ok(Response { status, headers: decode_headers(headers_json)?, body: Bytes::from(body) })
}

impl CacheDb {
    /// Open a cache by name, creating it if it does not exist.
    pub async fn open_cache(&self, name: &str) -> Result<NamedCache, Error> {
        let cache_name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![cache_name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(NamedCache { db: self.clone(), name: name.to_string() })
    }

    /// Names of every cache, in creation order.
    pub async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY id")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a cache and all of its entries.
    ///
    /// Returns false if no cache had that name.
    pub async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Look a request up across every cache; the oldest cache wins.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = compute_cache_key(request.url.as_str());
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let result = conn.query_row(
                    "SELECT e.status, e.headers_json, e.body
                     FROM entries e JOIN caches c ON c.id = e.cache_id
                     WHERE e.key = ?1
                     ORDER BY c.id LIMIT 1",
                    params![key],
                    |row| Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                );

                match result {
                    Ok((status, headers, body)) => decode_response(status, &headers, body).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Metadata for every entry stored under `url`, across caches.
    pub async fn find_entries(&self, url: &str) -> Result<Vec<EntryInfo>, Error> {
        let key = compute_cache_key(url);
        self.conn
            .call(move |conn| -> Result<Vec<EntryInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT c.name, e.url, e.status, e.headers_json, length(e.body), e.stored_at
                     FROM entries e JOIN caches c ON c.id = e.cache_id
                     WHERE e.key = ?1
                     ORDER BY c.id",
                )?;
                let rows = stmt
                    .query_map(params![key], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, u16>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, i64>(4)?,
                            row.get::<_, String>(5)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(cache, url, status, headers_json, size, stored_at)| {
                        let headers = decode_headers(&headers_json)?;
                        Ok(EntryInfo {
                            cache,
                            url,
                            status,
                            content_type: headers.get("content-type").cloned(),
                            size: size as usize,
                            stored_at,
                        })
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }
}

impl NamedCache {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a stored response for the request URL.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let name = self.name.clone();
        let key = compute_cache_key(request.url.as_str());
        self.db
            .conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let result = conn.query_row(
                    "SELECT e.status, e.headers_json, e.body
                     FROM entries e JOIN caches c ON c.id = e.cache_id
                     WHERE c.name = ?1 AND e.key = ?2",
                    params![name, key],
                    |row| Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                );

                match result {
                    Ok((status, headers, body)) => decode_response(status, &headers, body).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response, replacing any previous entry for the URL.
    ///
    /// Only GET requests can be stored. Returns false when the cache has
    /// been deleted since this handle was opened.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<bool, Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!("cannot cache {} request", request.method)));
        }

        let name = self.name.clone();
        let url = request.url.to_string();
        let key = compute_cache_key(&url);
        let status = response.status;
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
        let body = response.body.to_vec();
        let now = chrono::Utc::now().to_rfc3339();

        let stored = self
            .db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let cache_id = match conn.query_row("SELECT id FROM caches WHERE name = ?1", params![name], |row| {
                    row.get::<_, i64>(0)
                }) {
                    Ok(id) => id,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(false),
                    Err(e) => return Err(e.into()),
                };

                conn.execute(
                    "INSERT INTO entries (cache_id, key, url, status, headers_json, body, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(cache_id, key) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![cache_id, key, url, status, headers_json, body, now],
                )?;
                Ok(true)
            })
            .await
            .map_err(Error::from)?;

        if !stored {
            tracing::debug!("cache {} was deleted; dropped write for {}", self.name, request.url);
        }

        Ok(stored)
    }

    /// Remove the entry for the request URL. Returns false if none existed.
    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let name = self.name.clone();
        let key = compute_cache_key(request.url.as_str());
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM entries WHERE key = ?1
                     AND cache_id = (SELECT id FROM caches WHERE name = ?2)",
                    params![key, name],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// URLs of stored entries, oldest first.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.url FROM entries e JOIN caches c ON c.id = e.cache_id
                     WHERE c.name = ?1 ORDER BY e.rowid",
                )?;
                let urls = stmt
                    .query_map(params![name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn len(&self) -> Result<usize, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries e JOIN caches c ON c.id = e.cache_id WHERE c.name = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }
}
