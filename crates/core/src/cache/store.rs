//! Entry operations on a single named store.
//!
//! Provides exact-match lookup, put (upsert), and fetch-then-put (`add`).

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::http::{Fetch, Request, Response, ResponseType};
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Handle to one named store.
///
/// Cheap to clone; all handles share the same database connection.
#[derive(Clone, Debug)]
pub struct CacheStore {
    db: CacheDb,
    name: String,
}

/// Row shape as read back from the entries table.
struct EntryRow {
    status: i64,
    status_text: String,
    response_type: String,
    response_url: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn into_response(self) -> Result<Response, Error> {
        let headers: Vec<(String, String)> =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let status = u16::try_from(self.status).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let response_type: ResponseType = self.response_type.parse()?;

        Ok(Response::new(status, self.body)
            .with_status_text(self.status_text)
            .with_headers(headers)
            .with_type(response_type)
            .with_url(self.response_url))
    }
}

impl CacheStore {
    pub(crate) fn new(db: CacheDb, name: &str) -> Self {
        Self { db, name: name.to_string() }
    }

    /// Look up a request by exact method + URL match.
    ///
    /// Returns None if there is no entry for the request.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let store = self.name.clone();
        let key = compute_cache_key(&request.method, &request.url);
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, status_text, response_type, response_url, headers_json, body
                     FROM entries WHERE store_name = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store, key], |row| {
                    Ok(EntryRow {
                        status: row.get(0)?,
                        status_text: row.get(1)?,
                        response_type: row.get(2)?,
                        response_url: row.get(3)?,
                        headers_json: row.get(4)?,
                        body: row.get(5)?,
                    })
                });

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_response).transpose()
    }

    /// Write a response for a request, replacing any existing entry.
    ///
    /// Consumes the response body. Pass a [`Response::try_clone`] duplicate
    /// when the original still has to be returned to a caller.
    pub async fn put(&self, request: &Request, mut response: Response) -> Result<(), Error> {
        let body = response.bytes()?.to_vec();
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let store = self.name.clone();
        let key = compute_cache_key(&request.method, &request.url);
        let method = request.method.clone();
        let url = request.url.to_string();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        store_name, key_hash, method, url, status, status_text,
                        response_type, response_url, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    ON CONFLICT(store_name, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        response_type = excluded.response_type,
                        response_url = excluded.response_url,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        store,
                        key,
                        method,
                        url,
                        response.status as i64,
                        response.status_text,
                        response.response_type.as_str(),
                        response.url,
                        headers_json,
                        body,
                        stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Fetch a request from the network and store the result.
    ///
    /// Rejects without writing if the fetch fails or the response is not OK.
    pub async fn add<F>(&self, request: &Request, fetcher: &F) -> Result<(), Error>
    where
        F: Fetch + ?Sized,
    {
        let response = fetcher.fetch(request).await?;
        if !response.ok() {
            return Err(Error::HttpError(format!("{} responded with status {}", request.url, response.status)));
        }
        self.put(request, response).await
    }

    /// Number of entries in this store.
    #[cfg(test)]
    pub(crate) async fn len(&self) -> Result<u64, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store_name = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    fn request(path: &str) -> Request {
        Request::get(Url::parse("https://app.test").unwrap().join(path).unwrap())
    }

    struct FixedStatus {
        status: u16,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetch for FixedStatus {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Response::new(self.status, format!("body of {}", request.url.path())))
        }
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        let response = Response::new(200, "<html></html>")
            .with_status_text("OK")
            .with_header("Content-Type", "text/html")
            .with_url("https://app.test/index.html");

        store.put(&request("/index.html"), response).await.unwrap();

        let mut hit = store.match_request(&request("/index.html")).await.unwrap().unwrap();
        assert_eq!(hit.status, 200);
        assert_eq!(hit.status_text, "OK");
        assert_eq!(hit.header("content-type"), Some("text/html"));
        assert_eq!(hit.response_type, ResponseType::Basic);
        assert_eq!(hit.url, "https://app.test/index.html");
        assert_eq!(hit.text().unwrap(), "<html></html>");
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        assert!(store.match_request(&request("/missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_is_method_exact() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        store.put(&request("/api"), Response::new(200, "x")).await.unwrap();

        let post = Request::new("POST", request("/api").url);
        assert!(store.match_request(&post).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let v1 = db.open_store("v1").await.unwrap();
        let v2 = db.open_store("v2").await.unwrap();
        v1.put(&request("/"), Response::new(200, "v1")).await.unwrap();

        assert!(v2.match_request(&request("/")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_existing_key() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        store.put(&request("/app.js"), Response::new(200, "old")).await.unwrap();
        store.put(&request("/app.js"), Response::new(200, "new")).await.unwrap();

        assert_eq!(store.len().await.unwrap(), 1);
        let mut hit = store.match_request(&request("/app.js")).await.unwrap().unwrap();
        assert_eq!(hit.text().unwrap(), "new");
    }

    #[tokio::test]
    async fn test_put_consumed_body_fails() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        let mut response = Response::new(200, "gone");
        response.bytes().unwrap();

        let result = store.put(&request("/x"), response).await;
        assert!(matches!(result, Err(Error::BodyUsed)));
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_stores_ok_response() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        let fetcher = FixedStatus { status: 200, calls: AtomicUsize::new(0) };

        store.add(&request("/index.html"), &fetcher).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(store.match_request(&request("/index.html")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_add_rejects_non_ok() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        let fetcher = FixedStatus { status: 404, calls: AtomicUsize::new(0) };

        let result = store.add(&request("/missing.html"), &fetcher).await;
        assert!(matches!(result, Err(Error::HttpError(_))));
        assert_eq!(store.len().await.unwrap(), 0);
    }
}
