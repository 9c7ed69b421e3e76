//! Request interception: cache-first with network refill.

use schemars::JsonSchema;
use serde::Serialize;

use super::{CacheWorker, Host};
use crate::cache::CacheStore;
use crate::http::{Fetch, Request, Response};
use crate::Error;

/// Where a produced response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Cache,
    Network,
    OfflineFallback,
}

/// What the worker decided for an intercepted request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs the request itself.
    Passthrough,
    /// Respond with this response.
    Respond { response: Response, source: ResponseSource },
    /// Intercepted but nothing to respond with; the host's network-error
    /// behaviour applies.
    NoResponse,
}

#[cfg(test)]
impl FetchOutcome {
    pub(crate) fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Respond { response, .. } => Some(response),
            _ => None,
        }
    }

    pub(crate) fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Respond { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// Which guard applies before writing a network response to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refill {
    /// Top-level documents: any OK response.
    Navigation,
    /// Subresources: OK and same-origin or CORS-approved. Opaque responses
    /// can't be verified and are never written.
    Asset,
}

impl Refill {
    fn for_request(request: &Request) -> Self {
        if request.is_navigation() { Refill::Navigation } else { Refill::Asset }
    }

    fn label(self) -> &'static str {
        match self {
            Refill::Navigation => "navigate",
            Refill::Asset => "asset",
        }
    }

    fn should_store(self, response: &Response) -> bool {
        match self {
            Refill::Navigation => response.ok(),
            Refill::Asset => response.ok() && response.response_type.is_verifiable(),
        }
    }
}

impl<F: Fetch, H: Host> CacheWorker<F, H> {
    /// Decide how to answer an intercepted request.
    ///
    /// Non-GET requests pass through untouched. GET requests are looked up in
    /// the current store first; on a miss the network is consulted and an
    /// acceptable response is duplicated into the store before the original
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the current store cannot be opened or read.
    /// Network failures are logged and produce [`FetchOutcome::NoResponse`].
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if !request.is_get() {
            tracing::debug!(method = %request.method, url = %request.url, "fetch: passing through non-GET request");
            return Ok(FetchOutcome::Passthrough);
        }

        let refill = Refill::for_request(request);
        let store = self.current_store().await?;

        if let Some(response) = store.match_request(request).await? {
            tracing::debug!(url = %request.url, kind = refill.label(), "fetch: serving from cache");
            return Ok(FetchOutcome::Respond { response, source: ResponseSource::Cache });
        }

        tracing::debug!(url = %request.url, kind = refill.label(), "fetch: not cached, fetching from network");
        let response = match self.fetcher.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %request.url, kind = refill.label(), error = %e, "fetch: network request failed");
                return self.offline_fallback(&store, refill).await;
            }
        };

        if refill.should_store(&response) {
            let copy = response.try_clone()?;
            if let Err(e) = store.put(request, copy).await {
                tracing::warn!(url = %request.url, error = %e, "fetch: failed to store network response");
            }
        } else {
            tracing::debug!(
                url = %request.url,
                status = response.status,
                response_type = %response.response_type,
                "fetch: network response not cacheable"
            );
        }

        Ok(FetchOutcome::Respond { response, source: ResponseSource::Network })
    }

    async fn offline_fallback(&self, store: &CacheStore, refill: Refill) -> Result<FetchOutcome, Error> {
        let Some(page) = self.config.offline_page.as_ref().filter(|_| refill == Refill::Navigation) else {
            return Ok(FetchOutcome::NoResponse);
        };

        match store.match_request(&Request::get(page.clone())).await? {
            Some(response) => {
                tracing::info!(page = %page, "fetch: serving offline fallback");
                Ok(FetchOutcome::Respond { response, source: ResponseSource::OfflineFallback })
            }
            None => {
                tracing::warn!(page = %page, "fetch: offline fallback is not cached");
                Ok(FetchOutcome::NoResponse)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{StubNetwork, config, url, worker};
    use super::*;
    use crate::http::{RequestMode, ResponseType};

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let worker = worker(StubNetwork::new().reply("/index.html", 200, "fresh"), config("v1", &[])).await;
        let store = worker.current_store().await.unwrap();
        store
            .put(&Request::get(url("/index.html")), Response::new(200, "cached"))
            .await
            .unwrap();

        let outcome = worker.handle_fetch(&Request::get(url("/index.html"))).await.unwrap();

        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        let FetchOutcome::Respond { mut response, .. } = outcome else { panic!("expected a response") };
        assert_eq!(response.text().unwrap(), "cached");
        assert_eq!(worker.fetcher().call_count(), 0);
    }

    #[tokio::test]
    async fn test_navigation_cache_hit_skips_network() {
        let worker = worker(StubNetwork::new(), config("v1", &[])).await;
        let store = worker.current_store().await.unwrap();
        store.put(&Request::get(url("/")), Response::new(200, "shell")).await.unwrap();

        let outcome = worker.handle_fetch(&Request::navigate(url("/"))).await.unwrap();

        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(worker.fetcher().call_count(), 0);
    }

    #[tokio::test]
    async fn test_asset_miss_fills_cache() {
        let worker = worker(StubNetwork::new().reply("/app.js", 200, "console.log(1)"), config("v1", &[])).await;
        let request = Request::get(url("/app.js"));

        let outcome = worker.handle_fetch(&request).await.unwrap();
        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        let FetchOutcome::Respond { mut response, .. } = outcome else { panic!("expected a response") };
        assert_eq!(response.text().unwrap(), "console.log(1)");

        let store = worker.current_store().await.unwrap();
        let mut stored = store.match_request(&request).await.unwrap().unwrap();
        assert_eq!(stored.status, 200);
        assert_eq!(stored.text().unwrap(), "console.log(1)");

        let second = worker.handle_fetch(&request).await.unwrap();
        assert_eq!(second.source(), Some(ResponseSource::Cache));
        assert_eq!(worker.fetcher().call_count(), 1);
    }

    #[tokio::test]
    async fn test_cors_asset_is_stored() {
        let network = StubNetwork::new().reply_typed("https://cdn.test/lib.js", 200, "lib", ResponseType::Cors);
        let worker = worker(network, config("v1", &[])).await;
        let request = Request::get(url("https://cdn.test/lib.js")).with_mode(RequestMode::Cors);

        worker.handle_fetch(&request).await.unwrap();

        let store = worker.current_store().await.unwrap();
        assert!(store.match_request(&request).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_opaque_asset_is_returned_not_stored() {
        let worker = worker(StubNetwork::new().opaque("https://cdn.test/photo.jpg"), config("v1", &[])).await;
        let request = Request::get(url("https://cdn.test/photo.jpg"));

        let outcome = worker.handle_fetch(&request).await.unwrap();

        let response = outcome.response().unwrap();
        assert_eq!(response.response_type, ResponseType::Opaque);
        let store = worker.current_store().await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ok_opaque_asset_is_not_stored() {
        let network = StubNetwork::new().reply_typed("https://cdn.test/font.woff2", 200, "font", ResponseType::Opaque);
        let worker = worker(network, config("v1", &[])).await;
        let request = Request::get(url("https://cdn.test/font.woff2"));

        let outcome = worker.handle_fetch(&request).await.unwrap();

        let response = outcome.response().unwrap();
        assert!(response.ok());
        assert_eq!(response.response_type, ResponseType::Opaque);
        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        let store = worker.current_store().await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_navigation_error_status_is_returned_not_stored() {
        let worker = worker(StubNetwork::new().reply("/gone", 500, "server error"), config("v1", &[])).await;
        let request = Request::navigate(url("/gone"));

        let outcome = worker.handle_fetch(&request).await.unwrap();

        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        assert_eq!(outcome.response().unwrap().status, 500);
        let store = worker.current_store().await.unwrap();
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_asset_error_status_is_returned_not_stored() {
        let worker = worker(StubNetwork::new().reply("/missing.png", 404, "nope"), config("v1", &[])).await;
        let request = Request::get(url("/missing.png"));

        let outcome = worker.handle_fetch(&request).await.unwrap();

        assert_eq!(outcome.response().unwrap().status, 404);
        let store = worker.current_store().await.unwrap();
        assert!(store.match_request(&request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_navigation_miss_fills_cache() {
        let worker = worker(StubNetwork::new().reply("/about", 200, "about"), config("v1", &[])).await;
        let request = Request::navigate(url("/about"));

        let outcome = worker.handle_fetch(&request).await.unwrap();
        assert_eq!(outcome.source(), Some(ResponseSource::Network));

        let store = worker.current_store().await.unwrap();
        assert!(store.match_request(&request).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_navigation_guard_ignores_response_type() {
        let network = StubNetwork::new().reply_typed("/cross", 200, "page", ResponseType::Cors);
        let worker = worker(network, config("v1", &[])).await;
        let request = Request::navigate(url("/cross"));

        worker.handle_fetch(&request).await.unwrap();

        let store = worker.current_store().await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let worker = worker(StubNetwork::new().reply("/api/save", 200, "ok"), config("v1", &[])).await;
        let request = Request::new("POST", url("/api/save"));

        let outcome = worker.handle_fetch(&request).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::Passthrough));
        assert_eq!(worker.fetcher().call_count(), 0);
        assert!(worker.db().store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_navigation_network_failure_produces_no_response() {
        let worker = worker(StubNetwork::new().fail("/offline"), config("v1", &[])).await;

        let outcome = worker.handle_fetch(&Request::navigate(url("/offline"))).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::NoResponse));
        assert_eq!(worker.fetcher().call_count(), 1);
    }

    #[tokio::test]
    async fn test_asset_network_failure_produces_no_response() {
        let worker = worker(StubNetwork::new(), config("v1", &[])).await;

        let outcome = worker.handle_fetch(&Request::get(url("/style.css"))).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::NoResponse));
    }

    #[tokio::test]
    async fn test_offline_fallback_serves_cached_page() {
        let mut config = config("v1", &[]);
        config.offline_page = Some(url("/offline.html"));
        let worker = worker(StubNetwork::new(), config).await;
        let store = worker.current_store().await.unwrap();
        store
            .put(&Request::get(url("/offline.html")), Response::new(200, "you are offline"))
            .await
            .unwrap();

        let outcome = worker.handle_fetch(&Request::navigate(url("/dashboard"))).await.unwrap();

        assert_eq!(outcome.source(), Some(ResponseSource::OfflineFallback));
        let FetchOutcome::Respond { mut response, .. } = outcome else { panic!("expected a response") };
        assert_eq!(response.text().unwrap(), "you are offline");
    }

    #[tokio::test]
    async fn test_offline_fallback_not_used_for_assets() {
        let mut config = config("v1", &[]);
        config.offline_page = Some(url("/offline.html"));
        let worker = worker(StubNetwork::new(), config).await;
        let store = worker.current_store().await.unwrap();
        store
            .put(&Request::get(url("/offline.html")), Response::new(200, "you are offline"))
            .await
            .unwrap();

        let outcome = worker.handle_fetch(&Request::get(url("/app.js"))).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::NoResponse));
    }

    #[tokio::test]
    async fn test_offline_fallback_missing_page() {
        let mut config = config("v1", &[]);
        config.offline_page = Some(url("/offline.html"));
        let worker = worker(StubNetwork::new(), config).await;

        let outcome = worker.handle_fetch(&Request::navigate(url("/dashboard"))).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::NoResponse));
    }

    #[tokio::test]
    async fn test_seeded_page_served_after_install() {
        let network = StubNetwork::new().reply("/", 200, "root").reply("/index.html", 200, "index");
        let worker = worker(network, config("v1", &["/", "/index.html"])).await;
        worker.install().await.unwrap();

        let outcome = worker.handle_fetch(&Request::navigate(url("/index.html"))).await.unwrap();

        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(worker.fetcher().call_count(), 2);
    }
}
