//! HTTP fetch pipeline backing the cache worker.
//!
//! ### Cache bypass
//! - `CacheMode::Reload` sends `Cache-Control: no-cache` and `Pragma: no-cache`
//!
//! ### Response handling
//! - HTTP error statuses are responses, not errors
//! - Transport failures map to `Error::Network`
//! - Max body bytes: 5MB (configurable); not applied to opaque responses
//! - Responses are classified basic / cors / opaque against the app origin;
//!   opaque responses are filtered to status 0 with no headers or body

pub mod origin;
pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};
use swcache_core::{AppConfig, CacheMode, Error, Fetch, Request, RequestMode, Response, ResponseType};

pub use origin::classify;
pub use url::{UrlError, resolve};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Origin of the application; decides response tainting.
    pub origin: ::url::Url,

    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl FetchConfig {
    /// Defaults for everything but the origin.
    pub fn new(origin: ::url::Url) -> Self {
        Self {
            origin,
            user_agent: "swcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }

    /// Build from the loaded application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Self::new(origin)
        })
    }
}

/// HTTP fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn is_cross_origin(&self, request: &Request) -> bool {
        request.url.origin() != self.config.origin.origin()
    }
}

fn header_pairs(headers: &header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

#[async_trait]
impl Fetch for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, request.url.clone());

        if request.cache == CacheMode::Reload {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }
        if request.mode == RequestMode::Navigate {
            builder = builder.header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8");
        }
        if request.mode == RequestMode::Cors && self.is_cross_origin(request) {
            builder = builder.header(header::ORIGIN, self.config.origin.origin().ascii_serialization());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("{}: {}", request.url, e)))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let response_type = classify(&self.config.origin, request, &final_url, &headers)?;

        // Opaque bodies are discarded, so the size cap does not apply to them.
        if response_type == ResponseType::Opaque {
            tracing::debug!(
                "fetched {} {} -> {} (opaque) in {}ms",
                request.method,
                request.url,
                final_url,
                start.elapsed().as_millis()
            );
            return Ok(Response::opaque(final_url.as_str()));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response from {}: {}", final_url, e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} {} -> {} ({}, {}) in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            response_type,
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(Response::new(status.as_u16(), bytes)
            .with_status_text(status.canonical_reason().unwrap_or_default())
            .with_headers(header_pairs(&headers))
            .with_type(response_type)
            .with_url(final_url.as_str()))
    }
}
