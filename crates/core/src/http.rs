//! Request/response model shared by the cache, the worker and the network client.
//!
//! Response bodies are single-consume: once read they are gone. Anything that
//! both returns a response and stores it must duplicate it first with
//! [`Response::try_clone`].

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// How a request was initiated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

/// Interaction with intermediate HTTP caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    #[default]
    Default,
    /// Bypass any intermediate cache and go to the origin.
    Reload,
}

/// An outgoing resource request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub cache: CacheMode,
}

impl Request {
    /// Create a request with the given method. The method is uppercased.
    pub fn new(method: &str, url: Url) -> Self {
        Self { method: method.to_ascii_uppercase(), url, mode: RequestMode::default(), cache: CacheMode::default() }
    }

    /// Create a plain GET request.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Create a GET request for a top-level document load.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_mode(RequestMode::Navigate)
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// Response tainting, as seen by the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    #[default]
    Basic,
    /// Cross-origin response approved by CORS.
    Cors,
    /// Cross-origin response whose status and body cannot be inspected.
    Opaque,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
        }
    }

    /// Whether the status and body of this response can be verified.
    pub fn is_verifiable(&self) -> bool {
        matches!(self, ResponseType::Basic | ResponseType::Cors)
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ResponseType::Basic),
            "cors" => Ok(ResponseType::Cors),
            "opaque" => Ok(ResponseType::Opaque),
            other => Err(Error::CorruptEntry(format!("unknown response type: {other}"))),
        }
    }
}

/// A single-consume response body.
#[derive(Debug)]
pub struct Body {
    bytes: Option<Bytes>,
}

impl Body {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self { bytes: Some(bytes.into()) }
    }

    #[cfg(test)]
    pub(crate) fn is_used(&self) -> bool {
        self.bytes.is_none()
    }

    /// Consume the body.
    pub fn take(&mut self) -> Result<Bytes, Error> {
        self.bytes.take().ok_or(Error::BodyUsed)
    }

    fn try_clone(&self) -> Result<Self, Error> {
        self.bytes.clone().map(|bytes| Self { bytes: Some(bytes) }).ok_or(Error::BodyUsed)
    }
}

/// A response snapshot: status, headers, tainting and a single-consume body.
///
/// Deliberately not `Clone`; use [`Response::try_clone`].
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub response_type: ResponseType,
    pub url: String,
    body: Body,
}

impl Response {
    /// Create a basic response with the given status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: Vec::new(),
            response_type: ResponseType::Basic,
            url: String::new(),
            body: Body::new(body),
        }
    }

    /// An opaque-filtered response: status 0, no headers, empty body.
    pub fn opaque(url: impl Into<String>) -> Self {
        Self { response_type: ResponseType::Opaque, url: url.into(), ..Self::new(0, Bytes::new()) }
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into().to_ascii_lowercase(), value.into()));
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Whether the status is in the 200-299 range.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[cfg(test)]
    pub(crate) fn body_used(&self) -> bool {
        self.body.is_used()
    }

    /// Consume the body as bytes.
    pub fn bytes(&mut self) -> Result<Bytes, Error> {
        self.body.take()
    }

    /// Consume the body as (lossy) UTF-8 text.
    pub fn text(&mut self) -> Result<String, Error> {
        let bytes = self.bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Duplicate into an independently consumable response.
    ///
    /// Fails with [`Error::BodyUsed`] if the body was already read.
    pub fn try_clone(&self) -> Result<Self, Error> {
        Ok(Self {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            response_type: self.response_type,
            url: self.url.clone(),
            body: self.body.try_clone()?,
        })
    }
}

/// Network collaborator.
///
/// Transport failures are errors; HTTP error statuses are not, they come back
/// as non-OK responses.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
