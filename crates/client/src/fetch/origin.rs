//! Response tainting relative to the application origin.
//!
//! Mirrors what a page can observe about a response it asked for:
//! same-origin responses are `basic`, cross-origin responses approved by
//! `Access-Control-Allow-Origin` are `cors`, and cross-origin `no-cors`
//! responses are `opaque`. A cross-origin response that fails its CORS check
//! is a network error.

use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, HeaderMap};
use swcache_core::{Error, Request, RequestMode, ResponseType};
use url::Url;

/// Classify a response to `request` that ended up at `final_url`.
///
/// # Errors
///
/// Returns `Error::Network` for cross-origin `cors` responses without a
/// matching `Access-Control-Allow-Origin`, and for cross-origin responses to
/// `same-origin` requests.
pub fn classify(
    app_origin: &Url,
    request: &Request,
    final_url: &Url,
    headers: &HeaderMap,
) -> Result<ResponseType, Error> {
    if final_url.origin() == app_origin.origin() {
        return Ok(ResponseType::Basic);
    }

    match request.mode {
        RequestMode::Navigate => Ok(ResponseType::Basic),
        RequestMode::NoCors => Ok(ResponseType::Opaque),
        RequestMode::SameOrigin => {
            Err(Error::Network(format!("{final_url}: cross-origin response to a same-origin request")))
        }
        RequestMode::Cors => {
            let allowed = headers
                .get(ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .is_some_and(|v| v == "*" || v == app_origin.origin().ascii_serialization());
            if allowed {
                Ok(ResponseType::Cors)
            } else {
                Err(Error::Network(format!("{final_url}: CORS check failed")))
            }
        }
    }
}
