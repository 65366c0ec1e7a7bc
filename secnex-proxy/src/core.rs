//! Proxy Core (§4.5): target URL construction, outbound request rewriting,
//! execution, and the mandatory 502→404 response remap.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use secnex_core::error::GatewayError;
use secnex_core::route::Route;
use std::time::Duration;
use tracing::info;

/// Everything the Proxy Core needs from the inbound request. Carries no
/// reference to the original request type, so callers stay free to use
/// whichever web framework they like.
pub struct InboundRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub raw_query: String,
    pub remote_addr: String,
}

/// What gets written back to the caller.
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct ProxyCore {
    client: reqwest::Client,
}

impl ProxyCore {
    pub fn new(upstream_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(upstream_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Construct the upstream target URL: `route.url`'s path right-trimmed
    /// of trailing slashes, `"/" + remaining` appended, inbound raw query
    /// carried over verbatim (§4.5, §8 path composition property).
    pub fn construct_target_url(
        route_url: &str,
        remaining: &str,
        raw_query: &str,
    ) -> Result<reqwest::Url, GatewayError> {
        let mut target = reqwest::Url::parse(route_url)
            .map_err(|e| GatewayError::Internal(format!("invalid route url: {e}")))?;
        let trimmed = target.path().trim_end_matches('/');
        target.set_path(&format!("{trimmed}/{remaining}"));
        target.set_query(if raw_query.is_empty() {
            None
        } else {
            Some(raw_query)
        });
        Ok(target)
    }

    /// Rewrite, execute, and remap the response for a single proxied
    /// request (§4.5).
    pub async fn forward(
        &self,
        route: &Route,
        remaining: &str,
        inbound: InboundRequest,
    ) -> Result<ProxiedResponse, GatewayError> {
        let target = Self::construct_target_url(&route.url, remaining, &inbound.raw_query)?;

        let mut headers = inbound.headers;
        headers.insert(
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_str(&inbound.remote_addr)
                .unwrap_or_else(|_| HeaderValue::from_static("")),
        );

        let response = self
            .client
            .request(inbound.method, target)
            .headers(headers)
            .body(inbound.body)
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        let mut status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        // The single mandatory transform (§4.5, §8 status remap property).
        if status == StatusCode::BAD_GATEWAY {
            status = StatusCode::NOT_FOUND;
        }

        log_title(&body);

        Ok(ProxiedResponse {
            status,
            headers,
            body,
        })
    }
}

/// Best-effort, non-fatal observability side-effect (§4.5): find the first
/// `<title>...</title>` in the response body and log it.
fn log_title(body: &[u8]) {
    let Ok(text) = std::str::from_utf8(body) else {
        return;
    };
    let Some(start) = text.find("<title>") else {
        return;
    };
    let after_open = start + "<title>".len();
    let Some(close_offset) = text[after_open..].find("</title>") else {
        return;
    };
    let title = &text[after_open..after_open + close_offset];
    info!(title, "Page title");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_url_trims_trailing_slash_and_appends_remaining() {
        let url = ProxyCore::construct_target_url("http://upstream:3000/", "events", "x=1").unwrap();
        assert_eq!(url.as_str(), "http://upstream:3000/events?x=1");
    }

    #[test]
    fn target_url_preserves_host_and_scheme() {
        let url = ProxyCore::construct_target_url("https://upstream.internal", "a/b", "").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("upstream.internal"));
        assert_eq!(url.path(), "/a/b");
    }

    #[test]
    fn empty_remaining_still_anchors_at_the_route_path() {
        let url = ProxyCore::construct_target_url("http://upstream:3000", "", "").unwrap();
        assert_eq!(url.path(), "/");
    }

    #[test]
    fn query_string_is_carried_over_verbatim() {
        let url =
            ProxyCore::construct_target_url("http://upstream:3000", "events", "x=1&y=2").unwrap();
        assert_eq!(url.query(), Some("x=1&y=2"));
    }

    #[test]
    fn log_title_does_not_panic_on_non_utf8_or_missing_tags() {
        log_title(&[0xff, 0xfe, 0xfd]);
        log_title(b"<html><body>no title here</body></html>");
    }
}
