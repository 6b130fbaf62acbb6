//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the outbound request: same method, headers and body stream
//! - Issue it once, with the client's default timeouts
//! - Hand the upstream response back without buffering its body
//!
//! # Design Decisions
//! - `Host` is the only inbound header not copied; the client derives it
//!   from the upstream authority
//! - No retries: a request body is a stream and is consumed by the first attempt

use axum::{
    body::Body,
    http::{header, uri::InvalidUri, Request, Response, Uri},
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::http::response::relay_body;
use crate::routing::UpstreamTarget;

/// HTTP(S) client used for upstream calls.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Failures while forwarding a request.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// TLS setup for the upstream client failed.
    #[error("failed to configure TLS: {0}")]
    Tls(#[from] rustls::Error),

    /// Target URI could not be built.
    #[error("invalid upstream uri: {0}")]
    InvalidUri(#[from] InvalidUri),

    /// Outbound request could not be assembled.
    #[error("failed to create upstream request: {0}")]
    RequestConstruction(#[from] axum::http::Error),

    /// Network failure talking to upstream.
    #[error("upstream request failed: {0}")]
    UpstreamUnreachable(#[source] hyper_util::client::legacy::Error),
}

/// Sends validated requests to the upstream API.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    base_url: String,
}

impl Forwarder {
    /// Build a forwarder for the configured upstream origin.
    pub fn new(config: &UpstreamConfig) -> Result<Self, ForwardError> {
        let connector = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Upstream origin, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URI for `target` on the upstream origin.
    pub fn target_uri(&self, target: &UpstreamTarget) -> Result<Uri, ForwardError> {
        Ok(format!("{}{}", self.base_url, target.path_and_query()).parse()?)
    }

    /// Forward `request` to `target` and return the upstream response with a streaming body.
    pub async fn forward(
        &self,
        request: Request<Body>,
        target: &UpstreamTarget,
    ) -> Result<Response<Body>, ForwardError> {
        let outbound = self.build_request(request, target)?;

        let response = self
            .client
            .request(outbound)
            .await
            .map_err(ForwardError::UpstreamUnreachable)?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(
            parts,
            relay_body(body, target.redacted_path()),
        ))
    }

    fn build_request(
        &self,
        request: Request<Body>,
        target: &UpstreamTarget,
    ) -> Result<Request<Body>, ForwardError> {
        let uri = self.target_uri(target)?;
        let (parts, body) = request.into_parts();

        let mut headers = parts.headers;
        headers.remove(header::HOST);

        let mut outbound = Request::builder().method(parts.method).uri(uri).body(body)?;
        *outbound.headers_mut() = headers;
        Ok(outbound)
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecretKey;
    use crate::routing::Router;
    use axum::http::Method;

    fn forwarder(base_url: &str) -> Forwarder {
        Forwarder::new(&UpstreamConfig {
            base_url: base_url.to_string(),
        })
        .unwrap()
    }

    fn target(path: &str, query: Option<&str>) -> UpstreamTarget {
        Router::new(SecretKey::new("abc"))
            .authorize(path, query)
            .unwrap()
    }

    #[test]
    fn target_uri_joins_origin_and_path() {
        let fwd = forwarder("https://api.telegram.org/");
        assert_eq!(fwd.base_url(), "https://api.telegram.org");

        let uri = fwd
            .target_uri(&target("/botabc_TOKEN123/getMe", None))
            .unwrap();
        assert_eq!(uri.to_string(), "https://api.telegram.org/botTOKEN123/getMe");
    }

    #[test]
    fn malformed_base_fails_construction() {
        let fwd = forwarder("http://exa mple.com");
        let err = fwd.target_uri(&target("/botabc_T1", None)).unwrap_err();
        assert!(matches!(err, ForwardError::InvalidUri(_)));
    }

    #[test]
    fn outbound_request_copies_everything_but_host() {
        let fwd = forwarder("http://127.0.0.1:9");
        let request = Request::builder()
            .method(Method::POST)
            .uri("/botabc_T1?offset=5")
            .header("host", "proxy.local")
            .header("x-multi", "one")
            .header("x-multi", "two")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let outbound = fwd
            .build_request(request, &target("/botabc_T1", Some("offset=5")))
            .unwrap();

        assert_eq!(outbound.method(), Method::POST);
        assert_eq!(outbound.uri(), "http://127.0.0.1:9/botT1?offset=5");
        assert!(outbound.headers().get(header::HOST).is_none());
        let multi: Vec<&str> = outbound
            .headers()
            .get_all("x-multi")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(multi, ["one", "two"]);
        assert_eq!(outbound.headers()["content-type"], "application/json");
    }
}
