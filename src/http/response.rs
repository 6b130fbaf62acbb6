//! Response handling.
//!
//! # Responsibilities
//! - Relay upstream bodies as streams, logging mid-stream failures
//! - Map forwarding errors to the two conventional error responses
//! - Answer rejected requests with no response at all
//!
//! # Design Decisions
//! - Upstream status and headers are passed through untouched
//! - Once the status line is out, a body error can only truncate the response

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use hyper::body::Incoming;

use crate::http::forward::ForwardError;
use crate::net::ConnectionControl;

/// Body sent with a 500 when the outbound request cannot be built.
pub const INTERNAL_ERROR_BODY: &str = "Internal server error";

/// Body sent with a 502 when upstream cannot be reached.
pub const BAD_GATEWAY_BODY: &str = "Bad Gateway";

/// Wrap an upstream body so that read errors are logged before they cut the stream.
pub fn relay_body(body: Incoming, route: String) -> Body {
    Body::new(body.map_err(move |err| {
        tracing::error!(path = %route, error = %err, "Error copying response body");
        err
    }))
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        match self {
            ForwardError::UpstreamUnreachable(_) => {
                (StatusCode::BAD_GATEWAY, BAD_GATEWAY_BODY).into_response()
            }
            ForwardError::Tls(_)
            | ForwardError::InvalidUri(_)
            | ForwardError::RequestConstruction(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
            }
        }
    }
}

/// Close the client connection without writing a byte.
///
/// With a [`ConnectionControl`] the owning connection task is told to drop the
/// socket and this future never completes, so no response can reach the wire.
/// Without one the connection cannot be taken over and an empty `200 OK` is
/// returned instead.
pub async fn drop_connection(control: Option<ConnectionControl>) -> Response {
    match control {
        Some(control) => {
            tracing::trace!(connection_id = %control.id(), "Dropping connection");
            control.abort();
            std::future::pending().await
        }
        None => StatusCode::OK.into_response(),
    }
}
