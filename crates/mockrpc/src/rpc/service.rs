//! hyper request handling for the JSON-RPC endpoint.

use super::codec::process_payload;
use crate::dispatch::Dispatcher;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{ALLOW, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error};

/// Handle one HTTP request. Any path is accepted; only `POST` carries calls.
pub async fn handle_rpc_request(
    req: Request<Incoming>,
    dispatcher: Arc<Dispatcher>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    if req.method() != Method::POST {
        return Ok(build_response(
            StatusCode::METHOD_NOT_ALLOWED,
            [(ALLOW.as_str(), "POST")],
            "JSON-RPC requests must use POST",
        ));
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!("Failed to read request body: {}", e);
            return Ok(build_response(
                StatusCode::BAD_REQUEST,
                [] as [(&str, &str); 0],
                "Failed to read request body",
            ));
        }
    };

    let reply = process_payload(&dispatcher, &body);
    match serde_json::to_vec(&reply) {
        Ok(json) => Ok(build_response(
            StatusCode::OK,
            [(CONTENT_TYPE.as_str(), "application/json")],
            json,
        )),
        Err(e) => {
            error!("Failed to serialize reply: {}", e);
            Ok(build_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                [] as [(&str, &str); 0],
                "Failed to serialize reply",
            ))
        }
    }
}

/// Build an HTTP response with headers.
///
/// Falls back to a bare 500 if the builder rejects its inputs.
fn build_response(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder.body(Full::new(body.into())).unwrap_or_else(|_| {
        let mut response = Response::new(Full::new(Bytes::from("Internal Server Error")));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}
