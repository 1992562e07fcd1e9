//! Request decoding and dispatch, independent of the HTTP layer.

use super::types::{codes, RpcRequest, RpcResponse};
use crate::dispatch::Dispatcher;
use crate::types::{Fault, Params};
use serde_json::Value;
use tracing::debug;

/// Decode a JSON-RPC request body, dispatch it and build the reply.
///
/// Every outcome, including malformed input, is expressed as a reply so the
/// caller always has something to send back.
pub fn process_payload(dispatcher: &Dispatcher, body: &[u8]) -> RpcResponse {
    let raw: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            debug!("Unparseable request body: {}", e);
            return RpcResponse::error(
                Value::Null,
                Fault::new(codes::PARSE_ERROR, format!("Parse error: {e}")),
            );
        }
    };

    let id = raw.get("id").cloned().unwrap_or(Value::Null);
    let request: RpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            return RpcResponse::error(
                id,
                Fault::new(codes::INVALID_REQUEST, format!("Invalid request: {e}")),
            );
        }
    };

    let params = match normalize_params(request.params) {
        Ok(params) => params,
        Err(fault) => return RpcResponse::error(request.id, fault),
    };

    match dispatcher.handle(&request.method, &params) {
        Some(Ok(response)) => RpcResponse::result(request.id, response),
        Some(Err(fault)) => RpcResponse::error(request.id, fault),
        None => RpcResponse::error(
            request.id,
            Fault::new(
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        ),
    }
}

/// Accept params as an object, a one-element array holding an object (the
/// Bugzilla JSON-RPC convention), an empty array or nothing at all.
pub fn normalize_params(params: Value) -> Result<Params, Fault> {
    match params {
        Value::Null => Ok(Params::new()),
        Value::Object(map) => Ok(map),
        Value::Array(items) if items.is_empty() => Ok(Params::new()),
        Value::Array(items) => match <[Value; 1]>::try_from(items) {
            Ok([Value::Object(map)]) => Ok(map),
            _ => Err(invalid_params()),
        },
        _ => Err(invalid_params()),
    }
}

fn invalid_params() -> Fault {
    Fault::new(
        codes::INVALID_PARAMS,
        "Invalid params: expected an object or a single-object array",
    )
}
