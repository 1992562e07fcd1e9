//! JSON-RPC envelope types.

use crate::types::{Fault, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Error codes produced by the transport itself. Faults from fixtures and
/// handlers always use [`crate::FAULT_CODE`].
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
}

/// Inbound call.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

/// Result or error member of a reply.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcOutcome {
    Result(Response),
    Error(Fault),
}

/// Outbound reply.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(flatten)]
    pub outcome: RpcOutcome,
    pub id: Value,
}

impl RpcResponse {
    pub fn result(id: Value, response: Response) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            outcome: RpcOutcome::Result(response),
            id,
        }
    }

    pub fn error(id: Value, fault: Fault) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            outcome: RpcOutcome::Error(fault),
            id,
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match &self.outcome {
            RpcOutcome::Error(fault) => Some(fault),
            RpcOutcome::Result(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_serialization() {
        let reply = RpcResponse::result(json!(7), json!({"bugs": []}));
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"jsonrpc": "2.0", "result": {"bugs": []}, "id": 7})
        );
    }

    #[test]
    fn test_null_result_is_kept() {
        let reply = RpcResponse::result(json!(1), Value::Null);
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"jsonrpc": "2.0", "result": null, "id": 1})
        );
    }

    #[test]
    fn test_error_serialization() {
        let reply = RpcResponse::error(json!("abc"), Fault::halt("nope"));
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"jsonrpc": "2.0", "error": {"code": 1, "message": "nope"}, "id": "abc"})
        );
        assert_eq!(reply.fault().unwrap().message, "nope");
    }

    #[test]
    fn test_request_defaults() {
        let request: RpcRequest = serde_json::from_value(json!({"method": "Bug.get"})).unwrap();
        assert_eq!(request.method, "Bug.get");
        assert_eq!(request.params, Value::Null);
        assert_eq!(request.id, Value::Null);
        assert_eq!(request.jsonrpc, None);
    }
}
