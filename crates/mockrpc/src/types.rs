//! Values that cross the RPC boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Inbound argument bag of a call. Compared by deep structural equality.
pub type Params = Map<String, Value>;

/// Successful result of a call, serialized back by the transport.
pub type Response = Value;

/// Code carried by every fault produced by fixtures, assertions and `halt`.
pub const FAULT_CODE: i64 = 1;

/// Structured error returned to the client instead of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("fault {code}: {message}")]
pub struct Fault {
    pub code: i64,
    pub message: String,
}

impl Fault {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Fault with the standard code, used by `halt` and the assertion helpers.
    pub fn halt(message: impl Into<String>) -> Self {
        Self::new(FAULT_CODE, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_serializes_as_code_and_message() {
        let fault = Fault::halt("boom");
        let json = serde_json::to_value(&fault).unwrap();
        assert_eq!(json, serde_json::json!({"code": 1, "message": "boom"}));
        assert_eq!(fault.to_string(), "fault 1: boom");
    }
}
