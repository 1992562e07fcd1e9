//! Shared helpers for the integration tests.

#![allow(dead_code)]

use mockrpc::{ListenConfig, MockServer, ServerDefinition, Values};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

pub fn data_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join(name)
}

pub fn auth_values() -> Values {
    [
        ("user".to_string(), json!("calvin")),
        ("password".to_string(), json!("hobbes")),
    ]
    .into_iter()
    .collect()
}

/// Definition loaded from `tests/fixtures` and `tests/scripts`.
pub fn definition() -> ServerDefinition {
    ServerDefinition::new()
        .with_fixtures(data_dir("fixtures"))
        .unwrap()
        .with_scripts(data_dir("scripts"), auth_values())
        .unwrap()
}

pub fn start(definition: ServerDefinition) -> MockServer {
    let mut server = MockServer::new(definition.build(), ListenConfig::default());
    server.start().unwrap();
    server
}

/// Fresh connection per request so a stopped server is observed immediately.
pub fn client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// POST a JSON-RPC call and return the decoded reply envelope.
pub fn call(server: &MockServer, method: &str, params: Value) -> Value {
    let url = server.url().unwrap();
    let body = json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 1});
    let response = client().post(url).json(&body).send().unwrap();
    assert_eq!(response.status(), 200);
    response.json().unwrap()
}

pub fn result(reply: &Value) -> &Value {
    assert!(reply.get("error").is_none(), "unexpected error: {reply}");
    &reply["result"]
}

pub fn error_message(reply: &Value) -> &str {
    reply["error"]["message"]
        .as_str()
        .unwrap_or_else(|| panic!("expected an error reply, got {reply}"))
}
