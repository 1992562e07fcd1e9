//! JSON-RPC over HTTP transport.
//!
//! ## Module Structure
//!
//! - `types`: Envelope types and transport-level error codes
//! - `codec`: Decoding a request body and dispatching it (no I/O)
//! - `service`: hyper service wrapping the codec

mod codec;
mod service;
mod types;

pub use codec::{normalize_params, process_payload};
pub use service::handle_rpc_request;
pub use types::{codes, RpcOutcome, RpcRequest, RpcResponse, JSONRPC_VERSION};
