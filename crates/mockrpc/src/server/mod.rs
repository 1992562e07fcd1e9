//! Server lifecycle.
//!
//! - `lifecycle`: `MockServer`, start/stop around a background tokio runtime
//! - `listener`: the hyper accept loop with graceful drain
//! - `network`: `SO_REUSEADDR` listener binding

mod lifecycle;
mod listener;
mod network;

pub use lifecycle::{MockServer, ServerState};
