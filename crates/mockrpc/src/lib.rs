//! mockrpc: a mock JSON-RPC endpoint for exercising RPC client libraries.
//!
//! Actions are answered either by fixture tables loaded from disk or by
//! programmatic handlers (Rust closures or Rhai scripts) that assert on the
//! inbound params and build a response.
//!
//! ```no_run
//! use mockrpc::{ListenConfig, MockServer, ResponseBuilder, ServerDefinition};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), mockrpc::SetupError> {
//! let mut definition = ServerDefinition::new();
//! definition.load_fixtures("tests/fixtures")?;
//! definition.register(
//!     "Foo.bar",
//!     ResponseBuilder::new(|ctx| {
//!         ctx.assert_params([("foo", json!("foo"))])?;
//!         Ok(json!({"foo": "foo"}))
//!     })
//!     .build(),
//! )?;
//!
//! let mut server = MockServer::new(definition.build(), ListenConfig::default());
//! let addr = server.start()?;
//! println!("serving on {addr}");
//! server.stop();
//! # Ok(())
//! # }
//! ```

// ===== Matching and evaluation =====
pub mod dispatch;
pub mod fixture;
pub mod handler;
pub mod report;
pub mod template;
pub mod types;

// ===== Serving =====
pub mod config;
pub mod rpc;
pub mod server;

mod error;
mod scripting;

pub use config::{ListenConfig, ServerConfig};
pub use dispatch::{Dispatcher, ServerDefinition};
pub use error::SetupError;
pub use fixture::{Fixture, FixtureStore, ValidRequest};
pub use handler::{
    halt, ActionHandler, Expect, Handler, HandlerContext, ProgrammaticHandler, ResponseBuilder,
    Values, ABSENT,
};
pub use scripting::{load_scripts, ScriptHandler};
pub use server::{MockServer, ServerState};
pub use types::{Fault, Params, Response, FAULT_CODE};
