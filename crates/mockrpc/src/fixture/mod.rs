//! Fixture tables: per-action request/response pairs loaded from disk.
//!
//! ## Module Structure
//!
//! - `types`: Fixture definitions and their on-disk representation
//! - `store`: Directory loader producing the immutable action table

pub(crate) mod store;
mod types;

pub use store::FixtureStore;
pub use types::{Fixture, FixtureFormat, ValidRequest};
