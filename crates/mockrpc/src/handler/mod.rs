//! Action handlers.
//!
//! An action is answered either by a fixture table or by a programmatic
//! handler. Programmatic handlers implement [`Handler`]; the two shipped
//! implementations are closures declared through [`ResponseBuilder`] and Rhai
//! scripts loaded from disk.

mod builder;
mod context;

pub use builder::ResponseBuilder;
pub use context::{check_bugzilla_auth, check_param, halt, Expect, HandlerContext, Values, ABSENT};

use crate::fixture::Fixture;
use crate::types::{Fault, Params, Response};
use std::fmt;
use std::sync::Arc;

/// Evaluates one call of a programmatically declared action.
///
/// Implementations are shared across connection tasks, so they must be
/// `Send + Sync`. Any state they mutate across calls is their own concern.
pub trait Handler: Send + Sync {
    fn call(&self, params: &Params) -> Result<Response, Fault>;
}

/// Cheaply cloneable handle to a [`Handler`].
#[derive(Clone)]
pub struct ProgrammaticHandler {
    inner: Arc<dyn Handler>,
}

impl ProgrammaticHandler {
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self {
            inner: Arc::new(handler),
        }
    }

    pub fn call(&self, params: &Params) -> Result<Response, Fault> {
        self.inner.call(params)
    }
}

impl fmt::Debug for ProgrammaticHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgrammaticHandler").finish_non_exhaustive()
    }
}

/// How a routed action is answered.
#[derive(Debug, Clone)]
pub enum ActionHandler {
    /// Match against a static request/response table
    Fixture(Arc<Fixture>),
    /// Run a closure or script
    Programmatic(ProgrammaticHandler),
}

impl ActionHandler {
    pub fn kind(&self) -> &'static str {
        match self {
            ActionHandler::Fixture(_) => "fixture",
            ActionHandler::Programmatic(_) => "programmatic",
        }
    }
}
