//! Routing of inbound calls to fixtures and programmatic handlers.
//!
//! - `definition`: `ServerDefinition`, the write-once registry composed before serving
//! - `Dispatcher`: the frozen routing table shared by every connection task

mod definition;


pub use definition::ServerDefinition;

use crate::handler::ActionHandler;
use crate::report;
use crate::types::{Fault, Params, Response};
use std::collections::HashMap;
use tracing::debug;

/// Immutable action table.
///
/// Built once by [`ServerDefinition::build`] and only read afterwards, so it
/// is shared across request tasks behind an `Arc` without locking.
#[derive(Debug, Default)]
pub struct Dispatcher {
    routes: HashMap<String, ActionHandler>,
}

impl Dispatcher {
    pub(crate) fn new(routes: HashMap<String, ActionHandler>) -> Self {
        Self { routes }
    }

    /// Answer one call.
    ///
    /// Returns `None` when nothing is routed for `action`; the transport
    /// decides how to report an unknown method.
    pub fn handle(&self, action: &str, params: &Params) -> Option<Result<Response, Fault>> {
        let Some(handler) = self.routes.get(action) else {
            debug!("No route for {}", action);
            return None;
        };

        let outcome = match handler {
            ActionHandler::Programmatic(handler) => handler.call(params),
            ActionHandler::Fixture(fixture) => match fixture.find_response(params) {
                Some(response) => Ok(response.clone()),
                None => Err(report::not_found(action, fixture, params)),
            },
        };

        match &outcome {
            Ok(_) => debug!("{} ({}) answered", action, handler.kind()),
            Err(fault) => debug!(
                "{} ({}) faulted: {}",
                action,
                handler.kind(),
                fault.message
            ),
        }
        Some(outcome)
    }

    pub fn route(&self, action: &str) -> Option<&ActionHandler> {
        self.routes.get(action)
    }

    /// Routed action names, sorted.
    pub fn actions(&self) -> Vec<&str> {
        let mut actions: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        actions.sort_unstable();
        actions
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
