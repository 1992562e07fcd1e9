//! ServerDefinition - the registry composed before a server starts.

use super::Dispatcher;
use crate::error::SetupError;
use crate::fixture::FixtureStore;
use crate::handler::{ActionHandler, ProgrammaticHandler, Values};
use crate::scripting::load_scripts;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Collects fixtures and programmatic handlers, then freezes them into a
/// [`Dispatcher`].
///
/// Registration only happens here; once `build` is called the table can no
/// longer change.
#[derive(Debug, Default)]
pub struct ServerDefinition {
    fixtures: FixtureStore,
    handlers: HashMap<String, ProgrammaticHandler>,
}

impl ServerDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture directory. Returns the number of fixtures loaded.
    pub fn load_fixtures(&mut self, dir: impl AsRef<Path>) -> Result<usize, SetupError> {
        let store = FixtureStore::load(dir)?;
        let count = store.len();
        self.fixtures.merge(store)?;
        Ok(count)
    }

    /// Builder form of [`load_fixtures`](Self::load_fixtures).
    pub fn with_fixtures(mut self, dir: impl AsRef<Path>) -> Result<Self, SetupError> {
        self.load_fixtures(dir)?;
        Ok(self)
    }

    /// Builder form of [`load_scripts`](Self::load_scripts).
    pub fn with_scripts(mut self, dir: impl AsRef<Path>, values: Values) -> Result<Self, SetupError> {
        self.load_scripts(dir, values)?;
        Ok(self)
    }

    /// Use an already loaded fixture store.
    pub fn with_fixture_store(mut self, store: FixtureStore) -> Result<Self, SetupError> {
        self.fixtures.merge(store)?;
        Ok(self)
    }

    /// Register a programmatic handler. Each action may be registered once.
    pub fn register(
        &mut self,
        action: impl Into<String>,
        handler: ProgrammaticHandler,
    ) -> Result<(), SetupError> {
        let action = action.into();
        if self.handlers.contains_key(&action) {
            return Err(SetupError::DuplicateHandler(action));
        }
        debug!("Registered handler for {}", action);
        self.handlers.insert(action, handler);
        Ok(())
    }

    /// Register every script in `dir`, with `values` visible to the scripts.
    /// Returns the number of scripts loaded.
    pub fn load_scripts(
        &mut self,
        dir: impl AsRef<Path>,
        values: Values,
    ) -> Result<usize, SetupError> {
        let scripts = load_scripts(dir, values)?;
        let count = scripts.len();
        for (action, handler) in scripts {
            self.register(action, handler)?;
        }
        Ok(count)
    }

    /// Freeze into a routing table. A programmatic handler takes precedence
    /// over a fixture for the same action.
    pub fn build(self) -> Dispatcher {
        let mut routes: HashMap<String, ActionHandler> = self
            .fixtures
            .into_map()
            .into_iter()
            .map(|(action, fixture)| (action, ActionHandler::Fixture(Arc::new(fixture))))
            .collect();

        for (action, handler) in self.handlers {
            if routes.contains_key(&action) {
                debug!("Handler for {} overrides its fixture", action);
            }
            routes.insert(action, ActionHandler::Programmatic(handler));
        }

        Dispatcher::new(routes)
    }
}
