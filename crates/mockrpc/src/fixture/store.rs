//! FixtureStore - loads a directory of fixture files into an action table.

use super::types::{Fixture, FixtureFormat};
use crate::error::SetupError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Immutable table of fixtures keyed by action name.
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    fixtures: HashMap<String, Fixture>,
    /// File each action was loaded from, for duplicate reporting
    origins: HashMap<String, PathBuf>,
}

impl FixtureStore {
    /// Load every fixture file in `dir`.
    ///
    /// The file name minus its final extension is the action name, so
    /// `Bug.get.yml` answers `Bug.get`. A missing directory yields an empty
    /// store; a malformed file aborts the whole load.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, SetupError> {
        let dir = dir.as_ref();
        let mut store = Self::default();

        if !dir.is_dir() {
            if dir.exists() {
                warn!("Fixture path {} is not a directory, ignoring", dir.display());
            } else {
                debug!("Fixture directory {} does not exist", dir.display());
            }
            return Ok(store);
        }

        for path in sorted_entries(dir)? {
            let Some((action, format)) = classify(&path) else {
                debug!("Skipping {}", path.display());
                continue;
            };

            let text =
                fs::read_to_string(&path).map_err(|e| SetupError::Io(path.clone(), e))?;
            let fixture = format
                .parse(&text)
                .map_err(|e| SetupError::MalformedFixture(path.clone(), e))?
                .compile()
                .map_err(|e| SetupError::Template(path.clone(), e))?;

            debug!(
                "Loaded fixture for {} ({} request(s)) from {}",
                action,
                fixture.valid_requests.len(),
                path.display()
            );
            store.insert(action, fixture, path)?;
        }

        info!(
            "Loaded {} fixture(s) from {}",
            store.fixtures.len(),
            dir.display()
        );
        Ok(store)
    }

    fn insert(&mut self, action: String, fixture: Fixture, path: PathBuf) -> Result<(), SetupError> {
        if let Some(first) = self.origins.get(&action) {
            return Err(SetupError::DuplicateFixture {
                action,
                first: first.clone(),
                second: path,
            });
        }
        self.origins.insert(action.clone(), path);
        self.fixtures.insert(action, fixture);
        Ok(())
    }

    /// Fold another store into this one. Actions present in both are an error.
    pub fn merge(&mut self, other: FixtureStore) -> Result<(), SetupError> {
        let FixtureStore {
            mut fixtures,
            origins,
        } = other;
        for (action, path) in origins {
            if let Some(fixture) = fixtures.remove(&action) {
                self.insert(action, fixture, path)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, action: &str) -> Option<&Fixture> {
        self.fixtures.get(action)
    }

    /// Action names, sorted.
    pub fn actions(&self) -> Vec<&str> {
        let mut actions: Vec<&str> = self.fixtures.keys().map(String::as_str).collect();
        actions.sort_unstable();
        actions
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn into_map(self) -> HashMap<String, Fixture> {
        self.fixtures
    }
}

/// Directory entries in path order, so load errors are deterministic.
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, SetupError> {
    let mut paths = fs::read_dir(dir)
        .map_err(|e| SetupError::Io(dir.to_path_buf(), e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SetupError::Io(dir.to_path_buf(), e))?;
    paths.sort();
    Ok(paths)
}

/// Action name of a regular, non-hidden file, if `path` is one.
pub(crate) fn action_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    if file_name.starts_with('.') || !path.is_file() {
        return None;
    }
    Some(path.file_stem()?.to_str()?.to_string())
}

fn classify(path: &Path) -> Option<(String, FixtureFormat)> {
    let format = FixtureFormat::from_path(path)?;
    Some((action_name(path)?, format))
}
