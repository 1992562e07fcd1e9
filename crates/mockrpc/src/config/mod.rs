//! Configuration types for the standalone server.

mod listen;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use listen::ListenConfig;

use crate::dispatch::ServerDefinition;
use crate::error::SetupError;
use crate::handler::Values;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub listen: ListenConfig,
    /// Directory of `<action>.yml` / `<action>.json` fixture files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<PathBuf>,
    /// Directory of `<action>.rhai` handler scripts. May be the fixtures
    /// directory; each loader only picks up its own extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<PathBuf>,
    /// Named values visible to scripts as `values.<name>`
    #[serde(default, skip_serializing_if = "Values::is_empty")]
    pub values: Values,
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), SetupError> {
        self.listen.validate()
    }

    /// Paths in the file are relative to the file itself.
    pub fn resolve_paths(&mut self, base: &Path) {
        for dir in [&mut self.fixtures, &mut self.scripts].into_iter().flatten() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Load fixtures and scripts into a server definition.
    pub fn definition(&self) -> Result<ServerDefinition, SetupError> {
        let mut definition = ServerDefinition::new();
        if let Some(dir) = &self.fixtures {
            definition.load_fixtures(dir)?;
        }
        if let Some(dir) = &self.scripts {
            definition.load_scripts(dir, self.values.clone())?;
        }
        Ok(definition)
    }
}
