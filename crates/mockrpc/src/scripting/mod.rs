//! Programmatic handlers written as Rhai scripts.
//!
//! Each `<action>.rhai` file in a scripts directory answers `<action>`. The
//! script sees the call's `params`, the server's named `values` and the
//! `ABSENT` sentinel, and can call `assert_params`, `assert_bugzilla_auth`
//! and `halt`. Its final expression is the response.
//!
//! Rhai object maps keep their keys sorted, so a script's `assert_params`
//! checks keys in alphabetical order and reports the alphabetically first
//! mismatch. Closure handlers check keys in the order they are given.
//! `ABSENT` is only meaningful as a top-level value of that map.
//!
//! ```rhai
//! assert_bugzilla_auth(values.user, values.password);
//! assert_params(#{ ids: [123], include_fields: ABSENT });
//! #{ bugs: [values.bug] }
//! ```

mod rhai_engine;

pub use rhai_engine::ScriptHandler;

use crate::error::SetupError;
use crate::fixture::store::{action_name, sorted_entries};
use crate::handler::{ProgrammaticHandler, Values};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const SCRIPT_EXTENSION: &str = "rhai";

/// Compile every `*.rhai` file in `dir` into a handler keyed by action name.
///
/// A missing directory yields no handlers; a script that fails to compile
/// aborts the load.
pub fn load_scripts(
    dir: impl AsRef<Path>,
    values: Values,
) -> Result<BTreeMap<String, ProgrammaticHandler>, SetupError> {
    let dir = dir.as_ref();
    let mut handlers = BTreeMap::new();

    if !dir.is_dir() {
        debug!("Script directory {} does not exist", dir.display());
        return Ok(handlers);
    }

    let values = Arc::new(values);
    for path in sorted_entries(dir)? {
        if path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
            debug!("Skipping {}", path.display());
            continue;
        }
        let Some(action) = action_name(&path) else {
            debug!("Skipping {}", path.display());
            continue;
        };

        let source = fs::read_to_string(&path).map_err(|e| SetupError::Io(path.clone(), e))?;
        let handler = ScriptHandler::compile(&action, &source, Arc::clone(&values))
            .map_err(|e| SetupError::Script(path.clone(), e))?;

        debug!("Compiled script for {} from {}", action, path.display());
        handlers.insert(action, ProgrammaticHandler::new(handler));
    }

    info!(
        "Loaded {} script handler(s) from {}",
        handlers.len(),
        dir.display()
    );
    Ok(handlers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Params;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_scripts_by_action_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Foo.bar.rhai"), "#{ foo: params.foo }").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let handlers = load_scripts(dir.path(), Values::new()).unwrap();
        assert_eq!(handlers.keys().collect::<Vec<_>>(), vec!["Foo.bar"]);

        let params: Params = json!({"foo": "baz"}).as_object().cloned().unwrap();
        assert_eq!(
            handlers["Foo.bar"].call(&params).unwrap(),
            json!({"foo": "baz"})
        );
    }

    #[test]
    fn test_load_scripts_passes_values() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Who.ami.rhai"), "values.user").unwrap();
        let values: Values = [("user".to_string(), json!("calvin"))].into_iter().collect();

        let handlers = load_scripts(dir.path(), values).unwrap();
        assert_eq!(
            handlers["Who.ami"].call(&Params::new()).unwrap(),
            json!("calvin")
        );
    }

    #[test]
    fn test_syntax_error_fails_fast() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Broken.rhai"), "let x = ;").unwrap();

        let err = load_scripts(dir.path(), Values::new()).unwrap_err();
        assert!(matches!(err, SetupError::Script(..)), "{err}");
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let handlers = load_scripts("/definitely/not/here", Values::new()).unwrap();
        assert!(handlers.is_empty());
    }
}
