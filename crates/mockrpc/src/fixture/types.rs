//! Fixture type definitions.

use crate::template::{MessageTemplate, TemplateError};
use crate::types::{Params, Response};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One accepted request and the response returned for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidRequest {
    pub request_params: Params,
    pub response: Response,
}

/// On-disk shape of a fixture file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FixtureFile {
    #[serde(default)]
    pub valid_requests: Vec<ValidRequest>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl FixtureFile {
    pub(crate) fn compile(self) -> Result<Fixture, TemplateError> {
        let error_message = self
            .error_message
            .as_deref()
            .map(MessageTemplate::parse)
            .transpose()?;
        Ok(Fixture {
            valid_requests: self.valid_requests,
            error_message,
        })
    }
}

/// Static request/response table for a single action.
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    /// Matched in declaration order, first structural match wins
    pub valid_requests: Vec<ValidRequest>,
    /// Rendered into the fault message when nothing matches
    pub error_message: Option<MessageTemplate>,
}

impl Fixture {
    /// Response of the first entry whose `request_params` deep-equals `params`.
    ///
    /// Objects compare without regard to key order, arrays element by element.
    /// Integers and floats are different values, so a fixture `1.0` never
    /// matches a client's `1`. There is no partial or wildcard matching.
    pub fn find_response(&self, params: &Params) -> Option<&Response> {
        self.valid_requests
            .iter()
            .find(|entry| entry.request_params == *params)
            .map(|entry| &entry.response)
    }
}

/// Serialization format of a fixture file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFormat {
    Yaml,
    Json,
}

impl FixtureFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yml" | "yaml" => Some(FixtureFormat::Yaml),
            "json" => Some(FixtureFormat::Json),
            _ => None,
        }
    }

    pub(crate) fn parse(self, text: &str) -> Result<FixtureFile, String> {
        match self {
            FixtureFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            FixtureFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        }
    }
}
