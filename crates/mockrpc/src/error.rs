use crate::template::TemplateError;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Errors raised while composing or starting a server. None of these are
/// recovered from; they abort setup.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Malformed fixture {0}: {1}")]
    MalformedFixture(PathBuf, String),
    #[error("Action '{action}' is defined by both {first} and {second}")]
    DuplicateFixture {
        action: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("Invalid error_message template in {0}: {1}")]
    Template(PathBuf, #[source] TemplateError),
    #[error("Failed to compile script {0}: {1}")]
    Script(PathBuf, String),
    #[error("A handler is already registered for action '{0}'")]
    DuplicateHandler(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Failed to bind {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),
    #[error("Server is already running on {0}")]
    AlreadyRunning(SocketAddr),
    #[error("Server failed to start: {0}")]
    Startup(String),
}
