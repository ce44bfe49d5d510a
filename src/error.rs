//! Failures scoped to a single assistant invocation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssistError {
    /// Network, auth, or HTTP failure talking to the generative backend.
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("malformed collaborator response: {0}")]
    MalformedResponse(String),

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("invocation cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for AssistError {
    fn from(error: reqwest::Error) -> Self {
        Self::CollaboratorUnavailable(error.to_string())
    }
}

impl From<serde_json::Error> for AssistError {
    fn from(error: serde_json::Error) -> Self {
        Self::MalformedResponse(error.to_string())
    }
}
