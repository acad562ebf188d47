/// Failure taxonomy for scoring-service interactions.
///
/// [`ServiceError`] is what the client returns: a transport problem or a
/// response that breaks the contract. [`DashboardFailure`] is what the
/// controllers turn those into: one plain-language message per place a call
/// can fail. Raw error details stay in the logs and never reach the operator.
use serde::Serialize;
use thiserror::Error;

/// A failed call to the scoring service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Connection refused, DNS failure, timeout, broken stream.
    #[error("scoring service unreachable: {0}")]
    Network(String),
    /// Non-2xx status, undecodable body, or a body that violates the schema.
    #[error("invalid response from scoring service: {0}")]
    BadResponse(String),
}

/// Coarse failure kind, used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    BadResponse,
}

impl ServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) => FailureKind::Network,
            Self::BadResponse(_) => FailureKind::BadResponse,
        }
    }

    pub(crate) fn bad_response(detail: impl Into<String>) -> Self {
        Self::BadResponse(detail.into())
    }
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::BadResponse => "bad_response",
        }
    }
}

/// Where in the dashboard a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardFailure {
    /// Health check failed: the whole dashboard is gated.
    Connectivity,
    /// A score request failed: local to one form submission.
    Submission,
    /// The stats request failed: local to the stats panel.
    Stats,
}

impl DashboardFailure {
    /// Message shown to the operator.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Connectivity => {
                "The scoring service is not reachable. Start it and reload this page."
            }
            Self::Submission => {
                "Unable to calculate the score. Check that the scoring service is running and try again."
            }
            Self::Stats => "Unable to load the model statistics.",
        }
    }
}
