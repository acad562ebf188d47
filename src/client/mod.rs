/// Client side of the scoring-service contract.
///
/// The scoring service is an external HTTP collaborator (default
/// `http://localhost:8000`) that owns the model. This module defines what
/// the dashboard needs from it:
///
/// - [`ScoringService`]: the three calls the dashboard makes (`health`,
///   `score`, `stats`). Controllers are generic over it so tests can swap in
///   a scripted implementation.
/// - [`ServiceClient`]: the blocking `ureq` implementation, with a bounded
///   timeout on every call and no retries.
/// - [`wire`]: strict decoding of response bodies. Anything that does not
///   match the schema becomes [`ServiceError::BadResponse`].
pub mod http;
pub mod wire;

use serde::Serialize;

use crate::error::ServiceError;
use crate::features::CustomerFeatures;
use crate::segment::Segment;

pub use http::ServiceClient;

// ---------------------------------------------------------------------------
// Contract types
// ---------------------------------------------------------------------------

/// Reachability of the scoring service, decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionState {
    Connected { model_loaded: bool },
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// `Some(loaded)` when connected, `None` when the service is down.
    pub fn model_loaded(self) -> Option<bool> {
        match self {
            Self::Connected { model_loaded } => Some(model_loaded),
            Self::Disconnected => None,
        }
    }
}

/// A validated response from `POST /api/score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    /// Conversion score, guaranteed within `0..=100` after decoding.
    pub score: f64,
    /// Segment label exactly as the service sent it.
    pub segment: String,
    pub recommendation: String,
    /// Echoed by the service when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
}

impl ScoreResult {
    pub fn new(score: f64, segment: impl Into<String>, recommendation: impl Into<String>) -> Self {
        Self {
            score,
            segment: segment.into(),
            recommendation: recommendation.into(),
            customer_id: None,
        }
    }

    /// Render theme for the received label, matched without regard to case.
    pub fn theme(&self) -> Option<Segment> {
        Segment::from_label(&self.segment)
    }

    /// Whether the received label agrees with the band of the score.
    pub fn is_consistent(&self) -> bool {
        self.theme() == Some(Segment::from_score(self.score))
    }
}

/// One entry of the model's feature-importance table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureWeight {
    pub name: String,
    pub importance: f64,
}

/// A validated response from `GET /api/stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStats {
    pub model_type: String,
    /// Entries in the order the service sent them.
    pub feature_importance: Vec<FeatureWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_estimators: Option<u64>,
    /// Segment name → band description, when the service publishes them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

/// The calls the dashboard makes against the scoring service.
///
/// Implementations must not panic on service failures: `health` folds every
/// failure into [`ConnectionState::Disconnected`], the other calls return a
/// tagged [`ServiceError`].
pub trait ScoringService {
    fn health(&self) -> ConnectionState;

    fn score(&self, features: &CustomerFeatures) -> Result<ScoreResult, ServiceError>;

    fn stats(&self) -> Result<ModelStats, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistency_check_uses_bands() {
        assert!(ScoreResult::new(82.0, "Hot", "x").is_consistent());
        assert!(ScoreResult::new(70.0, "hot", "x").is_consistent());
        assert!(!ScoreResult::new(69.0, "Hot", "x").is_consistent());
        assert!(!ScoreResult::new(10.0, "Unknown", "x").is_consistent());
    }

    #[test]
    fn connection_state_accessors() {
        let up = ConnectionState::Connected { model_loaded: false };
        assert!(up.is_connected());
        assert_eq!(up.model_loaded(), Some(false));
        assert!(!ConnectionState::Disconnected.is_connected());
        assert_eq!(ConnectionState::Disconnected.model_loaded(), None);
    }
}
