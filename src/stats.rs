/// Model statistics panel.
///
/// Fetches the model's feature importances once when mounted and keeps the
/// top entries as proportional bars. Ranking is by weight, highest first;
/// equal weights keep the order the service sent them in.
use serde::Serialize;

use crate::client::{FeatureWeight, ModelStats, ScoringService};
use crate::error::DashboardFailure;

/// One ranked feature, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureBar {
    pub name: String,
    pub importance: f64,
    /// Bar width in percent, `importance * 100` rounded to one decimal.
    pub width_pct: f64,
}

impl FeatureBar {
    fn from_weight(weight: &FeatureWeight) -> Self {
        Self {
            name: weight.name.clone(),
            importance: weight.importance,
            width_pct: (weight.importance * 1000.0).round() / 10.0,
        }
    }

    /// Width formatted for display and CSS, e.g. `"40.0%"`.
    pub fn label(&self) -> String {
        format!("{:.1}%", self.width_pct)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatsPanel {
    Loaded {
        stats: ModelStats,
        bars: Vec<FeatureBar>,
    },
    Failed {
        message: &'static str,
    },
}

/// Rank features by importance and keep the first `top_n`.
pub fn rank_features(weights: &[FeatureWeight], top_n: usize) -> Vec<FeatureBar> {
    let mut ranked: Vec<&FeatureWeight> = weights.iter().collect();
    // Stable sort: ties keep their original order.
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
        .into_iter()
        .take(top_n)
        .map(FeatureBar::from_weight)
        .collect()
}

pub struct StatsPanelController;

impl StatsPanelController {
    /// Mount the panel: one stats call, no retry.
    pub fn mount<S: ScoringService>(client: &S, top_n: usize) -> StatsPanel {
        match client.stats() {
            Ok(stats) => StatsPanel::Loaded {
                bars: rank_features(&stats.feature_importance, top_n),
                stats,
            },
            Err(e) => {
                tracing::warn!(error = %e, "model statistics unavailable");
                StatsPanel::Failed {
                    message: DashboardFailure::Stats.user_message(),
                }
            }
        }
    }
}
