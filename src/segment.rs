/// Lead segment classification.
///
/// Maps a 0–100 conversion score onto the three segment bands used across
/// the dashboard and the CLI:
///
/// | Score       | Segment | Priority | Icon |
/// |-------------|---------|----------|------|
/// | `>= 70`     | Hot     | HIGH     | 🔥   |
/// | `40 ..< 70` | Warm    | MEDIUM   | ⚡   |
/// | `< 40`      | Cold    | LOW      | ❄️   |
///
/// The scoring service sends its own segment label. That label is what gets
/// displayed; [`Segment::from_score`] exists so the client can check the two
/// agree, and [`Segment::from_label`] picks the render theme from the label
/// without caring about letter case.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lower bound (inclusive) of the Hot band.
pub const HOT_THRESHOLD: f64 = 70.0;

/// Lower bound (inclusive) of the Warm band.
pub const WARM_THRESHOLD: f64 = 40.0;

/// Valid score range reported by the scoring service.
pub const SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

/// Classification band derived from a conversion score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Hot,
    Warm,
    Cold,
}

/// Follow-up priority attached to each segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Segment {
    /// Classify a score into its band.
    ///
    /// Bands are inclusive at the lower bound: 70 is Hot and 40 is Warm.
    /// Callers are expected to have range-checked the score with
    /// [`is_valid_score`] first; anything below 40 (including garbage) lands
    /// in Cold.
    pub fn from_score(score: f64) -> Self {
        if score >= HOT_THRESHOLD {
            Self::Hot
        } else if score >= WARM_THRESHOLD {
            Self::Warm
        } else {
            Self::Cold
        }
    }

    /// Resolve a segment label as received from the service.
    ///
    /// Comparison ignores case and surrounding whitespace. Returns `None`
    /// for labels outside the three known bands.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "hot" => Some(Self::Hot),
            "warm" => Some(Self::Warm),
            "cold" => Some(Self::Cold),
            _ => None,
        }
    }

    /// Canonical label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Hot => "Hot",
            Self::Warm => "Warm",
            Self::Cold => "Cold",
        }
    }

    /// Lower-case theme key, used as the CSS class of the result panel.
    pub fn theme(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cold => "cold",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Hot => "🔥",
            Self::Warm => "⚡",
            Self::Cold => "❄️",
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            Self::Hot => Priority::High,
            Self::Warm => Priority::Medium,
            Self::Cold => Priority::Low,
        }
    }

    /// Operator guidance shown next to the band description.
    pub fn guidance(self) -> &'static str {
        match self {
            Self::Hot => "Contact immediately: strong conversion potential.",
            Self::Warm => "Schedule a follow-up within 48 hours to keep the lead engaged.",
            Self::Cold => "Nurture with the automated email sequence.",
        }
    }

    /// Human-readable score band, e.g. `"Score >= 70"`.
    pub fn band(self) -> &'static str {
        match self {
            Self::Hot => "Score >= 70",
            Self::Warm => "40 <= Score < 70",
            Self::Cold => "Score < 40",
        }
    }

    /// All segments, hottest first.
    pub fn all() -> [Self; 3] {
        [Self::Hot, Self::Warm, Self::Cold]
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a score reported by the service is inside the contract range.
pub fn is_valid_score(score: f64) -> bool {
    score.is_finite() && SCORE_RANGE.contains(&score)
}

/// Format a score for display as a whole number out of 100 (`"82/100"`).
pub fn format_score(score: f64) -> String {
    format!("{}/100", score.round() as i64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
