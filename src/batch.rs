/// Batch scoring report.
///
/// `POST /api/batch_score` scores several customers in one call and returns
/// per-customer results plus aggregate statistics. Older service builds omit
/// the statistics block, in which case it is computed locally from the
/// results.
use serde::{Deserialize, Serialize};

use crate::features::CustomerFeatures;
use crate::segment::Segment;

/// One scored customer in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub customer_id: u64,
    pub score: f64,
    /// Segment label as received.
    pub segment: String,
}

/// Segment counts and mean score over a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStatistics {
    pub total_clients: usize,
    pub hot_leads: usize,
    pub warm_leads: usize,
    pub cold_leads: usize,
    pub average_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: Vec<BatchEntry>,
    pub statistics: BatchStatistics,
}

impl BatchStatistics {
    /// Tally segments from the received labels.
    pub fn from_entries(entries: &[BatchEntry]) -> Self {
        let mut stats = Self {
            total_clients: entries.len(),
            hot_leads: 0,
            warm_leads: 0,
            cold_leads: 0,
            average_score: 0.0,
        };

        for entry in entries {
            match Segment::from_label(&entry.segment) {
                Some(Segment::Hot) => stats.hot_leads += 1,
                Some(Segment::Warm) => stats.warm_leads += 1,
                Some(Segment::Cold) => stats.cold_leads += 1,
                None => {}
            }
        }

        if !entries.is_empty() {
            let total: f64 = entries.iter().map(|e| e.score).sum();
            stats.average_score = total / entries.len() as f64;
        }

        stats
    }
}

impl BatchReport {
    /// Whether the service's statistics match a local tally of its results.
    pub fn statistics_agree(&self) -> bool {
        let local = BatchStatistics::from_entries(&self.results);
        local.total_clients == self.statistics.total_clients
            && local.hot_leads == self.statistics.hot_leads
            && local.warm_leads == self.statistics.warm_leads
            && local.cold_leads == self.statistics.cold_leads
            && (local.average_score - self.statistics.average_score).abs() < 0.05
    }
}

/// Input file format for `leadscope batch`: a JSON array of customers.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct BatchInput(pub Vec<CustomerFeatures>);
