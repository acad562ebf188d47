/// Wire schemas for the scoring service and their validation.
///
/// Bodies are first decoded into private serde structs that mirror the
/// service's JSON, then checked against the contract (score range, known
/// segment labels, importance weights within `0..=1`). Every failure maps to
/// [`ServiceError::BadResponse`]; unknown extra fields are ignored.
use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use super::{ConnectionState, FeatureWeight, ModelStats, ScoreResult};
use crate::batch::{BatchEntry, BatchReport, BatchStatistics};
use crate::error::ServiceError;
use crate::features::CustomerFeatures;
use crate::segment::{self, Segment};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Request body for `POST /api/batch_score`.
#[derive(Debug, Serialize)]
pub struct BatchRequest<'a> {
    pub clients: &'a [CustomerFeatures],
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Body of `GET /health`. Only `model_loaded` is read.
#[derive(Debug, Deserialize)]
struct HealthBody {
    #[serde(default)]
    model_loaded: bool,
}

/// Body of `POST /api/score`.
#[derive(Debug, Deserialize)]
struct ScoreBody {
    score: f64,
    segment: String,
    recommendation: String,
    #[serde(default)]
    customer_id: Option<u64>,
}

/// Body of `GET /api/stats`.
#[derive(Debug, Deserialize)]
struct StatsBody {
    model_type: String,
    feature_importance: OrderedEntries<f64>,
    #[serde(default)]
    n_estimators: Option<u64>,
    #[serde(default)]
    segments: Option<OrderedEntries<String>>,
}

/// Body of `POST /api/batch_score`.
#[derive(Debug, Deserialize)]
struct BatchBody {
    results: Vec<BatchEntryBody>,
    #[serde(default)]
    statistics: Option<BatchStatisticsBody>,
}

#[derive(Debug, Deserialize)]
struct BatchEntryBody {
    customer_id: u64,
    score: f64,
    segment: String,
}

#[derive(Debug, Deserialize)]
struct BatchStatisticsBody {
    total_clients: usize,
    hot_leads: usize,
    warm_leads: usize,
    cold_leads: usize,
    average_score: f64,
}

/// Body of `POST /api/load_model`.
#[derive(Debug, Deserialize)]
struct LoadModelBody {
    message: String,
}

// ---------------------------------------------------------------------------
// Insertion-ordered JSON objects
// ---------------------------------------------------------------------------

/// A JSON object decoded into a `Vec` so key order survives.
///
/// A repeated key overwrites the earlier value in place.
#[derive(Debug)]
struct OrderedEntries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedEntries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = OrderedEntries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, V)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    match entries.iter_mut().find(|(k, _)| *k == key) {
                        Some(slot) => slot.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

/// Interpret a health-check reply.
///
/// Only HTTP 200 with a JSON object counts as connected; a missing
/// `model_loaded` reads as `false`.
pub fn decode_health(status: u16, body: &str) -> ConnectionState {
    if status != 200 {
        return ConnectionState::Disconnected;
    }
    match serde_json::from_str::<HealthBody>(body) {
        Ok(health) => ConnectionState::Connected {
            model_loaded: health.model_loaded,
        },
        Err(_) => ConnectionState::Disconnected,
    }
}

pub fn decode_score(body: &str) -> Result<ScoreResult, ServiceError> {
    let parsed: ScoreBody = parse(body, "score")?;
    check_score(parsed.score)?;
    check_segment(&parsed.segment)?;

    Ok(ScoreResult {
        score: parsed.score,
        segment: parsed.segment,
        recommendation: parsed.recommendation,
        customer_id: parsed.customer_id,
    })
}

pub fn decode_stats(body: &str) -> Result<ModelStats, ServiceError> {
    let parsed: StatsBody = parse(body, "stats")?;

    let mut feature_importance = Vec::with_capacity(parsed.feature_importance.0.len());
    for (name, importance) in parsed.feature_importance.0 {
        if !importance.is_finite() || !(0.0..=1.0).contains(&importance) {
            return Err(ServiceError::bad_response(format!(
                "importance of '{name}' outside 0..=1: {importance}"
            )));
        }
        feature_importance.push(FeatureWeight { name, importance });
    }

    Ok(ModelStats {
        model_type: parsed.model_type,
        feature_importance,
        n_estimators: parsed.n_estimators,
        segments: parsed.segments.map(|s| s.0).unwrap_or_default(),
    })
}

pub fn decode_batch(body: &str) -> Result<BatchReport, ServiceError> {
    let parsed: BatchBody = parse(body, "batch score")?;

    let mut results = Vec::with_capacity(parsed.results.len());
    for entry in parsed.results {
        check_score(entry.score)?;
        check_segment(&entry.segment)?;
        results.push(BatchEntry {
            customer_id: entry.customer_id,
            score: entry.score,
            segment: entry.segment,
        });
    }

    let statistics = match parsed.statistics {
        Some(s) => BatchStatistics {
            total_clients: s.total_clients,
            hot_leads: s.hot_leads,
            warm_leads: s.warm_leads,
            cold_leads: s.cold_leads,
            average_score: s.average_score,
        },
        None => BatchStatistics::from_entries(&results),
    };

    Ok(BatchReport {
        results,
        statistics,
    })
}

pub fn decode_load_model(body: &str) -> Result<String, ServiceError> {
    let parsed: LoadModelBody = parse(body, "load model")?;
    Ok(parsed.message)
}

fn parse<'a, T: Deserialize<'a>>(body: &'a str, what: &str) -> Result<T, ServiceError> {
    serde_json::from_str(body)
        .map_err(|e| ServiceError::bad_response(format!("malformed {what} body: {e}")))
}

fn check_score(score: f64) -> Result<(), ServiceError> {
    if segment::is_valid_score(score) {
        Ok(())
    } else {
        Err(ServiceError::bad_response(format!(
            "score outside 0..=100: {score}"
        )))
    }
}

fn check_segment(label: &str) -> Result<(), ServiceError> {
    match Segment::from_label(label) {
        Some(_) => Ok(()),
        None => Err(ServiceError::bad_response(format!(
            "unknown segment '{label}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
