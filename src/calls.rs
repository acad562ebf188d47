use std::collections::BTreeMap;
use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Service call log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the service call log (`~/.leadscope/service-calls.jsonl`).
///
/// Records which endpoint was called, how it ended and how long it took.
/// Request and response bodies are never written: no customer data lands on
/// disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLogEntry {
    pub timestamp: String,
    /// `"health"`, `"score"`, `"stats"`, `"batch_score"` or `"load_model"`.
    pub operation: String,
    /// `"ok"`, `"network"` or `"bad_response"`.
    pub outcome: String,
    pub latency_ms: u64,
}

impl CallLogEntry {
    pub fn new(operation: &str, outcome: &str, latency_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            operation: operation.to_string(),
            outcome: outcome.to_string(),
            latency_ms,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome != "ok"
    }
}

/// Append an entry to the default log file. Best-effort.
pub fn record(operation: &str, outcome: &str, latency_ms: u64) {
    let Some(path) = call_log_path() else {
        return;
    };
    let entry = CallLogEntry::new(operation, outcome, latency_ms);
    if let Err(e) = append_entry(&path, &entry) {
        tracing::debug!(error = %e, "could not write service call log");
    }
}

// ---------------------------------------------------------------------------
// Reading and summarizing
// ---------------------------------------------------------------------------

/// Read all entries from the default log file.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_all_entries() -> Vec<CallLogEntry> {
    match call_log_path() {
        Some(path) => read_entries(&path),
        None => Vec::new(),
    }
}

pub fn read_entries(path: &Path) -> Vec<CallLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| serde_json::from_str::<CallLogEntry>(&line).ok())
        .collect()
}

/// Per-operation aggregate over the call log.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSummary {
    pub operation: String,
    pub calls: usize,
    pub failures: usize,
    pub avg_latency_ms: f64,
}

/// Group entries by operation, sorted by operation name.
pub fn summarize(entries: &[CallLogEntry]) -> Vec<OperationSummary> {
    let mut groups: BTreeMap<&str, (usize, usize, u64)> = BTreeMap::new();
    for entry in entries {
        let slot = groups.entry(entry.operation.as_str()).or_default();
        slot.0 += 1;
        if entry.is_failure() {
            slot.1 += 1;
        }
        slot.2 += entry.latency_ms;
    }

    groups
        .into_iter()
        .map(|(operation, (calls, failures, latency))| OperationSummary {
            operation: operation.to_string(),
            calls,
            failures,
            avg_latency_ms: latency as f64 / calls as f64,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

pub fn append_entry(path: &Path, entry: &CallLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Return the path to the service call log.
pub fn call_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".leadscope").join("service-calls.jsonl"))
}
