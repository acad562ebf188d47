/// Configuration schema and defaults for leadscope.
///
/// Defines the TOML-serializable configuration structure with its three
/// sections: `[service]`, `[dashboard]` and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use serde::{Deserialize, Serialize};

/// Default scoring service endpoint.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Default per-call timeout for scoring service requests.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default bind address of the web dashboard.
pub const DEFAULT_DASHBOARD_ADDR: &str = "127.0.0.1:9750";

/// Number of features shown in the stats panel.
pub const DEFAULT_TOP_FEATURES: usize = 5;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level leadscope configuration.
///
/// Maps directly to the `~/.leadscope/config.toml` and `.leadscope.toml`
/// file schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadscopeConfig {
    pub service: ServiceConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [service]
// ---------------------------------------------------------------------------

/// Where the scoring service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL, e.g. `http://localhost:8000`. Overridden by
    /// `LEADSCOPE_SERVICE_URL`.
    pub base_url: String,
    /// Timeout applied to each call (milliseconds). Expiry is reported as a
    /// network failure.
    pub timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// `host:port` the web dashboard binds to.
    pub addr: String,
    /// Number of ranked features shown in the stats panel.
    pub top_features: usize,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_DASHBOARD_ADDR.to_string(),
            top_features: DEFAULT_TOP_FEATURES,
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive for diagnostics on stderr
    /// (e.g. `"warn"`, `"leadscope=debug"`).
    pub level: String,
    /// Append one line per service call to `~/.leadscope/service-calls.jsonl`.
    pub call_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            call_log: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl LeadscopeConfig {
    /// The annotated default config written by `leadscope config init`.
    pub fn default_toml() -> String {
        format!(
            r#"# leadscope configuration
#
# Layers (later wins): built-in defaults, ~/.leadscope/config.toml,
# .leadscope.toml in the working directory, LEADSCOPE_SERVICE_URL.

[service]
# Base URL of the scoring service.
base_url = "{DEFAULT_SERVICE_URL}"
# Per-call timeout in milliseconds.
timeout_ms = {DEFAULT_TIMEOUT_MS}

[dashboard]
# Address the web dashboard listens on.
addr = "{DEFAULT_DASHBOARD_ADDR}"
# Features shown in the model statistics panel.
top_features = {DEFAULT_TOP_FEATURES}
# Open the dashboard in the default browser on start.
open_browser = true

[logging]
# Diagnostics filter (tracing EnvFilter syntax), printed to stderr.
level = "warn"
# Record service call outcomes to ~/.leadscope/service-calls.jsonl.
call_log = true
"#
        )
    }
}
