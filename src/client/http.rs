/// Blocking HTTP client for the scoring service.
///
/// Uses the synchronous `ureq` client. Every call carries the configured
/// timeout (10 s by default); an expired timeout is a transport failure and
/// surfaces as [`ServiceError::Network`]. There are no retries: one attempt
/// per operator action.
///
/// Each call is traced at `debug` level and, when enabled, appended to the
/// service call log (see [`crate::calls`]).
use std::time::{Duration, Instant};

use serde::Serialize;

use super::wire::{self, BatchRequest};
use super::{ConnectionState, ModelStats, ScoreResult, ScoringService};
use crate::batch::BatchReport;
use crate::calls;
use crate::config::LeadscopeConfig;
use crate::error::ServiceError;
use crate::features::CustomerFeatures;

/// Default model file passed to `POST /api/load_model`.
pub const DEFAULT_MODEL_PATH: &str = "crm_scoring_model.pkl";

/// A raw reply: HTTP status and body text.
#[derive(Debug)]
struct Reply {
    status: u16,
    body: String,
}

/// Synchronous scoring-service client.
///
/// Cheap to build; the dashboard creates one per server and the CLI one per
/// invocation.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    base_url: String,
    timeout: Duration,
    record_calls: bool,
}

impl ServiceClient {
    /// Build a client for `base_url` with the given per-call timeout.
    ///
    /// The call log is disabled; use [`from_config`](Self::from_config) to
    /// honour `logging.call_log`.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            record_calls: false,
        }
    }

    /// Build a client from the resolved config.
    pub fn from_config(config: &LeadscopeConfig) -> Self {
        Self {
            record_calls: config.logging.call_log,
            ..Self::new(
                &config.service.base_url,
                Duration::from_millis(config.service.timeout_ms),
            )
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Score several customers in one request.
    pub fn batch_score(&self, customers: &[CustomerFeatures]) -> Result<BatchReport, ServiceError> {
        self.observe("batch_score", || {
            let reply = self.post_json("/api/batch_score", &BatchRequest { clients: customers })?;
            wire::decode_batch(&expect_success(reply)?)
        })
    }

    /// Ask the service to load a pickled model from `model_path`.
    ///
    /// Returns the service's confirmation message.
    pub fn load_model(&self, model_path: &str) -> Result<String, ServiceError> {
        self.observe("load_model", || {
            let url = self.url("/api/load_model");
            let reply = send(
                ureq::post(&url)
                    .query("model_path", model_path)
                    .timeout(self.timeout)
                    .call(),
            )?;
            wire::decode_load_model(&expect_success(reply)?)
        })
    }

    // -----------------------------------------------------------------------
    // Transport helpers
    // -----------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        let url = format!("{}{}", self.base_url, path);
        // On Windows, "localhost" may try IPv6 (::1) first and stall when the
        // service only binds IPv4.
        url.replace("://localhost", "://127.0.0.1")
    }

    fn get(&self, path: &str) -> Result<Reply, ServiceError> {
        let url = self.url(path);
        send(ureq::get(&url).timeout(self.timeout).call())
    }

    fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<Reply, ServiceError> {
        let url = self.url(path);
        send(ureq::post(&url).timeout(self.timeout).send_json(body))
    }

    /// Run one call, then trace and log its outcome.
    fn observe<T>(
        &self,
        operation: &str,
        call: impl FnOnce() -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let start = Instant::now();
        let result = call();
        let latency_ms = start.elapsed().as_millis() as u64;

        let outcome = match &result {
            Ok(_) => {
                tracing::debug!(operation, latency_ms, "scoring service call succeeded");
                "ok"
            }
            Err(e) => {
                tracing::warn!(operation, latency_ms, error = %e, "scoring service call failed");
                e.kind().as_str()
            }
        };

        if self.record_calls {
            calls::record(operation, outcome, latency_ms);
        }

        result
    }
}

impl ScoringService for ServiceClient {
    fn health(&self) -> ConnectionState {
        let result = self.observe("health", || {
            let reply = self.get("/health")?;
            match wire::decode_health(reply.status, &reply.body) {
                ConnectionState::Disconnected => Err(ServiceError::bad_response(format!(
                    "health check returned HTTP {}",
                    reply.status
                ))),
                connected => Ok(connected),
            }
        });
        result.unwrap_or(ConnectionState::Disconnected)
    }

    fn score(&self, features: &CustomerFeatures) -> Result<ScoreResult, ServiceError> {
        self.observe("score", || {
            let reply = self.post_json("/api/score", features)?;
            wire::decode_score(&expect_success(reply)?)
        })
    }

    fn stats(&self) -> Result<ModelStats, ServiceError> {
        self.observe("stats", || {
            let reply = self.get("/api/stats")?;
            wire::decode_stats(&expect_success(reply)?)
        })
    }
}

/// Normalize a `ureq` result into a reply or a tagged failure.
///
/// `ureq` reports 4xx/5xx as `Error::Status`; those are returned as a reply
/// with the status so callers decide. Reading the body can still fail
/// mid-stream (including on timeout), which counts as a network failure.
fn send(result: Result<ureq::Response, ureq::Error>) -> Result<Reply, ServiceError> {
    let response = match result {
        Ok(resp) => resp,
        Err(ureq::Error::Status(_, resp)) => resp,
        Err(ureq::Error::Transport(t)) => return Err(ServiceError::Network(t.to_string())),
    };

    let status = response.status();
    let body = response
        .into_string()
        .map_err(|e| ServiceError::Network(format!("failed to read response body: {e}")))?;

    Ok(Reply { status, body })
}

/// Require a 2xx status and hand back the body.
fn expect_success(reply: Reply) -> Result<String, ServiceError> {
    if (200..300).contains(&reply.status) {
        Ok(reply.body)
    } else {
        Err(ServiceError::bad_response(format!(
            "HTTP {}",
            reply.status
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_default_config() {
        let config = LeadscopeConfig::default();
        let client = ServiceClient::from_config(&config);
        assert_eq!(client.base_url, "http://localhost:8000");
        assert_eq!(client.timeout, Duration::from_millis(10_000));
        assert!(client.record_calls);
    }

    #[test]
    fn client_strips_trailing_slash() {
        let client = ServiceClient::new("http://localhost:8000/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert!(!client.record_calls);
    }

    #[test]
    fn url_rewrites_localhost() {
        let client = ServiceClient::new("http://localhost:8000", Duration::from_secs(1));
        assert_eq!(client.url("/health"), "http://127.0.0.1:8000/health");
    }

    #[test]
    fn non_success_status_is_bad_response() {
        let err = expect_success(Reply {
            status: 503,
            body: "{}".into(),
        })
        .unwrap_err();
        assert_eq!(err, ServiceError::BadResponse("HTTP 503".into()));
    }
}
