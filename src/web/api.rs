//! Request handlers for the dashboard server.
//!
//! Each handler builds a complete `Response<Cursor<Vec<u8>>>`. The service
//! client is passed in, so the handlers work with any [`ScoringService`].

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Response, StatusCode};

use crate::client::ScoringService;
use crate::dashboard::DashboardShell;
use crate::features::{FieldError, RawFormValues};
use crate::form::{FormState, ScoringFormController};

use super::{content_type_html, content_type_json, frontend};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitState {
    Success,
    Failed,
    Invalid,
}

/// `POST /score` response: the outcome plus the result panel markup.
#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub state: SubmitState,
    pub html: String,
    pub field_errors: Vec<FieldError>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json()?)
        .with_status_code(StatusCode(status)))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /` — health check, then either the remediation page or the full
/// dashboard with its stats panel loaded.
pub fn get_index<S: ScoringService>(
    client: &S,
    top_features: usize,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let shell = DashboardShell::load(client, top_features);
    let html = frontend::render_page(&shell.view());
    Ok(Response::from_data(html.into_bytes())
        .with_header(content_type_html()?)
        .with_status_code(StatusCode(200)))
}

/// `POST /score` — validate the raw form strings and score the customer.
///
/// Expects a JSON object of field name to input text, e.g.
/// `{ "customer_id": "12345", "total_spent": "5000", ... }`.
pub fn post_score<S: ScoringService>(client: &S, body: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let raw: RawFormValues = match serde_json::from_str(body) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "rejecting malformed score request body");
            let error = serde_json::json!({ "error": format!("invalid JSON in score request: {e}") });
            return json_response(400, &error);
        }
    };

    let (status, resp) = score_submission(client, &raw);
    json_response(status, &resp)
}

/// Run one form cycle and describe the outcome.
pub fn score_submission<S: ScoringService>(client: &S, raw: &RawFormValues) -> (u16, ScoreResponse) {
    let mut form = ScoringFormController::new(client);
    match form.submit(raw) {
        Ok(FormState::Success(view)) => (
            200,
            ScoreResponse {
                state: SubmitState::Success,
                html: frontend::render_result(view),
                field_errors: Vec::new(),
            },
        ),
        Ok(FormState::Failed { message }) => (
            200,
            ScoreResponse {
                state: SubmitState::Failed,
                html: frontend::render_failure(message),
                field_errors: Vec::new(),
            },
        ),
        // `submit` always resolves its own ticket.
        Ok(other) => {
            tracing::warn!(state = ?other, "score submission ended unresolved");
            (
                500,
                ScoreResponse {
                    state: SubmitState::Failed,
                    html: frontend::render_failure(
                        crate::error::DashboardFailure::Submission.user_message(),
                    ),
                    field_errors: Vec::new(),
                },
            )
        }
        Err(field_errors) => (
            422,
            ScoreResponse {
                state: SubmitState::Invalid,
                html: frontend::render_field_errors(&field_errors),
                field_errors,
            },
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
