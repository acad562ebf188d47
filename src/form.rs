/// Scoring form controller.
///
/// Drives one form through its lifecycle:
///
/// ```text
/// Idle ──submit──▶ Submitting ──ok──▶ Success ──submit──▶ Submitting …
///                       └─────err──▶ Failed  ──submit──▶ Submitting …
/// ```
///
/// Raw text is validated before anything goes on the wire; invalid input
/// leaves the state untouched and records field errors instead. The loading
/// indicator is visible exactly while the state is `Submitting`.
///
/// Submissions may overlap. Each one gets a [`Ticket`]; only the response
/// for the most recent ticket is applied, older ones are dropped when they
/// arrive. [`ScoringFormController::submit`] runs a whole cycle inline;
/// [`begin`](ScoringFormController::begin) and
/// [`resolve`](ScoringFormController::resolve) split it for callers that
/// perform the request elsewhere.
use crate::client::{ScoreResult, ScoringService};
use crate::error::{DashboardFailure, ServiceError};
use crate::features::{CustomerFeatures, FieldError, RawFormValues};
use crate::segment::{self, Segment};

/// Sequence number of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// What the result panel shows after a successful score.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub icon: &'static str,
    /// Segment label, original casing.
    pub label: String,
    /// Lower-case theme key (`hot` / `warm` / `cold`).
    pub theme: &'static str,
    /// Whole-number score out of 100, e.g. `"82/100"`.
    pub score: String,
    /// Recommendation text, verbatim.
    pub recommendation: String,
    pub customer_id: Option<u64>,
}

impl ResultView {
    /// Build the view from a service response.
    ///
    /// The theme follows the received label regardless of case. A label the
    /// classifier does not know falls back to the Cold styling.
    pub fn from_result(result: &ScoreResult) -> Self {
        let theme = result.theme().unwrap_or(Segment::Cold);
        Self {
            icon: theme.icon(),
            label: result.segment.clone(),
            theme: theme.theme(),
            score: segment::format_score(result.score),
            recommendation: result.recommendation.clone(),
            customer_id: result.customer_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
    Idle,
    Submitting { ticket: Ticket },
    Success(ResultView),
    Failed { message: &'static str },
}

/// A validated submission waiting for its response.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingScore {
    pub ticket: Ticket,
    pub features: CustomerFeatures,
}

pub struct ScoringFormController<'a, S: ScoringService> {
    client: &'a S,
    state: FormState,
    field_errors: Vec<FieldError>,
    next_ticket: u64,
}

impl<'a, S: ScoringService> ScoringFormController<'a, S> {
    pub fn new(client: &'a S) -> Self {
        Self {
            client,
            state: FormState::Idle,
            field_errors: Vec::new(),
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Field errors from the last rejected submission.
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn loading_visible(&self) -> bool {
        matches!(self.state, FormState::Submitting { .. })
    }

    /// The result panel contents, when the last cycle succeeded.
    pub fn result(&self) -> Option<&ResultView> {
        match &self.state {
            FormState::Success(view) => Some(view),
            _ => None,
        }
    }

    /// Validate and start a submission.
    ///
    /// On invalid input nothing is sent and the state is kept; the errors
    /// are returned and also available from
    /// [`field_errors`](Self::field_errors). On success the previous result
    /// is hidden and the form enters `Submitting` with a fresh ticket.
    pub fn begin(&mut self, raw: &RawFormValues) -> Result<PendingScore, Vec<FieldError>> {
        let features = match CustomerFeatures::from_raw(raw) {
            Ok(f) => f,
            Err(errors) => {
                tracing::debug!(count = errors.len(), "score submission blocked by field errors");
                self.field_errors = errors.clone();
                return Err(errors);
            }
        };

        self.field_errors.clear();
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.state = FormState::Submitting { ticket };

        Ok(PendingScore { ticket, features })
    }

    /// Apply the outcome of a submission.
    ///
    /// Returns `false` (and changes nothing) when `ticket` is not the
    /// submission currently in flight.
    pub fn resolve(&mut self, ticket: Ticket, outcome: Result<ScoreResult, ServiceError>) -> bool {
        match self.state {
            FormState::Submitting { ticket: current } if current == ticket => {}
            _ => {
                tracing::debug!(?ticket, "discarding stale score response");
                return false;
            }
        }

        self.state = match outcome {
            Ok(result) => {
                if !result.is_consistent() {
                    tracing::warn!(
                        score = result.score,
                        segment = %result.segment,
                        "service segment disagrees with score band"
                    );
                }
                FormState::Success(ResultView::from_result(&result))
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind().as_str(), "score request failed");
                FormState::Failed {
                    message: DashboardFailure::Submission.user_message(),
                }
            }
        };
        true
    }

    /// Run a complete cycle: validate, call the service, apply the outcome.
    pub fn submit(&mut self, raw: &RawFormValues) -> Result<&FormState, Vec<FieldError>> {
        let pending = self.begin(raw)?;
        let outcome = self.client.score(&pending.features);
        self.resolve(pending.ticket, outcome);
        Ok(&self.state)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
