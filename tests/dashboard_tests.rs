/// Integration tests for the dashboard controllers.
///
/// Unit tests for individual modules live in each file's `#[cfg(test)]`
/// block. These tests drive the shell, form and stats panel together against
/// an in-memory service that counts every call:
///
/// - Health gating (nothing mounted, nothing called, when disconnected)
/// - Form lifecycle from raw text to rendered result
/// - Stats ranking as shown on the page
use std::cell::{Cell, RefCell};

use leadscope::client::{ConnectionState, FeatureWeight, ModelStats, ScoreResult, ScoringService};
use leadscope::dashboard::{DashboardShell, REMEDIATION_STEPS, ShellView};
use leadscope::error::{DashboardFailure, ServiceError};
use leadscope::features::{CustomerFeatures, RawFormValues};
use leadscope::form::FormState;
use leadscope::stats::StatsPanel;
use leadscope::web::frontend;
use serde_json::json;

// ---------------------------------------------------------------------------
// Counting service
// ---------------------------------------------------------------------------

struct CountingService {
    connection: ConnectionState,
    score_reply: Result<ScoreResult, ServiceError>,
    stats_reply: Result<ModelStats, ServiceError>,
    health_calls: Cell<usize>,
    score_calls: Cell<usize>,
    stats_calls: Cell<usize>,
    last_payload: RefCell<Option<CustomerFeatures>>,
}

impl CountingService {
    fn new(connection: ConnectionState) -> Self {
        Self {
            connection,
            score_reply: Ok(ScoreResult::new(82.0, "Hot", "Call now")),
            stats_reply: Ok(ranked_stats()),
            health_calls: Cell::new(0),
            score_calls: Cell::new(0),
            stats_calls: Cell::new(0),
            last_payload: RefCell::new(None),
        }
    }

    fn connected() -> Self {
        Self::new(ConnectionState::Connected { model_loaded: true })
    }

    fn disconnected() -> Self {
        Self::new(ConnectionState::Disconnected)
    }
}

impl ScoringService for CountingService {
    fn health(&self) -> ConnectionState {
        self.health_calls.set(self.health_calls.get() + 1);
        self.connection
    }

    fn score(&self, features: &CustomerFeatures) -> Result<ScoreResult, ServiceError> {
        self.score_calls.set(self.score_calls.get() + 1);
        *self.last_payload.borrow_mut() = Some(features.clone());
        self.score_reply.clone()
    }

    fn stats(&self) -> Result<ModelStats, ServiceError> {
        self.stats_calls.set(self.stats_calls.get() + 1);
        self.stats_reply.clone()
    }
}

fn ranked_stats() -> ModelStats {
    let weights = [
        ("total_spent", 0.4),
        ("emails_opened", 0.3),
        ("website_visits", 0.2),
        ("total_contacts", 0.1),
        ("customer_age_days", 0.0),
        ("extra", 0.05),
    ];
    ModelStats {
        model_type: "RandomForestClassifier".to_string(),
        feature_importance: weights
            .iter()
            .map(|(name, importance)| FeatureWeight {
                name: name.to_string(),
                importance: *importance,
            })
            .collect(),
        n_estimators: Some(100),
        segments: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Health gating
// ---------------------------------------------------------------------------

#[test]
fn disconnected_shows_only_remediation() {
    let svc = CountingService::disconnected();
    let shell = DashboardShell::load(&svc, 5);

    assert!(!shell.banner().connected);
    assert!(shell.mount().is_none());

    match shell.view() {
        ShellView::Remediation { message, steps, .. } => {
            assert_eq!(message, DashboardFailure::Connectivity.user_message());
            assert_eq!(steps, &REMEDIATION_STEPS);
        }
        ShellView::Connected { .. } => panic!("disconnected shell mounted its panels"),
    }

    assert_eq!(svc.health_calls.get(), 1);
    assert_eq!(svc.score_calls.get(), 0);
    assert_eq!(svc.stats_calls.get(), 0);
}

#[test]
fn disconnected_page_has_no_form_or_stats() {
    let svc = CountingService::disconnected();
    let shell = DashboardShell::load(&svc, 5);
    let html = frontend::render_page(&shell.view());

    assert!(html.contains("disconnected"));
    assert!(html.contains(REMEDIATION_STEPS[2]));
    assert!(!html.contains("scoringForm"));
    assert!(!html.contains("modelStats"));
    assert_eq!(svc.stats_calls.get(), 0);
}

#[test]
fn connected_mounts_form_and_stats() {
    let svc = CountingService::connected();
    let shell = DashboardShell::load(&svc, 5);

    let panels = shell.mount().expect("connected shell mounts");
    assert_eq!(panels.form.state(), &FormState::Idle);
    assert!(matches!(panels.stats, StatsPanel::Loaded { .. }));
    assert_eq!(svc.stats_calls.get(), 1);
    assert_eq!(svc.score_calls.get(), 0);
}

#[test]
fn model_not_loaded_is_informational_only() {
    let svc = CountingService::new(ConnectionState::Connected {
        model_loaded: false,
    });
    let shell = DashboardShell::load(&svc, 5);

    assert!(shell.banner().text.contains("not loaded"));
    assert!(matches!(shell.view(), ShellView::Connected { .. }));
}

#[test]
fn health_runs_once_per_load() {
    let svc = CountingService::connected();
    let shell = DashboardShell::load(&svc, 5);
    let _ = shell.view();
    let _ = shell.banner();
    assert_eq!(svc.health_calls.get(), 1);
}

// ---------------------------------------------------------------------------
// Form lifecycle
// ---------------------------------------------------------------------------

#[test]
fn raw_strings_become_typed_payload() {
    let raw: RawFormValues = serde_json::from_value(json!({
        "customer_id": "12345",
        "days_since_last_contact": "15",
        "total_contacts": "25",
        "total_spent": "5000",
        "emails_sent": "50",
        "emails_opened": "35",
        "website_visits": "120",
        "customer_age_days": "365"
    }))
    .unwrap();

    let svc = CountingService::connected();
    let shell = DashboardShell::load(&svc, 5);
    let mut panels = shell.mount().unwrap();
    panels.form.submit(&raw).unwrap();

    let sent = svc.last_payload.borrow().clone().unwrap();
    let wire = serde_json::to_value(&sent).unwrap();
    assert_eq!(
        wire,
        json!({
            "customer_id": 12345,
            "days_since_last_contact": 15,
            "total_contacts": 25,
            "total_spent": 5000.0,
            "emails_sent": 50,
            "emails_opened": 35,
            "website_visits": 120,
            "customer_age_days": 365
        })
    );
    assert!(wire["customer_id"].is_u64());
    assert!(wire["total_spent"].is_f64());
}

#[test]
fn hot_result_renders_icon_score_and_recommendation() {
    let svc = CountingService::connected();
    let shell = DashboardShell::load(&svc, 5);
    let mut panels = shell.mount().unwrap();

    let state = panels.form.submit(&RawFormValues::sample()).unwrap();
    let FormState::Success(view) = state else {
        panic!("expected success, got {state:?}");
    };

    let html = frontend::render_result(view);
    assert!(html.contains("🔥"));
    assert!(html.contains("82/100"));
    assert!(html.contains("Call now"));
}

#[test]
fn timed_out_score_fails_with_loader_hidden() {
    let mut svc = CountingService::connected();
    svc.score_reply = Err(ServiceError::Network("timed out reading response".into()));
    let shell = DashboardShell::load(&svc, 5);
    let mut panels = shell.mount().unwrap();

    let state = panels.form.submit(&RawFormValues::sample()).unwrap().clone();
    assert_eq!(
        state,
        FormState::Failed {
            message: DashboardFailure::Submission.user_message()
        }
    );
    assert!(!panels.form.loading_visible());
    assert!(panels.form.result().is_none());
}

#[test]
fn empty_field_blocks_submission() {
    let svc = CountingService::connected();
    let shell = DashboardShell::load(&svc, 5);
    let mut panels = shell.mount().unwrap();

    let raw = RawFormValues::sample().with("days_since_last_contact", "  ");
    let errors = panels.form.submit(&raw).unwrap_err();
    assert_eq!(errors[0].field, "days_since_last_contact");
    assert_eq!(svc.score_calls.get(), 0);
}

#[test]
fn resubmitting_after_failure_recovers() {
    let mut svc = CountingService::connected();
    svc.score_reply = Err(ServiceError::BadResponse("HTTP 500".into()));
    let shell = DashboardShell::load(&svc, 5);
    let mut panels = shell.mount().unwrap();
    panels.form.submit(&RawFormValues::sample()).unwrap();
    assert!(matches!(panels.form.state(), FormState::Failed { .. }));

    // A fresh controller over a recovered service.
    let recovered = CountingService::connected();
    let shell = DashboardShell::load(&recovered, 5);
    let mut panels = shell.mount().unwrap();
    panels.form.submit(&RawFormValues::sample()).unwrap();
    assert_eq!(panels.form.result().unwrap().score, "82/100");
}

// ---------------------------------------------------------------------------
// Stats panel
// ---------------------------------------------------------------------------

#[test]
fn stats_panel_ranks_top_five() {
    let svc = CountingService::connected();
    let shell = DashboardShell::load(&svc, 5);
    let panels = shell.mount().unwrap();

    let StatsPanel::Loaded { stats, bars } = panels.stats else {
        panic!("stats should load");
    };
    assert_eq!(stats.model_type, "RandomForestClassifier");

    let shown: Vec<(String, String)> = bars.iter().map(|b| (b.name.clone(), b.label())).collect();
    assert_eq!(
        shown,
        vec![
            ("total_spent".to_string(), "40.0%".to_string()),
            ("emails_opened".to_string(), "30.0%".to_string()),
            ("website_visits".to_string(), "20.0%".to_string()),
            ("total_contacts".to_string(), "10.0%".to_string()),
            ("extra".to_string(), "5.0%".to_string()),
        ]
    );
    assert!(bars.iter().all(|b| b.name != "customer_age_days"));
}

#[test]
fn stats_failure_keeps_form_usable() {
    let mut svc = CountingService::connected();
    svc.stats_reply = Err(ServiceError::Network("connection reset".into()));
    let shell = DashboardShell::load(&svc, 5);
    let mut panels = shell.mount().unwrap();

    assert_eq!(
        panels.stats,
        StatsPanel::Failed {
            message: DashboardFailure::Stats.user_message()
        }
    );
    assert!(panels.form.submit(&RawFormValues::sample()).is_ok());
    assert_eq!(svc.stats_calls.get(), 1);
}

#[test]
fn connected_page_renders_form_defaults_and_bars() {
    let svc = CountingService::connected();
    let shell = DashboardShell::load(&svc, 3);
    let html = frontend::render_page(&shell.view());

    assert!(html.contains("id=\"scoringForm\""));
    assert!(html.contains("value=\"12345\""));
    assert!(html.contains("width: 40.0%;"));
    assert!(html.contains("width: 20.0%;"));
    // Only the top three bars.
    assert!(!html.contains("width: 10.0%;"));
}
