//! CLI command implementations for leadscope.
//!
//! Provides subcommand handlers for:
//! - `leadscope health` — scoring service status, config files, call log summary
//! - `leadscope score ...` — score one customer from the terminal
//! - `leadscope stats` — model type and top feature importances
//! - `leadscope batch FILE` — score a JSON array of customers in one call
//! - `leadscope load-model [PATH]` — ask the service to load a model file
//! - `leadscope config show|init|set|reset` — configuration management
//!
//! The terminal commands go through the same health gate as the dashboard:
//! when the service is down they print the remediation steps and exit
//! non-zero without issuing any further call.

use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::batch::{BatchInput, BatchReport};
use crate::calls;
use crate::client::{ScoreResult, ScoringService, ServiceClient};
use crate::config::{self, LeadscopeConfig};
use crate::dashboard::{Banner, DashboardShell, REMEDIATION_STEPS};
use crate::error::DashboardFailure;
use crate::features::{CustomerFeatures, FieldError, RawFormValues};
use crate::form::{FormState, ResultView, ScoringFormController};
use crate::segment::Segment;
use crate::stats::{FeatureBar, StatsPanel, StatsPanelController};

/// Output format for data commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Width of the importance bars in table output.
const BAR_WIDTH: usize = 30;

// ---------------------------------------------------------------------------
// leadscope health
// ---------------------------------------------------------------------------

/// Check the scoring service and local setup.
pub fn run_health(cfg: &LeadscopeConfig) -> Result<()> {
    println!("{}", "leadscope Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let client = ServiceClient::from_config(cfg);
    let state = client.health();
    let banner = Banner::for_state(state);

    print_health_item("Scoring service", banner.connected, client.base_url());
    match state.model_loaded() {
        Some(loaded) => print_health_item(
            "Model",
            loaded,
            if loaded {
                "loaded"
            } else {
                "not loaded (run `leadscope load-model`)"
            },
        ),
        None => print_health_item("Model", false, "unknown (service unreachable)"),
    }
    print_health_item(
        "Timeout",
        true,
        &format!("{} ms", client.timeout().as_millis()),
    );

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.leadscope/config.toml found"
        } else {
            "not found (run `leadscope config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".leadscope.toml found"
        } else {
            "none (optional)"
        },
    );

    print_call_log_summary(cfg);

    if !banner.connected {
        println!();
        print_remediation();
    }

    Ok(())
}

fn print_call_log_summary(cfg: &LeadscopeConfig) {
    if !cfg.logging.call_log {
        print_health_item("Call log", true, "disabled (logging.call_log = false)");
        return;
    }

    let entries = calls::read_all_entries();
    if entries.is_empty() {
        print_health_item("Call log", true, "no calls recorded yet");
        return;
    }

    print_health_item("Call log", true, &format!("{} calls recorded", entries.len()));
    println!();
    println!(
        "  {:<14} {:>7} {:>9} {:>12}",
        "Operation", "Calls", "Failures", "Avg latency"
    );
    println!("  {}", "-".repeat(45));
    for (i, summary) in calls::summarize(&entries).iter().enumerate() {
        let line = format!(
            "  {:<14} {:>7} {:>9} {:>9.0} ms",
            summary.operation, summary.calls, summary.failures, summary.avg_latency_ms
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<18} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// Health gate
// ---------------------------------------------------------------------------

/// Run the health check and refuse to continue when the service is down.
fn require_connection<'a>(
    client: &'a ServiceClient,
    cfg: &LeadscopeConfig,
) -> Result<DashboardShell<'a, ServiceClient>> {
    let shell = DashboardShell::load(client, cfg.dashboard.top_features);
    print_banner(&shell.banner());
    if !shell.connection().is_connected() {
        print_remediation();
        bail!("scoring service unreachable at {}", client.base_url());
    }
    Ok(shell)
}

fn print_banner(banner: &Banner) {
    let text = if banner.connected {
        banner.text.green()
    } else {
        banner.text.red()
    };
    eprintln!("{} {}", "●".bold(), text);
}

fn print_remediation() {
    println!(
        "{}",
        DashboardFailure::Connectivity.user_message().yellow()
    );
    for (i, step) in REMEDIATION_STEPS.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
}

// ---------------------------------------------------------------------------
// leadscope score
// ---------------------------------------------------------------------------

/// Score one customer given as raw field text.
pub fn run_score(cfg: &LeadscopeConfig, raw: &RawFormValues, format: OutputFormat) -> Result<()> {
    let client = ServiceClient::from_config(cfg);
    require_connection(&client, cfg)?;

    let mut form = ScoringFormController::new(&client);
    let pending = match form.begin(raw) {
        Ok(pending) => pending,
        Err(errors) => {
            print_field_errors(&errors);
            bail!("{} invalid field(s)", errors.len());
        }
    };

    let outcome = client.score(&pending.features);
    let received = outcome.as_ref().ok().cloned();
    form.resolve(pending.ticket, outcome);

    match (form.state(), received) {
        (FormState::Success(view), Some(result)) => {
            match format {
                OutputFormat::Json => print_score_json(&pending.features, &result)?,
                OutputFormat::Table => print_score_table(&pending.features, view),
            }
            Ok(())
        }
        (FormState::Failed { message }, _) => {
            println!("{} {}", "✗".red().bold(), message.red());
            bail!("score request failed");
        }
        (state, _) => bail!("score request ended in unexpected state {state:?}"),
    }
}

fn print_score_table(features: &CustomerFeatures, view: &ResultView) {
    let segment = Segment::from_label(&view.label).unwrap_or(Segment::Cold);
    let title = match view.customer_id {
        Some(id) => format!("Lead Score: customer #{id}"),
        None => format!("Lead Score: customer #{}", features.customer_id),
    };

    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("  {} {}", view.icon, colorize_segment(segment, &view.label).bold());
    println!("  {} {}", "Score:          ".bold(), view.score);
    println!("  {} {}", "Priority:       ".bold(), segment.priority());
    println!(
        "  {} {:.1}%",
        "Email open rate:".bold(),
        features.email_open_rate() * 100.0
    );
    println!();
    println!("  {}", "Recommendation".bold().cyan());
    println!("  {}", view.recommendation);
    println!();
    println!("  {} {}", "Next step:".dimmed(), segment.guidance().dimmed());
}

fn print_score_json(features: &CustomerFeatures, result: &ScoreResult) -> Result<()> {
    let segment = result.theme();
    let value = serde_json::json!({
        "customer_id": result.customer_id.unwrap_or(features.customer_id),
        "score": result.score,
        "segment": result.segment,
        "priority": segment.map(|s| s.priority().label()),
        "recommendation": result.recommendation,
        "email_open_rate": features.email_open_rate(),
        "consistent": result.is_consistent(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_field_errors(errors: &[FieldError]) {
    println!("{}", "Check the input:".yellow().bold());
    for error in errors {
        println!("  {} {:<26} {}", "✗".red(), error.field, error.message);
    }
}

// ---------------------------------------------------------------------------
// leadscope stats
// ---------------------------------------------------------------------------

/// Show the model type and its top feature importances.
pub fn run_stats(cfg: &LeadscopeConfig, top: Option<usize>, format: OutputFormat) -> Result<()> {
    let client = ServiceClient::from_config(cfg);
    require_connection(&client, cfg)?;

    let top_n = top.unwrap_or(cfg.dashboard.top_features);
    match StatsPanelController::mount(&client, top_n) {
        StatsPanel::Loaded { stats, bars } => {
            match format {
                OutputFormat::Json => {
                    let value = serde_json::json!({
                        "model_type": stats.model_type,
                        "n_estimators": stats.n_estimators,
                        "top_features": bars,
                        "segments": stats
                            .segments
                            .iter()
                            .map(|(name, band)| serde_json::json!({ "segment": name, "band": band }))
                            .collect::<Vec<_>>(),
                    });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                OutputFormat::Table => {
                    println!("{}", "Model Statistics".bold().cyan());
                    println!("{}", "=".repeat(60));
                    println!();
                    println!("  {} {}", "Model type:  ".bold(), stats.model_type);
                    if let Some(n) = stats.n_estimators {
                        println!("  {} {}", "Estimators:  ".bold(), n);
                    }
                    println!();
                    print_feature_bars(&bars);
                    if !stats.segments.is_empty() {
                        println!();
                        println!("{}", "Segments".bold().cyan());
                        for (name, band) in &stats.segments {
                            println!("  {:<10} {}", name, band.dimmed());
                        }
                    }
                }
            }
            Ok(())
        }
        StatsPanel::Failed { message } => {
            println!("{} {}", "✗".red().bold(), message.red());
            bail!("model statistics unavailable");
        }
    }
}

fn print_feature_bars(bars: &[FeatureBar]) {
    println!("{}", "Top Features".bold().cyan());
    if bars.is_empty() {
        println!("  {}", "No feature importances published.".dimmed());
        return;
    }
    for bar in bars {
        println!(
            "  {:<26} {} {:>6}",
            truncate(&bar.name, 26),
            render_bar(bar.width_pct).magenta(),
            bar.label()
        );
    }
}

/// Draw a proportional bar for a percentage in `0..=100`.
fn render_bar(width_pct: f64) -> String {
    let filled = ((width_pct / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "·".repeat(BAR_WIDTH - filled))
}

// ---------------------------------------------------------------------------
// leadscope batch
// ---------------------------------------------------------------------------

/// Score every customer in a JSON file with one batch request.
pub fn run_batch(cfg: &LeadscopeConfig, file: &Path, format: OutputFormat) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let BatchInput(customers) = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of customers", file.display()))?;
    if customers.is_empty() {
        println!("{}", "No customers in the input file.".yellow());
        return Ok(());
    }

    let client = ServiceClient::from_config(cfg);
    require_connection(&client, cfg)?;

    let report = match client.batch_score(&customers) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(error = %e, "batch scoring failed");
            println!(
                "{} {}",
                "✗".red().bold(),
                DashboardFailure::Submission.user_message().red()
            );
            bail!("batch request failed");
        }
    };

    if !report.statistics_agree() {
        tracing::warn!("batch statistics disagree with the per-customer results");
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_batch_table(&report),
    }
    Ok(())
}

fn print_batch_table(report: &BatchReport) {
    println!("{}", "Batch Scoring Report".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("  {:<12} {:>8}   Segment", "Customer", "Score");
    println!("  {}", "-".repeat(36));

    let mut ranked: Vec<_> = report.results.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    for (i, entry) in ranked.iter().enumerate() {
        let segment = Segment::from_label(&entry.segment).unwrap_or(Segment::Cold);
        let line = format!(
            "  {:<12} {:>8.1}   {} {}",
            entry.customer_id,
            entry.score,
            segment.icon(),
            entry.segment
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }

    let stats = &report.statistics;
    println!();
    println!("  {} {}", "Customers:    ".bold(), stats.total_clients);
    println!(
        "  {} {}  {} {}  {} {}",
        "Hot:".red().bold(),
        stats.hot_leads,
        "Warm:".yellow().bold(),
        stats.warm_leads,
        "Cold:".blue().bold(),
        stats.cold_leads
    );
    println!("  {} {:.1}", "Average score:".bold(), stats.average_score);
}

// ---------------------------------------------------------------------------
// leadscope load-model
// ---------------------------------------------------------------------------

/// Ask the service to load a model file.
pub fn run_load_model(cfg: &LeadscopeConfig, model_path: &str) -> Result<()> {
    let client = ServiceClient::from_config(cfg);
    require_connection(&client, cfg)?;

    match client.load_model(model_path) {
        Ok(message) => {
            println!("{} {}", "✓".green().bold(), message);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, model_path, "load_model failed");
            bail!("the scoring service could not load {model_path}");
        }
    }
}

// ---------------------------------------------------------------------------
// leadscope config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective leadscope Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.leadscope/config.toml", global_exists);
    print_source(".leadscope.toml", project_exists);
    print_source(
        config::SERVICE_URL_ENV,
        std::env::var_os(config::SERVICE_URL_ENV).is_some(),
    );

    Ok(())
}

fn print_source(name: &str, present: bool) {
    if present {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not set)").dimmed());
    }
}

/// Initialize a default config file at `~/.leadscope/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point at your scoring service.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn colorize_segment(segment: Segment, label: &str) -> colored::ColoredString {
    match segment {
        Segment::Hot => label.red(),
        Segment::Warm => label.yellow(),
        Segment::Cold => label.blue(),
    }
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_defaults_to_table() {
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("table")), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
    }

    #[test]
    fn bar_scales_to_width() {
        assert_eq!(render_bar(0.0), "·".repeat(BAR_WIDTH));
        assert_eq!(render_bar(100.0), "█".repeat(BAR_WIDTH));
        assert_eq!(render_bar(40.0).chars().filter(|c| *c == '█').count(), 12);
    }

    #[test]
    fn bar_never_overflows() {
        assert_eq!(render_bar(250.0).chars().count(), BAR_WIDTH);
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("total_spent", 20), "total_spent");
        assert_eq!(truncate("days_since_last_contact", 10), "days_sinc…");
        assert_eq!(truncate("€€€€", 3), "€€…");
    }
}
