//! Server-rendered HTML for the leadscope dashboard.
//!
//! The page is assembled per request from the shell's view. Styles and the
//! small submit script are compiled into the binary; no external assets, no
//! build tools, no CDN dependencies.

use crate::client::ScoringService;
use crate::dashboard::{Banner, ShellView};
use crate::features::{FieldError, RawFormValues};
use crate::form::ResultView;
use crate::segment::Segment;
use crate::stats::StatsPanel;

/// Form inputs: field name, label, `step` attribute.
const FORM_FIELDS: [(&str, &str, &str); 8] = [
    ("customer_id", "Customer ID", "1"),
    ("days_since_last_contact", "Days since last contact", "1"),
    ("total_contacts", "Total contacts", "1"),
    ("total_spent", "Total spent (€)", "0.01"),
    ("emails_sent", "Emails sent", "1"),
    ("emails_opened", "Emails opened", "1"),
    ("website_visits", "Website visits", "1"),
    ("customer_age_days", "Customer age (days)", "1"),
];

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
  background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
  min-height: 100vh;
  padding: 20px;
}
.container { max-width: 1400px; margin: 0 auto; }
.header, .card, .info-section {
  background: white;
  border-radius: 15px;
  box-shadow: 0 5px 15px rgba(0,0,0,0.1);
}
.header { padding: 30px; margin-bottom: 30px; }
.header h1 { color: #667eea; font-size: 2.5em; margin-bottom: 10px; }
.header p { color: #666; font-size: 1.1em; }
.api-status {
  display: inline-flex; align-items: center; gap: 10px;
  padding: 10px 20px; border-radius: 25px; font-weight: bold; margin-top: 15px;
}
.api-status.connected { background: #d4edda; color: #155724; }
.api-status.disconnected { background: #f8d7da; color: #721c24; }
.api-status-dot { width: 12px; height: 12px; border-radius: 50%; }
.connected .api-status-dot { background: #28a745; }
.disconnected .api-status-dot { background: #dc3545; }
.dashboard {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(350px, 1fr));
  gap: 25px; margin-bottom: 30px;
}
.card { padding: 25px; }
.card-title { font-size: 1.3em; color: #333; margin-bottom: 20px; }
.form-group { margin-bottom: 20px; }
.form-group label { display: block; margin-bottom: 8px; color: #555; font-weight: 600; }
.form-group input {
  width: 100%; padding: 12px; border: 2px solid #e0e0e0;
  border-radius: 8px; font-size: 1em;
}
.btn {
  background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
  color: white; padding: 15px 30px; border: none; border-radius: 8px;
  font-size: 1.1em; font-weight: bold; cursor: pointer; width: 100%;
}
.loader {
  display: none; border: 4px solid #f3f3f3; border-top: 4px solid #667eea;
  border-radius: 50%; width: 40px; height: 40px;
  animation: spin 1s linear infinite; margin: 20px auto;
}
@keyframes spin { 0% { transform: rotate(0deg); } 100% { transform: rotate(360deg); } }
#result { display: none; margin-top: 25px; }
.result-card { padding: 20px; border-radius: 10px; }
.result-card.hot { background: linear-gradient(135deg, #ff6b6b 0%, #ee5a6f 100%); color: white; }
.result-card.warm { background: linear-gradient(135deg, #feca57 0%, #ff9ff3 100%); color: #333; }
.result-card.cold { background: linear-gradient(135deg, #54a0ff 0%, #00d2d3 100%); color: white; }
.result-card.error, .result-card.invalid { background: #f8d7da; color: #721c24; }
.result-card h3 { font-size: 1.5em; margin-bottom: 15px; }
.score-display { font-size: 3em; font-weight: bold; margin: 20px 0; }
.recommendation {
  font-size: 1.1em; line-height: 1.6; margin-top: 15px; padding: 15px;
  background: rgba(255,255,255,0.2); border-radius: 8px;
}
.stat-item { background: #f8f9fa; padding: 15px; border-radius: 8px; text-align: center; }
.stat-value { font-size: 2em; font-weight: bold; color: #667eea; }
.stat-label { color: #666; font-size: 0.9em; margin-top: 5px; }
.feature-row { margin-bottom: 10px; }
.feature-head { display: flex; justify-content: space-between; margin-bottom: 5px; color: #666; }
.feature-head .pct { color: #667eea; font-weight: bold; }
.bar-track { background: #e0e0e0; height: 8px; border-radius: 4px; overflow: hidden; }
.bar-fill { background: linear-gradient(90deg, #667eea, #764ba2); height: 100%; }
.stats-error, .muted { text-align: center; }
.stats-error { color: #dc3545; }
.info-section { padding: 30px; margin-top: 30px; }
.info-section h2 { color: #667eea; margin-bottom: 20px; }
.info-section p { color: #666; line-height: 1.8; margin-bottom: 15px; }
.features { display: grid; grid-template-columns: repeat(auto-fit, minmax(250px, 1fr)); gap: 20px; }
.feature { padding: 20px; background: #f8f9fa; border-radius: 10px; border-left: 4px solid #667eea; }
.feature h3 { color: #333; margin-bottom: 10px; }
.remediation { background: #f8d7da; border-left: 5px solid #dc3545; }
.remediation h2, .remediation p, .remediation ol { color: #721c24; }
.remediation ol { margin-left: 30px; line-height: 2; }
"#;

/// Submit handler. Each submission takes a ticket; a response that arrives
/// after a newer submission was sent is ignored. The loader is shown for the
/// whole request and hidden together with the result being revealed.
const SCRIPT: &str = r#"
let latestTicket = 0;
const form = document.getElementById('scoringForm');
if (form) {
  form.addEventListener('submit', async (e) => {
    e.preventDefault();
    const ticket = ++latestTicket;
    const data = {};
    new FormData(form).forEach((value, key) => { data[key] = String(value); });

    const loader = document.getElementById('loader');
    const result = document.getElementById('result');
    loader.style.display = 'block';
    result.style.display = 'none';

    let html;
    try {
      const response = await fetch('/score', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(data),
        signal: AbortSignal.timeout(15000),
      });
      html = (await response.json()).html;
    } catch (err) {
      html = result.dataset.failure;
    }

    if (ticket !== latestTicket) return;
    loader.style.display = 'none';
    result.innerHTML = html;
    result.style.display = 'block';
  });
}
"#;

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// Render the complete dashboard page for a shell view.
pub fn render_page<S: ScoringService>(view: &ShellView<'_, S>) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>leadscope - Lead Scoring Dashboard</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n<div class=\"container\">\n");

    match view {
        ShellView::Remediation {
            banner,
            message,
            steps,
        } => {
            html.push_str(&render_header(banner));
            html.push_str(&render_remediation(message, steps));
        }
        ShellView::Connected { banner, panels } => {
            html.push_str(&render_header(banner));
            html.push_str("<div class=\"dashboard\">\n");
            html.push_str(&render_form(&RawFormValues::sample()));
            html.push_str(&render_stats_card(&panels.stats));
            html.push_str("</div>\n");
            html.push_str(&render_segment_guide());
            html.push_str("<script>");
            html.push_str(SCRIPT);
            html.push_str("</script>\n");
        }
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_header(banner: &Banner) -> String {
    let class = if banner.connected {
        "connected"
    } else {
        "disconnected"
    };
    format!(
        "<div class=\"header\">\n<h1>🎯 leadscope</h1>\n<p>Lead scoring and follow-up dashboard</p>\n\
         <div class=\"api-status {class}\"><span class=\"api-status-dot\"></span>{}</div>\n</div>\n",
        escape(&banner.text)
    )
}

fn render_remediation(message: &str, steps: &[&str]) -> String {
    let items: String = steps
        .iter()
        .map(|step| format!("<li>{}</li>", escape(step)))
        .collect();
    format!(
        "<div class=\"info-section remediation\">\n<h2>⚠️ Scoring service unavailable</h2>\n\
         <p>{}</p>\n<ol>{items}</ol>\n</div>\n",
        escape(message)
    )
}

fn render_form(values: &RawFormValues) -> String {
    let mut html = String::from(
        "<div class=\"card\">\n<div class=\"card-title\">📊 Score a customer</div>\n<form id=\"scoringForm\">\n",
    );
    for (name, label, step) in FORM_FIELDS {
        html.push_str(&format!(
            "<div class=\"form-group\"><label for=\"{name}\">{}</label>\
             <input type=\"number\" id=\"{name}\" name=\"{name}\" step=\"{step}\" min=\"0\" value=\"{}\" required></div>\n",
            escape(label),
            escape(values.get(name).unwrap_or("")),
        ));
    }
    html.push_str("<button type=\"submit\" class=\"btn\">🎯 Calculate score</button>\n</form>\n");
    html.push_str("<div class=\"loader\" id=\"loader\"></div>\n");
    html.push_str(&format!(
        "<div id=\"result\" data-failure=\"{}\"></div>\n</div>\n",
        escape(&render_failure(
            crate::error::DashboardFailure::Submission.user_message()
        ))
    ));
    html
}

fn render_stats_card(panel: &StatsPanel) -> String {
    format!(
        "<div class=\"card\">\n<div class=\"card-title\">📈 Model statistics</div>\n<div id=\"modelStats\">{}</div>\n</div>\n",
        render_stats(panel)
    )
}

fn render_segment_guide() -> String {
    let cards: String = Segment::all()
        .iter()
        .map(|segment| {
            format!(
                "<div class=\"feature\"><h3>{} {} leads ({})</h3><p>Priority {} - {}</p></div>",
                segment.icon(),
                segment.label(),
                escape(segment.band()),
                segment.priority(),
                escape(segment.guidance()),
            )
        })
        .collect();
    format!(
        "<div class=\"info-section\">\n<h2>🚀 How it works</h2>\n\
         <p>Each customer is scored from 0 to 100 by the scoring service based on behavioral and \
         transactional signals, then placed in one of three segments.</p>\n\
         <div class=\"features\">{cards}</div>\n</div>\n"
    )
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

/// Result panel for a successful score.
pub fn render_result(view: &ResultView) -> String {
    let customer = view
        .customer_id
        .map(|id| format!("<p>Customer #{id}</p>"))
        .unwrap_or_default();
    format!(
        "<div class=\"result-card {}\"><h3>{} Segment: {}</h3>{customer}\
         <div class=\"score-display\">{}</div>\
         <div class=\"recommendation\"><strong>Recommendation:</strong><br>{}</div></div>",
        view.theme,
        view.icon,
        escape(&view.label),
        escape(&view.score),
        escape(&view.recommendation),
    )
}

/// Result panel for a failed score request.
pub fn render_failure(message: &str) -> String {
    format!(
        "<div class=\"result-card error\"><h3>❌ Error</h3><p>{}</p></div>",
        escape(message)
    )
}

/// Result panel listing rejected fields.
pub fn render_field_errors(errors: &[FieldError]) -> String {
    let items: String = errors
        .iter()
        .map(|e| format!("<li><strong>{}</strong> {}</li>", escape(e.field), escape(&e.message)))
        .collect();
    format!(
        "<div class=\"result-card invalid\"><h3>⚠️ Check the form</h3><ul>{items}</ul></div>"
    )
}

/// Stats panel body.
pub fn render_stats(panel: &StatsPanel) -> String {
    match panel {
        StatsPanel::Failed { message } => {
            format!("<p class=\"stats-error\">{}</p>", escape(message))
        }
        StatsPanel::Loaded { stats, bars } => {
            let mut html = format!(
                "<div class=\"stat-item\"><div class=\"stat-value\">{}</div>\
                 <div class=\"stat-label\">Model type</div></div>\n\
                 <div style=\"margin-top: 20px;\"><h4 style=\"margin-bottom: 15px; color: #333;\">Top features</h4>\n",
                escape(&stats.model_type)
            );
            if bars.is_empty() {
                html.push_str("<p class=\"muted\">No feature importances published.</p>\n");
            }
            for bar in bars {
                let pct = bar.label();
                html.push_str(&format!(
                    "<div class=\"feature-row\"><div class=\"feature-head\"><span>{}</span>\
                     <span class=\"pct\">{pct}</span></div>\
                     <div class=\"bar-track\"><div class=\"bar-fill\" style=\"width: {pct};\"></div></div></div>\n",
                    escape(&bar.name),
                ));
            }
            html.push_str("</div>");
            html
        }
    }
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{FeatureWeight, ModelStats, ScoreResult};
    use crate::stats::rank_features;

    #[test]
    fn result_fragment_shows_icon_score_and_text() {
        let view = ResultView::from_result(&ScoreResult::new(82.0, "Hot", "Call now"));
        let html = render_result(&view);
        assert!(html.contains("🔥"));
        assert!(html.contains("82/100"));
        assert!(html.contains("Call now"));
        assert!(html.contains("result-card hot"));
    }

    #[test]
    fn recommendation_is_escaped() {
        let view = ResultView::from_result(&ScoreResult::new(10.0, "Cold", "<b>x</b> & y"));
        let html = render_result(&view);
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt; &amp; y"));
        assert!(!html.contains("<b>x</b>"));
    }

    #[test]
    fn stats_bars_use_rounded_width() {
        let stats = ModelStats {
            model_type: "RandomForestClassifier".into(),
            feature_importance: vec![FeatureWeight {
                name: "total_spent".into(),
                importance: 0.4,
            }],
            n_estimators: None,
            segments: Vec::new(),
        };
        let panel = StatsPanel::Loaded {
            bars: rank_features(&stats.feature_importance, 5),
            stats,
        };
        let html = render_stats(&panel);
        assert!(html.contains("RandomForestClassifier"));
        assert!(html.contains("width: 40.0%;"));
    }

    #[test]
    fn stats_failure_is_single_message() {
        let html = render_stats(&StatsPanel::Failed {
            message: "Unable to load the model statistics.",
        });
        assert_eq!(
            html,
            "<p class=\"stats-error\">Unable to load the model statistics.</p>"
        );
    }

    #[test]
    fn field_errors_listed() {
        let errors = vec![FieldError {
            field: "total_spent",
            message: "'abc' is not a number".into(),
        }];
        let html = render_field_errors(&errors);
        assert!(html.contains("total_spent"));
        assert!(html.contains("&#39;abc&#39;"));
    }

    #[test]
    fn escape_handles_all_specials() {
        assert_eq!(escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
