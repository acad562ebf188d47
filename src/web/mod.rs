//! Embedded web dashboard for leadscope.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - The dashboard page, rendered per load after a fresh health check
//! - A JSON endpoint that scores one customer from raw form input
//!
//! Launched via `leadscope web` (default: `http://127.0.0.1:9750`).

pub mod api;
pub mod frontend;

use std::io::Cursor;

use anyhow::{Context, Result, anyhow};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::client::{ScoringService, ServiceClient};
use crate::config::LeadscopeConfig;

/// Resolved server options.
#[derive(Debug, Clone)]
pub struct WebOptions {
    pub addr: String,
    pub open_browser: bool,
    pub top_features: usize,
}

impl WebOptions {
    pub fn from_config(config: &LeadscopeConfig) -> Self {
        Self {
            addr: config.dashboard.addr.clone(),
            open_browser: config.dashboard.open_browser,
            top_features: config.dashboard.top_features,
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user dashboard). A failing request gets a 500 and the
/// server keeps going.
pub fn serve(config: &LeadscopeConfig, options: &WebOptions) -> Result<()> {
    let client = ServiceClient::from_config(config);
    let addr = options.addr.as_str();
    let server = Server::http(addr)
        .map_err(|e| anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("leadscope dashboard running at http://{addr}");
    println!("Scoring service: {}", client.base_url());
    println!("Press Ctrl+C to stop.\n");
    tracing::info!(addr, service = client.base_url(), "dashboard server started");

    if options.open_browser
        && let Err(e) = open_browser(&format!("http://{addr}"))
    {
        tracing::debug!(error = %e, "could not open browser");
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Post) {
            let mut buf = String::new();
            if let Err(e) = request.as_reader().read_to_string(&mut buf) {
                tracing::warn!(error = %e, %url, "failed to read request body");
            }
            Some(buf)
        } else {
            None
        };

        let result = dispatch(&client, options.top_features, &method, &url, body.as_deref());

        let status = match result {
            Ok(resp) => {
                let status = resp.status_code().0;
                if let Err(e) = request.respond(resp) {
                    tracing::debug!(error = %e, "client went away before response");
                }
                status
            }
            Err(e) => {
                tracing::warn!(error = %e, %method, %url, "request handler failed");
                let body = serde_json::json!({ "error": e.to_string() }).to_string();
                let mut resp = Response::from_data(body.into_bytes()).with_status_code(StatusCode(500));
                if let Ok(header) = content_type_json() {
                    resp.add_header(header);
                }
                let _ = request.respond(resp);
                500
            }
        };

        tracing::info!(%method, %url, status, "request");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub fn dispatch<S: ScoringService>(
    client: &S,
    top_features: usize,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => api::get_index(client, top_features),
        (&Method::Post, "/score") => api::post_score(client, body.unwrap_or("{}")),
        _ => not_found(),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// 404 response.
fn not_found() -> Result<Response<Cursor<Vec<u8>>>> {
    let body = r#"{"error": "not found"}"#;
    Ok(Response::from_data(body.as_bytes().to_vec())
        .with_header(content_type_json()?)
        .with_status_code(StatusCode(404)))
}

fn content_type(value: &str) -> Result<Header> {
    Header::from_bytes("Content-Type", value)
        .map_err(|()| anyhow!("invalid Content-Type header value: {value}"))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Result<Header> {
    content_type("application/json; charset=utf-8")
}

/// HTML content type header.
pub(crate) fn content_type_html() -> Result<Header> {
    content_type("text/html; charset=utf-8")
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
