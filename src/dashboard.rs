/// Dashboard shell.
///
/// Runs the health check once at load and freezes the result as the
/// dashboard's [`ConnectionState`]. That state is a hard gate: when the
/// service is down only the remediation panel exists, and neither the form
/// nor the stats panel is ever mounted (so no score or stats call is made).
/// When it is up, the banner reports whether the model is loaded, purely as
/// information.
use crate::client::{ConnectionState, ScoringService};
use crate::error::DashboardFailure;
use crate::form::ScoringFormController;
use crate::stats::{StatsPanel, StatsPanelController};

/// Steps shown to the operator when the scoring service is unreachable.
pub const REMEDIATION_STEPS: [&str; 4] = [
    "Open a terminal in the scoring service project directory.",
    "Activate its Python virtual environment.",
    "Start the API: python demo/api.py",
    "Reload this page.",
];

/// Connection banner contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub connected: bool,
    pub text: String,
}

impl Banner {
    pub fn for_state(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Connected { model_loaded } => Self {
                connected: true,
                text: format!(
                    "Scoring service connected - model {}",
                    if model_loaded { "loaded" } else { "not loaded" }
                ),
            },
            ConnectionState::Disconnected => Self {
                connected: false,
                text: "Scoring service disconnected - start the scoring API".to_string(),
            },
        }
    }
}

/// The mounted panels of a connected dashboard.
pub struct Panels<'a, S: ScoringService> {
    pub form: ScoringFormController<'a, S>,
    pub stats: StatsPanel,
}

/// What the dashboard shows after load.
pub enum ShellView<'a, S: ScoringService> {
    Remediation {
        banner: Banner,
        message: &'static str,
        steps: &'static [&'static str],
    },
    Connected {
        banner: Banner,
        panels: Panels<'a, S>,
    },
}

pub struct DashboardShell<'a, S: ScoringService> {
    client: &'a S,
    connection: ConnectionState,
    top_features: usize,
}

impl<'a, S: ScoringService> DashboardShell<'a, S> {
    /// Run the one health check and fix the connection state.
    pub fn load(client: &'a S, top_features: usize) -> Self {
        let connection = client.health();
        tracing::info!(?connection, "scoring service health checked");
        Self {
            client,
            connection,
            top_features,
        }
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn banner(&self) -> Banner {
        Banner::for_state(self.connection)
    }

    /// Mount the panels, or `None` when the service is disconnected.
    ///
    /// Mounting fetches the model stats (once per call).
    pub fn mount(&self) -> Option<Panels<'a, S>> {
        if !self.connection.is_connected() {
            return None;
        }
        Some(Panels {
            form: ScoringFormController::new(self.client),
            stats: StatsPanelController::mount(self.client, self.top_features),
        })
    }

    /// Resolve what to display.
    pub fn view(&self) -> ShellView<'a, S> {
        let banner = self.banner();
        match self.mount() {
            Some(panels) => ShellView::Connected { banner, panels },
            None => ShellView::Remediation {
                banner,
                message: DashboardFailure::Connectivity.user_message(),
                steps: &REMEDIATION_STEPS,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_reflects_model_status() {
        let loaded = Banner::for_state(ConnectionState::Connected { model_loaded: true });
        assert!(loaded.connected);
        assert!(loaded.text.ends_with("model loaded"));

        let not_loaded = Banner::for_state(ConnectionState::Connected {
            model_loaded: false,
        });
        assert!(not_loaded.text.ends_with("model not loaded"));

        let down = Banner::for_state(ConnectionState::Disconnected);
        assert!(!down.connected);
    }
}
