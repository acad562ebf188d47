use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use leadscope::client::http::DEFAULT_MODEL_PATH;
use leadscope::features::RawFormValues;
use leadscope::{cli, config, telemetry, web};

#[derive(Debug, Parser)]
#[command(name = "leadscope")]
#[command(about = "Lead scoring dashboard for a remote scoring service")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the web dashboard
    Web {
        /// Listen address (default: dashboard.addr from config)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser window
        #[arg(long)]
        no_open: bool,
    },
    /// Check the scoring service, config files and call log
    Health,
    /// Score one customer
    Score {
        #[command(flatten)]
        fields: ScoreFields,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show model statistics and top feature importances
    Stats {
        /// Number of features to show (default: dashboard.top_features)
        #[arg(long)]
        top: Option<usize>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Score a JSON array of customers in one request
    Batch {
        /// Path to the JSON file
        file: PathBuf,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Ask the scoring service to load a model file
    LoadModel {
        /// Model path on the service host
        #[arg(default_value = DEFAULT_MODEL_PATH)]
        path: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Customer attributes, taken as typed and validated before sending.
#[derive(Debug, clap::Args)]
struct ScoreFields {
    #[arg(long)]
    customer_id: String,
    #[arg(long)]
    days_since_last_contact: String,
    #[arg(long)]
    total_contacts: String,
    /// Total amount spent, decimals allowed
    #[arg(long)]
    total_spent: String,
    #[arg(long)]
    emails_sent: String,
    #[arg(long)]
    emails_opened: String,
    #[arg(long)]
    website_visits: String,
    #[arg(long)]
    customer_age_days: String,
}

impl ScoreFields {
    fn into_raw(self) -> RawFormValues {
        RawFormValues::new()
            .with("customer_id", self.customer_id)
            .with("days_since_last_contact", self.days_since_last_contact)
            .with("total_contacts", self.total_contacts)
            .with("total_spent", self.total_spent)
            .with("emails_sent", self.emails_sent)
            .with("emails_opened", self.emails_opened)
            .with("website_visits", self.website_visits)
            .with("customer_age_days", self.customer_age_days)
    }
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective merged configuration
    Show,
    /// Write the default config to ~/.leadscope/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `service.base_url`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();

    if let Err(e) = telemetry::init(&cfg.logging) {
        eprintln!("leadscope: logging disabled: {e}");
    }

    match app.command {
        Commands::Web { addr, no_open } => {
            let mut options = web::WebOptions::from_config(&cfg);
            if let Some(addr) = addr {
                options.addr = addr;
            }
            if no_open {
                options.open_browser = false;
            }
            web::serve(&cfg, &options)
        }
        Commands::Health => cli::run_health(&cfg),
        Commands::Score { fields, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_score(&cfg, &fields.into_raw(), fmt)
        }
        Commands::Stats { top, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(&cfg, top, fmt)
        }
        Commands::Batch { file, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_batch(&cfg, &file, fmt)
        }
        Commands::LoadModel { path } => cli::run_load_model(&cfg, &path),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
