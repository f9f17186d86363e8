//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use paylink_core::{Coordinator, Invocation, Recipients, RunConfig, TriggerHandler};
use paylink_dispatch::{HttpNotifier, NotifierOptions};
use paylink_report::{DiscordReporter, ReporterOptions};
use paylink_sheets::{SheetsClient, SheetsOptions};
use paylink_shared::{AppConfig, init_config, load_config, load_config_from, resolve_settings};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// paylink: notify owners whose payment links are ready.
#[derive(Parser)]
#[command(
    name = "paylink",
    version,
    about = "Send payment-link notifications for ready rows of the worklist sheet.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.paylink/paylink.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run one notification pass over the sheet.
    Run {
        /// Caller credential checked against the configured trigger secret.
        #[arg(long, env = "PAYLINK_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show the loaded configuration file contents.
    Show,
    /// Validate configuration and required environment variables.
    Check,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "paylink=info",
        1 => "paylink=debug",
        _ => "paylink=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run { api_key } => cmd_run(config_path, api_key).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
            ConfigAction::Check => cmd_config_check(config_path).await,
        },
    }
}

fn load(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config_path: Option<&Path>, api_key: Option<String>) -> Result<()> {
    // Validate configuration before touching the sheet
    let config = load(config_path)?;
    let settings = resolve_settings(&config)?;

    let table = SheetsClient::new(SheetsOptions::from(&settings))?;
    let notifier = HttpNotifier::new(NotifierOptions::from(&settings))?;
    let reporter = DiscordReporter::new(ReporterOptions::from(&settings))?;

    let coordinator = Coordinator::new(RunConfig::from(&settings), &table, &notifier);
    let handler = TriggerHandler::new(
        settings.trigger_key.clone(),
        coordinator,
        &reporter,
        Recipients::from(&settings),
    );

    let invocation = match api_key {
        Some(key) => Invocation::with_api_key(key),
        None => Invocation::default(),
    };

    info!(sheet = %settings.sheet_name, "starting notification run");
    let response = handler.handle(&invocation).await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.status_code != 200 {
        return Err(eyre!(
            "run finished with status {}: {}",
            response.status_code,
            response.body.message
        ));
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

async fn cmd_config_check(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let settings = resolve_settings(&config)?;

    println!();
    println!("  Configuration OK");
    println!("  Spreadsheet:  {} ({})", settings.spreadsheet_id, settings.sheet_name);
    println!("  Notify URL:   {}", settings.notification_url);
    println!("  Pacing:       {} ms", settings.pacing.as_millis());
    println!("  Recipients:   {}", settings.recipients.len());
    println!("  Escalation:   {}", settings.escalation_ids.len());
    println!();

    Ok(())
}
