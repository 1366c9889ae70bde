//! Verity - directory authentication client
//!
//! Operator front end: probes the configured LDAP servers, checks
//! credentials and looks users up.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use verity_core::config::LoggingConfig;
use verity_core::VerityConfig;

#[derive(Parser)]
#[command(name = "verity")]
#[command(author = "Verity Team")]
#[command(version = verity_core::VERSION)]
#[command(about = "LDAP-over-TLS directory authentication client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (YAML; `.toml` files are read as TOML)
    #[arg(short, long, global = true, env = "VERITY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "VERITY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every configured server and show which are usable
    Probe,

    /// Check a user's credentials
    Authenticate {
        identifier: String,

        /// Password; read from stdin when absent
        #[arg(long, env = "VERITY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Look a user up without credentials
    FetchUser { identifier: String },

    /// Print the effective configuration
    ShowConfig,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => VerityConfig::from_file(path)?,
        None => VerityConfig::discover()?,
    };
    config.apply_env();

    init_logging(&config.logging, cli.log_level.as_deref());
    debug!(
        "Using {} directory with {} server(s)",
        config.directory.label,
        config.directory.servers.len()
    );

    let ctx = CommandContext {
        config,
        output_format: cli.output,
    };

    let success = match cli.command {
        Commands::Probe => commands::probe::execute(&ctx).await?,
        Commands::Authenticate {
            identifier,
            password,
        } => commands::authenticate::execute(&ctx, &identifier, password).await?,
        Commands::FetchUser { identifier } => {
            commands::fetch_user::execute(&ctx, &identifier).await?
        }
        Commands::ShowConfig => commands::show_config::execute(&ctx)?,
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// `RUST_LOG` wins, then `--log-level`, then the config file
fn init_logging(logging: &LoggingConfig, cli_level: Option<&str>) {
    let level = cli_level.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
