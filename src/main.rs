use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use valuta::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for valuta::AppCommand {
    fn from(cmd: Commands) -> valuta::AppCommand {
        match cmd {
            Commands::Refresh { source } => valuta::AppCommand::Refresh { source },
            Commands::Rate { from, to } => valuta::AppCommand::Rate { from, to },
            Commands::Portfolio { base } => valuta::AppCommand::Portfolio { base },
            Commands::Rates { currency, top } => valuta::AppCommand::Rates { currency, top },
            Commands::History { from, to, limit } => {
                valuta::AppCommand::History { from, to, limit }
            }
            Commands::Watch => valuta::AppCommand::Watch,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch fresh rates from every configured source
    Refresh {
        /// Poll only the named source
        #[arg(long)]
        source: Option<String>,
    },
    /// Show the exchange rate between two currencies
    Rate {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Value the configured holdings in the base currency
    Portfolio {
        /// Override the base currency for this valuation
        #[arg(long)]
        base: Option<String>,
    },
    /// List cached rates
    Rates {
        /// Show only pairs involving this currency
        #[arg(long)]
        currency: Option<String>,
        /// Show only the N highest rates
        #[arg(long)]
        top: Option<usize>,
    },
    /// Show recorded rate history
    History {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Keep rates fresh on the configured interval until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => valuta::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = valuta::core::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
holdings:
  - currency: "BTC"
    amount: 0.0

providers:
  coingecko:
    base_url: "https://api.coingecko.com/api/v3"
  exchangerate:
    base_url: "https://v6.exchangerate-api.com/v6"
    # api_key: "..."  # or set EXCHANGERATE_API_KEY in the environment

base_currency: "USD"
ttl_seconds: 300
refresh_interval_hours: 24
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
