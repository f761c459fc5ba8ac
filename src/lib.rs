pub mod cli;
pub mod core;
pub mod providers;
pub mod scheduler;
pub mod store;
pub mod updater;
pub mod valuation;

use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::config::AppConfig;
use crate::core::currency::normalize_code;
use crate::core::resolve::RateResolver;
use crate::core::source::RateSource;
use crate::providers::coingecko::CoinGeckoSource;
use crate::providers::exchangerate::ExchangeRateApiSource;
use crate::store::RateStore;
use crate::store::repository::{JsonFileRepository, RatesRepository};
use crate::updater::Updater;

#[derive(Debug, Clone)]
pub enum AppCommand {
    Refresh { source: Option<String> },
    Rate { from: String, to: String },
    Portfolio { base: Option<String> },
    Rates { currency: Option<String>, top: Option<usize> },
    History { from: Option<String>, to: Option<String>, limit: usize },
    Watch,
}

/// Wired application: config, hydrated store, sources, updater, resolver.
pub struct App {
    pub config: AppConfig,
    pub store: Arc<RateStore>,
    pub repository: Arc<dyn RatesRepository>,
    pub updater: Arc<Updater>,
    pub resolver: RateResolver,
}

impl App {
    pub fn from_config(mut config: AppConfig) -> Result<Self> {
        config.base_currency = normalize_code(&config.base_currency)
            .context("Invalid base_currency in config")?;
        for holding in &mut config.holdings {
            holding.currency = normalize_code(&holding.currency)
                .with_context(|| format!("Invalid holding currency '{}'", holding.currency))?;
            if !(holding.amount >= 0.0 && holding.amount.is_finite()) {
                bail!(
                    "Holding amount for {} must be a non-negative number",
                    holding.currency
                );
            }
        }

        if config.refresh_interval_hours == 0 {
            bail!("refresh_interval_hours must be at least 1");
        }

        let data_path = config.default_data_path()?;
        let repository: Arc<dyn RatesRepository> =
            Arc::new(JsonFileRepository::new(&data_path));
        let store = Arc::new(
            RateStore::hydrate(repository.as_ref()).context("Failed to load cached rates")?,
        );

        let mut sources: Vec<Arc<dyn RateSource>> = Vec::new();
        if let Some(provider) = &config.providers.coingecko {
            sources.push(Arc::new(CoinGeckoSource::new(
                &provider.base_url,
                &provider.currencies,
                &config.base_currency,
            )));
        }
        if let Some(provider) = &config.providers.exchangerate {
            sources.push(Arc::new(ExchangeRateApiSource::new(
                &provider.base_url,
                provider.resolve_api_key(),
                &provider.currencies,
                &config.base_currency,
            )));
        }
        if sources.is_empty() {
            bail!("No rate sources configured; enable a provider in the config file");
        }

        let updater = Arc::new(Updater::new(
            sources,
            Arc::clone(&store),
            Arc::clone(&repository),
        ));
        let resolver = RateResolver::new(
            Arc::clone(&store),
            &config.base_currency,
            config.ttl_seconds,
        );

        Ok(App {
            config,
            store,
            repository,
            updater,
            resolver,
        })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Valuta starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let app = App::from_config(config)?;

    match command {
        AppCommand::Refresh { source } => cli::refresh::run(&app, source.as_deref()).await,
        AppCommand::Rate { from, to } => cli::rate::run(&app, &from, &to).await,
        AppCommand::Portfolio { base } => cli::portfolio::run(&app, base.as_deref()),
        AppCommand::Rates { currency, top } => cli::rates::run(&app, currency.as_deref(), top),
        AppCommand::History { from, to, limit } => {
            cli::history::run(&app, from.as_deref(), to.as_deref(), limit)
        }
        AppCommand::Watch => cli::watch::run(&app).await,
    }
}
