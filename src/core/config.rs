use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// One currency position owned by the user. Buy/sell mutation happens
/// outside this app; valuation treats holdings as read-only input.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Holding {
    pub currency: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoConfig {
    #[serde(default = "default_coingecko_url")]
    pub base_url: String,
    /// Crypto tickers to track; empty means the built-in universe.
    #[serde(default)]
    pub currencies: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateConfig {
    #[serde(default = "default_exchangerate_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    /// Fiat codes to track; empty means the built-in universe.
    #[serde(default)]
    pub currencies: Vec<String>,
}

impl ExchangeRateConfig {
    /// Key from the config file, falling back to the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("EXCHANGERATE_API_KEY").ok())
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coingecko: Option<CoinGeckoConfig>,
    pub exchangerate: Option<ExchangeRateConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coingecko: Some(CoinGeckoConfig {
                base_url: default_coingecko_url(),
                currencies: Vec::new(),
            }),
            exchangerate: Some(ExchangeRateConfig {
                base_url: default_exchangerate_url(),
                api_key: None,
                currencies: Vec::new(),
            }),
        }
    }
}

fn default_coingecko_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_exchangerate_url() -> String {
    "https://v6.exchangerate-api.com/v6".to_string()
}

fn default_base_currency() -> String {
    "USD".to_string()
}

fn default_ttl_seconds() -> u64 {
    300
}

fn default_refresh_interval_hours() -> u64 {
    24
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub holdings: Vec<Holding>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Common base used for triangulation and as the default valuation
    /// currency.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Maximum quote age before reads flag it as stale.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(default = "default_refresh_interval_hours")]
    pub refresh_interval_hours: u64,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "valuta", "valuta")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "valuta", "valuta")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
