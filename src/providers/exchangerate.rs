use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::core::error::SourceError;
use crate::core::quote::RateQuote;
use crate::core::source::RateSource;
use crate::providers::REQUEST_TIMEOUT;

pub const SOURCE_ID: &str = "exchangerate-api";

/// Fiat codes tracked by default.
const FIAT_CURRENCIES: &[&str] = &[
    "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "CNY", "HKD", "SGD", "SEK", "NOK", "KRW", "NZD",
    "INR", "BRL", "RUB", "ZAR", "MXN", "TRY", "PLN", "THB", "IDR", "HUF", "CZK", "ILS", "CLP",
    "PHP", "AED", "COP", "SAR", "MYR", "RON",
];

// ExchangeRateApiSource implementation for RateSource
pub struct ExchangeRateApiSource {
    base_url: String,
    api_key: Option<String>,
    currencies: Vec<String>,
    base_currency: String,
}

impl ExchangeRateApiSource {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        currencies: &[String],
        base_currency: &str,
    ) -> Self {
        let currencies = if currencies.is_empty() {
            FIAT_CURRENCIES.iter().map(|code| code.to_string()).collect()
        } else {
            currencies.to_vec()
        };
        ExchangeRateApiSource {
            base_url: base_url.to_string(),
            api_key,
            currencies,
            base_currency: base_currency.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
}

#[async_trait]
impl RateSource for ExchangeRateApiSource {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    async fn fetch(&self) -> Result<Vec<RateQuote>, SourceError> {
        let Some(api_key) = &self.api_key else {
            return Err(SourceError::Unavailable(
                "API key is not configured".to_string(),
            ));
        };

        // The key is part of the path, so log only the action.
        let url = format!("{}/{}/latest/{}", self.base_url, api_key, self.base_currency);
        debug!("Requesting fiat rates from ExchangeRate-API");

        let client = reqwest::Client::builder()
            .user_agent("valuta/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let response = client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(SourceError::Unavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let data: LatestRatesResponse = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;

        if data.result != "success" {
            return Err(SourceError::Unavailable(format!(
                "API error: {}",
                data.error_type.as_deref().unwrap_or("unknown")
            )));
        }

        // The API quotes BASE->fiat; invert so every quote reads fiat->BASE,
        // skipping values that cannot be inverted.
        let observed_at = Utc::now();
        let mut quotes = Vec::new();
        for currency in &self.currencies {
            if let Some(&base_to_fiat) = data.conversion_rates.get(currency) {
                if base_to_fiat > 0.0 {
                    quotes.push(RateQuote {
                        base: currency.clone(),
                        quote: self.base_currency.clone(),
                        rate: 1.0 / base_to_fiat,
                        observed_at,
                        source: SOURCE_ID.to_string(),
                    });
                }
            }
        }

        debug!(count = quotes.len(), "ExchangeRate-API returned quotes");
        Ok(quotes)
    }
}
