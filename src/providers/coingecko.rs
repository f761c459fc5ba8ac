use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;

use crate::core::error::SourceError;
use crate::core::quote::RateQuote;
use crate::core::source::RateSource;
use crate::providers::REQUEST_TIMEOUT;

pub const SOURCE_ID: &str = "coingecko";

/// CoinGecko asset ids for the crypto tickers tracked by default.
const CRYPTO_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("BNB", "binancecoin"),
    ("XRP", "ripple"),
    ("SOL", "solana"),
    ("DOGE", "dogecoin"),
    ("ADA", "cardano"),
    ("AVAX", "avalanche-2"),
    ("DOT", "polkadot"),
    ("TRX", "tron"),
];

fn asset_id(code: &str) -> Option<&'static str> {
    CRYPTO_IDS
        .iter()
        .find(|(ticker, _)| *ticker == code)
        .map(|(_, id)| *id)
}

// CoinGeckoSource implementation for RateSource
pub struct CoinGeckoSource {
    base_url: String,
    currencies: Vec<String>,
    base_currency: String,
}

impl CoinGeckoSource {
    pub fn new(base_url: &str, currencies: &[String], base_currency: &str) -> Self {
        let currencies = if currencies.is_empty() {
            CRYPTO_IDS.iter().map(|(code, _)| code.to_string()).collect()
        } else {
            currencies.to_vec()
        };
        CoinGeckoSource {
            base_url: base_url.to_string(),
            currencies,
            base_currency: base_currency.to_string(),
        }
    }
}

#[async_trait]
impl RateSource for CoinGeckoSource {
    fn id(&self) -> &str {
        SOURCE_ID
    }

    async fn fetch(&self) -> Result<Vec<RateQuote>, SourceError> {
        // Only tickers CoinGecko knows an asset id for can be requested.
        let tracked: Vec<(&str, &'static str)> = self
            .currencies
            .iter()
            .filter_map(|code| asset_id(code).map(|id| (code.as_str(), id)))
            .collect();
        if tracked.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = tracked.iter().map(|(_, id)| *id).collect();
        let vs = self.base_currency.to_ascii_lowercase();
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url,
            ids.join(","),
            vs
        );
        debug!("Requesting crypto rates from {}", url);

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

        let data: HashMap<String, HashMap<String, f64>> = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;

        let observed_at = Utc::now();
        let mut quotes = Vec::new();
        for (code, id) in tracked {
            if let Some(rate) = data.get(id).and_then(|prices| prices.get(&vs)) {
                quotes.push(RateQuote {
                    base: code.to_string(),
                    quote: self.base_currency.clone(),
                    rate: *rate,
                    observed_at,
                    source: SOURCE_ID.to_string(),
                });
            }
        }

        debug!(count = quotes.len(), "CoinGecko returned quotes");
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(uri: &str, currencies: &[&str]) -> CoinGeckoSource {
        let currencies: Vec<String> = currencies.iter().map(|c| c.to_string()).collect();
        CoinGeckoSource::new(uri, &currencies, "USD")
    }

    async fn mock_simple_price(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(response)
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let mock_response = r#"{
            "bitcoin": {"usd": 59337.21},
            "ethereum": {"usd": 3720.0}
        }"#;
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "bitcoin,ethereum"))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let source = source_for(&mock_server.uri(), &["BTC", "ETH"]);
        let quotes = source.fetch().await.unwrap();

        assert_eq!(quotes.len(), 2);
        let btc = quotes.iter().find(|q| q.base == "BTC").unwrap();
        assert_eq!(btc.quote, "USD");
        assert_eq!(btc.rate, 59337.21);
        assert_eq!(btc.source, "coingecko");
    }

    #[tokio::test]
    async fn test_missing_asset_is_skipped() {
        let mock_response = r#"{"bitcoin": {"usd": 59337.21}}"#;
        let mock_server =
            mock_simple_price(ResponseTemplate::new(200).set_body_string(mock_response)).await;

        let source = source_for(&mock_server.uri(), &["BTC", "ETH"]);
        let quotes = source.fetch().await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].base, "BTC");
    }

    #[tokio::test]
    async fn test_unknown_tickers_fetch_nothing() {
        // No asset id for any configured ticker, so no request is made.
        let source = source_for("http://127.0.0.1:9", &["WAT"]);
        let quotes = source.fetch().await.unwrap();
        assert!(quotes.is_empty());
    }

    #[tokio::test]
    async fn test_http_error_is_unavailable() {
        let mock_server = mock_simple_price(ResponseTemplate::new(500)).await;
        let source = source_for(&mock_server.uri(), &["BTC"]);

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let mock_server = mock_simple_price(ResponseTemplate::new(429)).await;
        let source = source_for(&mock_server.uri(), &["BTC"]);

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, SourceError::RateLimited));
    }

    #[tokio::test]
    async fn test_malformed_body_is_reported() {
        let mock_server =
            mock_simple_price(ResponseTemplate::new(200).set_body_string("not json")).await;
        let source = source_for(&mock_server.uri(), &["BTC"]);

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, SourceError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let source = source_for("http://127.0.0.1:9", &["BTC"]);
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }
}
