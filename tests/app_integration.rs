use std::fs;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn mock_coingecko(body: &str, status: u16) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub async fn mock_exchangerate(body: &str, status: u16) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test-key/latest/USD"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub fn write_config(
        coingecko_url: &str,
        exchangerate_url: &str,
        data_dir: &std::path::Path,
    ) -> String {
        format!(
            r#"
holdings:
  - currency: "BTC"
    amount: 0.5
  - currency: "EUR"
    amount: 1000.0
  - currency: "DOGE"
    amount: 0.0
providers:
  coingecko:
    base_url: "{coingecko_url}"
    currencies: ["BTC", "ETH"]
  exchangerate:
    base_url: "{exchangerate_url}"
    api_key: "test-key"
    currencies: ["EUR", "GBP"]
base_currency: "USD"
ttl_seconds: 300
refresh_interval_hours: 24
data_path: "{}"
"#,
            data_dir.display()
        )
    }
}

const COINGECKO_BODY: &str = r#"{
    "bitcoin": {"usd": 59337.21},
    "ethereum": {"usd": 3720.0}
}"#;

const EXCHANGERATE_BODY: &str = r#"{
    "result": "success",
    "conversion_rates": {"EUR": 0.9272, "GBP": 0.7846}
}"#;

#[test_log::test(tokio::test)]
async fn test_refresh_then_rate_and_portfolio() {
    let coingecko = test_utils::mock_coingecko(COINGECKO_BODY, 200).await;
    let exchangerate = test_utils::mock_exchangerate(EXCHANGERATE_BODY, 200).await;

    let data_dir = tempfile::tempdir().expect("Failed to create data dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content =
        test_utils::write_config(&coingecko.uri(), &exchangerate.uri(), data_dir.path());
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");
    let config_path = config_file.path().to_str().unwrap();

    info!("Running refresh against mocked sources");
    let result = valuta::run_command(
        valuta::AppCommand::Refresh { source: None },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Refresh failed with: {:?}", result.err());

    // The snapshot survived to disk; a fresh process can resolve from it.
    assert!(data_dir.path().join("rates.json").exists());

    let result = valuta::run_command(
        valuta::AppCommand::Rate {
            from: "eur".to_string(),
            to: "btc".to_string(),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Rate failed with: {:?}", result.err());

    let result = valuta::run_command(
        valuta::AppCommand::Portfolio { base: None },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Portfolio failed with: {:?}", result.err());

    let result = valuta::run_command(
        valuta::AppCommand::Rates {
            currency: Some("USD".to_string()),
            top: Some(3),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Rates failed with: {:?}", result.err());

    let result = valuta::run_command(
        valuta::AppCommand::History {
            from: Some("BTC".to_string()),
            to: None,
            limit: 10,
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "History failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_partial_refresh_still_succeeds() {
    let coingecko = test_utils::mock_coingecko(COINGECKO_BODY, 200).await;
    let exchangerate = test_utils::mock_exchangerate("Server Error", 500).await;

    let data_dir = tempfile::tempdir().expect("Failed to create data dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content =
        test_utils::write_config(&coingecko.uri(), &exchangerate.uri(), data_dir.path());
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let result = valuta::run_command(
        valuta::AppCommand::Refresh { source: None },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Partial refresh should exit successfully: {:?}",
        result.err()
    );
    assert!(data_dir.path().join("rates.json").exists());
}

#[test_log::test(tokio::test)]
async fn test_refresh_fails_when_every_source_fails() {
    let coingecko = test_utils::mock_coingecko("Server Error", 500).await;
    let exchangerate = test_utils::mock_exchangerate("Server Error", 503).await;

    let data_dir = tempfile::tempdir().expect("Failed to create data dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content =
        test_utils::write_config(&coingecko.uri(), &exchangerate.uri(), data_dir.path());
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let result = valuta::run_command(
        valuta::AppCommand::Refresh { source: None },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(result.is_err(), "Refresh with no surviving source must fail");
    // Nothing was merged, so nothing was persisted.
    assert!(!data_dir.path().join("rates.json").exists());
}

#[test_log::test(tokio::test)]
async fn test_refresh_with_source_filter() {
    let coingecko = test_utils::mock_coingecko(COINGECKO_BODY, 200).await;
    // The fiat source would fail, but the filter never polls it.
    let exchangerate = test_utils::mock_exchangerate("Server Error", 500).await;

    let data_dir = tempfile::tempdir().expect("Failed to create data dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content =
        test_utils::write_config(&coingecko.uri(), &exchangerate.uri(), data_dir.path());
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");
    let config_path = config_file.path().to_str().unwrap();

    let result = valuta::run_command(
        valuta::AppCommand::Refresh {
            source: Some("coingecko".to_string()),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Filtered refresh failed: {:?}", result.err());

    let result = valuta::run_command(
        valuta::AppCommand::Refresh {
            source: Some("unknown".to_string()),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_err(), "Unknown source filter must be an error");
}

#[test_log::test(tokio::test)]
async fn test_portfolio_fails_on_unresolvable_currency() {
    let coingecko = test_utils::mock_coingecko(COINGECKO_BODY, 200).await;
    let exchangerate = test_utils::mock_exchangerate(EXCHANGERATE_BODY, 200).await;

    let data_dir = tempfile::tempdir().expect("Failed to create data dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    // XMR is never quoted by either mocked source.
    let config_content = format!(
        r#"
holdings:
  - currency: "XMR"
    amount: 10.0
providers:
  coingecko:
    base_url: "{}"
    currencies: ["BTC"]
  exchangerate:
    base_url: "{}"
    api_key: "test-key"
    currencies: ["EUR"]
base_currency: "USD"
ttl_seconds: 300
data_path: "{}"
"#,
        coingecko.uri(),
        exchangerate.uri(),
        data_dir.path().display()
    );
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");
    let config_path = config_file.path().to_str().unwrap();

    valuta::run_command(valuta::AppCommand::Refresh { source: None }, Some(config_path))
        .await
        .expect("Refresh should succeed");

    let result =
        valuta::run_command(valuta::AppCommand::Portfolio { base: None }, Some(config_path)).await;
    assert!(result.is_err(), "Valuation of XMR must fail");
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("XMR"), "error should name the currency: {message}");
}
