//! Durable storage for the rate snapshot and the merge history.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::quote::{PairKey, RateQuote};

pub const MAX_HISTORY_RECORDS: usize = 1000;

/// On-disk mirror of the in-memory snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatesDocument {
    #[serde(default)]
    pub pairs: HashMap<PairKey, RateQuote>,
    #[serde(default)]
    pub last_refresh: Option<DateTime<Utc>>,
}

/// Round-trip to durable storage. Saves are all-or-nothing; a crashed write
/// never leaves a truncated rates file behind.
pub trait RatesRepository: Send + Sync {
    fn load_rates(&self) -> Result<RatesDocument>;
    fn save_rates(&self, document: &RatesDocument) -> Result<()>;
    fn append_history(&self, records: &[RateQuote]) -> Result<()>;
    fn load_history(&self) -> Result<Vec<RateQuote>>;
}

/// JSON files under the app data directory: `rates.json` (snapshot) and
/// `history.json` (rolling record of merged quotes).
pub struct JsonFileRepository {
    rates_path: PathBuf,
    history_path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            rates_path: data_dir.join("rates.json"),
            history_path: data_dir.join("history.json"),
        }
    }

    // Write to a sibling temp file, then rename over the target.
    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .with_context(|| format!("Failed to write temp file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace file: {}", path.display()))?;
        Ok(())
    }
}

impl RatesRepository for JsonFileRepository {
    fn load_rates(&self) -> Result<RatesDocument> {
        if !self.rates_path.exists() {
            debug!("No rates file at {}; starting empty", self.rates_path.display());
            return Ok(RatesDocument::default());
        }
        let raw = fs::read_to_string(&self.rates_path)
            .with_context(|| format!("Failed to read rates file: {}", self.rates_path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse rates file: {}", self.rates_path.display()))
    }

    fn save_rates(&self, document: &RatesDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document).context("Failed to serialize rates")?;
        Self::write_atomic(&self.rates_path, &bytes)?;
        debug!(
            pairs = document.pairs.len(),
            "Saved rates to {}",
            self.rates_path.display()
        );
        Ok(())
    }

    fn append_history(&self, records: &[RateQuote]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut history = self.load_history()?;
        history.extend_from_slice(records);
        if history.len() > MAX_HISTORY_RECORDS {
            let excess = history.len() - MAX_HISTORY_RECORDS;
            history.drain(..excess);
            debug!("History truncated to {} records", MAX_HISTORY_RECORDS);
        }
        let bytes = serde_json::to_vec_pretty(&history).context("Failed to serialize history")?;
        Self::write_atomic(&self.history_path, &bytes)
    }

    fn load_history(&self) -> Result<Vec<RateQuote>> {
        if !self.history_path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.history_path).with_context(|| {
            format!("Failed to read history file: {}", self.history_path.display())
        })?;
        match serde_json::from_str(&raw) {
            Ok(history) => Ok(history),
            Err(e) => {
                // Damaged history is not worth failing a refresh over.
                warn!(error = %e, "History file was corrupted, starting a new one");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(base: &str, rate: f64) -> RateQuote {
        RateQuote {
            base: base.to_string(),
            quote: "USD".to_string(),
            rate,
            observed_at: Utc::now(),
            source: "test".to_string(),
        }
    }

    #[test]
    fn test_load_missing_files_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());

        let document = repo.load_rates().unwrap();
        assert!(document.pairs.is_empty());
        assert!(document.last_refresh.is_none());
        assert!(repo.load_history().unwrap().is_empty());
    }

    #[test]
    fn test_rates_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());

        let mut document = RatesDocument::default();
        let btc = quote("BTC", 59337.21);
        document.pairs.insert(btc.pair_key(), btc.clone());
        document.last_refresh = Some(Utc::now());

        repo.save_rates(&document).unwrap();
        let loaded = repo.load_rates().unwrap();
        assert_eq!(loaded.pairs.len(), 1);
        assert_eq!(loaded.pairs[&btc.pair_key()], btc);
        assert_eq!(loaded.last_refresh, document.last_refresh);
    }

    #[test]
    fn test_history_append_and_cap() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());

        let batch: Vec<RateQuote> = (0..600).map(|i| quote("EUR", 1.0 + i as f64)).collect();
        repo.append_history(&batch).unwrap();
        assert_eq!(repo.load_history().unwrap().len(), 600);

        repo.append_history(&batch).unwrap();
        let history = repo.load_history().unwrap();
        assert_eq!(history.len(), MAX_HISTORY_RECORDS);
        // Oldest records were dropped; the tail is the latest batch.
        assert_eq!(history.last().unwrap().rate, 600.0);
    }

    #[test]
    fn test_corrupt_history_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());

        fs::write(dir.path().join("history.json"), "{not json").unwrap();
        assert!(repo.load_history().unwrap().is_empty());

        repo.append_history(&[quote("EUR", 1.08)]).unwrap();
        assert_eq!(repo.load_history().unwrap().len(), 1);
    }
}
