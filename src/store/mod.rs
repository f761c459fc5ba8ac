pub mod repository;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::core::quote::{PairKey, RateQuote};
use repository::{RatesDocument, RatesRepository};

/// Immutable view of the rate cache. Readers hold an `Arc` to one snapshot
/// and can never observe a half-applied merge.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub pairs: HashMap<PairKey, RateQuote>,
    pub last_refresh: Option<DateTime<Utc>>,
}

/// The single writable owner of rate truth. Writes go through `merge`,
/// which builds a new snapshot and swaps it in; a failed refresh never
/// deletes previously cached pairs.
pub struct RateStore {
    inner: RwLock<Arc<Snapshot>>,
}

impl RateStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    pub fn hydrate(repository: &dyn RatesRepository) -> anyhow::Result<Self> {
        let document = repository.load_rates()?;
        debug!(pairs = document.pairs.len(), "Hydrated rate store");
        Ok(Self {
            inner: RwLock::new(Arc::new(Snapshot {
                pairs: document.pairs,
                last_refresh: document.last_refresh,
            })),
        })
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.read().unwrap().clone()
    }

    /// Exact lookup for the ordered pair; no inversion or triangulation.
    pub fn get(&self, base: &str, quote: &str) -> Option<RateQuote> {
        self.snapshot().pairs.get(&PairKey::new(base, quote)).cloned()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.snapshot().last_refresh
    }

    pub fn len(&self) -> usize {
        self.snapshot().pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().pairs.is_empty()
    }

    /// Merges a batch of quotes, latest observation winning per ordered
    /// pair. Non-positive rates and same-currency pairs are rejected as
    /// malformed. Returns the number of quotes applied.
    pub fn merge(&self, incoming: &[RateQuote], now: DateTime<Utc>) -> usize {
        let mut guard = self.inner.write().unwrap();
        let mut pairs = guard.pairs.clone();
        let mut merged = 0;

        for quote in incoming {
            if !(quote.rate > 0.0 && quote.rate.is_finite()) {
                warn!(pair = %quote.pair_key(), rate = quote.rate, "Rejecting malformed rate");
                continue;
            }
            if quote.base == quote.quote {
                warn!(pair = %quote.pair_key(), "Rejecting same-currency pair");
                continue;
            }
            let key = quote.pair_key();
            match pairs.get(&key) {
                Some(existing) if existing.observed_at > quote.observed_at => {
                    debug!(pair = %key, "Keeping newer stored quote");
                }
                _ => {
                    pairs.insert(key, quote.clone());
                    merged += 1;
                }
            }
        }

        *guard = Arc::new(Snapshot {
            pairs,
            last_refresh: Some(now),
        });
        merged
    }

    pub fn persist(&self, repository: &dyn RatesRepository) -> anyhow::Result<()> {
        let snapshot = self.snapshot();
        repository.save_rates(&RatesDocument {
            pairs: snapshot.pairs.clone(),
            last_refresh: snapshot.last_refresh,
        })
    }
}

impl Default for RateStore {
    fn default() -> Self {
        Self::new()
    }
}
