//! Cross-rate resolution over the cached quotes.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::RateError;
use crate::core::quote::PairKey;
use crate::store::{RateStore, Snapshot};

/// A resolved rate plus the freshness of the data behind it. `stale` is true
/// when any quote used was older than the TTL at lookup time; callers decide
/// whether to trust the number or refresh first.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRate {
    pub rate: f64,
    /// Timestamp of the oldest quote involved.
    pub as_of: DateTime<Utc>,
    pub stale: bool,
}

struct Leg {
    rate: f64,
    as_of: DateTime<Utc>,
    stale: bool,
}

/// Pure reader over the store: direct quote, inverse quote, or a single hop
/// through the configured base currency. No multi-hop graph search.
pub struct RateResolver {
    store: Arc<RateStore>,
    base_currency: String,
    ttl: Duration,
}

impl RateResolver {
    pub fn new(store: Arc<RateStore>, base_currency: &str, ttl_seconds: u64) -> Self {
        Self {
            store,
            base_currency: base_currency.to_string(),
            ttl: Duration::seconds(ttl_seconds as i64),
        }
    }

    pub fn resolve(&self, from: &str, to: &str) -> Result<ResolvedRate, RateError> {
        let now = Utc::now();
        if from == to {
            return Ok(ResolvedRate {
                rate: 1.0,
                as_of: now,
                stale: false,
            });
        }

        let snapshot = self.store.snapshot();

        if let Some(leg) = self.leg(&snapshot, from, to, now)? {
            return Ok(ResolvedRate {
                rate: leg.rate,
                as_of: leg.as_of,
                stale: leg.stale,
            });
        }

        // One hop through the base currency; each leg may itself be direct
        // or inverted.
        let via = self.base_currency.as_str();
        if let (Some(first), Some(second)) = (
            self.leg(&snapshot, from, via, now)?,
            self.leg(&snapshot, via, to, now)?,
        ) {
            return Ok(ResolvedRate {
                rate: first.rate * second.rate,
                as_of: first.as_of.min(second.as_of),
                stale: first.stale || second.stale,
            });
        }

        debug!(from, to, via, "No direct or one-hop rate path");
        Err(RateError::Unavailable {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Direct quote, or the multiplicative inverse of the reverse quote.
    /// `None` when the snapshot holds neither direction.
    fn leg(
        &self,
        snapshot: &Snapshot,
        from: &str,
        to: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Leg>, RateError> {
        if from == to {
            return Ok(Some(Leg {
                rate: 1.0,
                as_of: now,
                stale: false,
            }));
        }
        if let Some(quote) = snapshot.pairs.get(&PairKey::new(from, to)) {
            return Ok(Some(Leg {
                rate: quote.rate,
                as_of: quote.observed_at,
                stale: quote.is_stale(self.ttl, now),
            }));
        }
        if let Some(quote) = snapshot.pairs.get(&PairKey::new(to, from)) {
            // Merge rejects non-positive rates, so a zero here means the
            // persisted data is damaged.
            if quote.rate == 0.0 {
                return Err(RateError::CorruptRate {
                    pair: quote.pair_key().to_string(),
                });
            }
            return Ok(Some(Leg {
                rate: 1.0 / quote.rate,
                as_of: quote.observed_at,
                stale: quote.is_stale(self.ttl, now),
            }));
        }
        Ok(None)
    }
}
