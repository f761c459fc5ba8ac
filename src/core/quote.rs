//! Rate data model shared by sources, the store, and the resolver.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One observed exchange rate between two currencies, from one source at one
/// point in time. Quotes are immutable facts; the store decides which one to
/// keep per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub base: String,
    pub quote: String,
    pub rate: f64,
    pub observed_at: DateTime<Utc>,
    pub source: String,
}

impl RateQuote {
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.base, &self.quote)
    }

    /// A quote is stale once its age strictly exceeds the TTL.
    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.observed_at > ttl
    }
}

/// Ordered pair key in `BASE_QUOTE` form, e.g. `BTC_USD`. Doubles as the key
/// format of the persisted rates file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairKey(String);

impl PairKey {
    pub fn new(base: &str, quote: &str) -> Self {
        PairKey(format!("{base}_{quote}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote_observed_at(observed_at: DateTime<Utc>) -> RateQuote {
        RateQuote {
            base: "BTC".to_string(),
            quote: "USD".to_string(),
            rate: 59337.21,
            observed_at,
            source: "coingecko".to_string(),
        }
    }

    #[test]
    fn test_pair_key_format() {
        let quote = quote_observed_at(Utc::now());
        assert_eq!(quote.pair_key().as_str(), "BTC_USD");
        assert_eq!(PairKey::new("EUR", "USD").to_string(), "EUR_USD");
    }

    #[test]
    fn test_staleness_boundary() {
        let now = Utc::now();
        let ttl = Duration::seconds(300);

        let just_fresh = quote_observed_at(now - Duration::seconds(299));
        assert!(!just_fresh.is_stale(ttl, now));

        let exactly_ttl = quote_observed_at(now - Duration::seconds(300));
        assert!(!exactly_ttl.is_stale(ttl, now));

        let just_stale = quote_observed_at(now - Duration::seconds(301));
        assert!(just_stale.is_stale(ttl, now));
    }
}
