//! Error taxonomy for source fetches and rate resolution.

use thiserror::Error;

/// Failure modes of a single source fetch. Contained by the updater; one
/// source failing never aborts a refresh cycle.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("rate limited by provider")]
    RateLimited,
}

impl SourceError {
    /// Short kind tag for refresh reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Unavailable(_) => "unavailable",
            SourceError::MalformedResponse(_) => "malformed",
            SourceError::RateLimited => "rate-limited",
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::MalformedResponse(err.to_string())
        } else {
            // Timeouts, connect failures and everything else transport-level.
            SourceError::Unavailable(err.to_string())
        }
    }
}

/// Resolution and valuation failures. These propagate to the caller: the
/// requested computation is genuinely impossible with current data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    #[error("no exchange rate available for {from}->{to}")]
    Unavailable { from: String, to: String },
    #[error("stored rate for {pair} is corrupt (zero)")]
    CorruptRate { pair: String },
    #[error("unknown currency code '{code}'")]
    UnknownCurrency { code: String },
}
