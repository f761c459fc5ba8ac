//! The capability every upstream rate provider implements.

use async_trait::async_trait;

use crate::core::error::SourceError;
use crate::core::quote::RateQuote;

/// Produces zero or more rate quotes from one upstream provider. Adapters
/// only translate the provider's wire format; caching, retry and fallback
/// policy live in the updater.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Stable identifier used in refresh reports and quote provenance.
    fn id(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<RateQuote>, SourceError>;
}
