pub mod coingecko;
pub mod exchangerate;

use std::time::Duration;

/// Per-request timeout applied inside every adapter; an expired request
/// surfaces as `SourceError::Unavailable`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
