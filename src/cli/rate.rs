use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::{debug, warn};

use super::ui;
use crate::App;
use crate::core::currency::normalize_code;
use crate::updater::RefreshOutcome;

pub async fn run(app: &App, from: &str, to: &str) -> Result<()> {
    let from = normalize_code(from)?;
    let to = normalize_code(to)?;

    // Lazy refresh: when the whole cache is older than the TTL, try to fetch
    // fresh data before answering. A failed refresh falls back to whatever
    // is cached.
    let ttl = Duration::seconds(app.config.ttl_seconds as i64);
    let cache_age = app.store.last_refresh().map(|at| Utc::now() - at);
    if cache_age.is_none_or(|age| age > ttl) {
        debug!("Rate cache is older than TTL; refreshing before resolving");
        match app.updater.run_cycle(None).await {
            Ok(result) if result.outcome == RefreshOutcome::Failed => {
                warn!("Refresh failed; serving cached rates");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Refresh failed; serving cached rates"),
        }
    }

    let resolved = app.resolver.resolve(&from, &to)?;

    println!("Rate {from}->{to}: {:.8}", resolved.rate);
    println!("As of: {}", resolved.as_of.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Inverse {to}->{from}: {:.6}", 1.0 / resolved.rate);
    if resolved.stale {
        println!(
            "{} rate is older than the configured TTL ({}s)",
            ui::style_text("warning:", ui::StyleType::Warning),
            app.config.ttl_seconds
        );
    }
    Ok(())
}
