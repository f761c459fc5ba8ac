//! One refresh cycle across all configured rate sources.

use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::core::quote::RateQuote;
use crate::core::source::RateSource;
use crate::store::RateStore;
use crate::store::repository::RatesRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Every polled source returned data.
    Success,
    /// At least one source succeeded and at least one failed.
    Partial,
    /// Every polled source failed; the store was left untouched.
    Failed,
}

impl RefreshOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshOutcome::Success => "success",
            RefreshOutcome::Partial => "partial",
            RefreshOutcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SourceStatus {
    Ok { quotes: usize },
    Failed { kind: &'static str, error: String },
}

/// Per-cycle report returned to the caller and logged; never persisted.
#[derive(Debug)]
pub struct RefreshResult {
    pub per_source: BTreeMap<String, SourceStatus>,
    pub merged: usize,
    pub outcome: RefreshOutcome,
}

/// Orchestrates one refresh: fetches every source concurrently, contains
/// per-source failures, merges the survivors into the store in one step, and
/// persists the result. Holds no rate state of its own between cycles.
pub struct Updater {
    sources: Vec<Arc<dyn RateSource>>,
    store: Arc<RateStore>,
    repository: Arc<dyn RatesRepository>,
    // Single-flight: at most one cycle body runs at a time, whether
    // triggered by the scheduler, the CLI, or a lazy read-path refresh.
    flight: Mutex<()>,
}

impl Updater {
    pub fn new(
        sources: Vec<Arc<dyn RateSource>>,
        store: Arc<RateStore>,
        repository: Arc<dyn RatesRepository>,
    ) -> Self {
        Self {
            sources,
            store,
            repository,
            flight: Mutex::new(()),
        }
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.id()).collect()
    }

    /// Runs one refresh cycle, optionally restricted to a single source.
    /// `Err` is reserved for infrastructure problems (an unknown source
    /// filter, persistence I/O); source failures are reported through
    /// `RefreshResult` instead.
    pub async fn run_cycle(&self, source_filter: Option<&str>) -> Result<RefreshResult> {
        let _flight = self.flight.lock().await;

        let selected: Vec<&Arc<dyn RateSource>> = match source_filter {
            Some(id) => {
                let selected: Vec<_> =
                    self.sources.iter().filter(|source| source.id() == id).collect();
                if selected.is_empty() {
                    anyhow::bail!(
                        "unknown source '{}', expected one of: {}",
                        id,
                        self.source_ids().join(", ")
                    );
                }
                selected
            }
            None => self.sources.iter().collect(),
        };

        info!(sources = selected.len(), "Starting refresh cycle");

        let fetches = selected
            .iter()
            .map(|source| async move { (source.id().to_string(), source.fetch().await) });
        let results = join_all(fetches).await;

        let mut per_source = BTreeMap::new();
        let mut quotes: Vec<RateQuote> = Vec::new();
        let mut failed = 0usize;
        for (id, result) in results {
            match result {
                Ok(batch) => {
                    debug!(source = %id, quotes = batch.len(), "Source fetch succeeded");
                    per_source.insert(id, SourceStatus::Ok { quotes: batch.len() });
                    quotes.extend(batch);
                }
                Err(e) => {
                    warn!(source = %id, kind = e.kind(), error = %e, "Source fetch failed");
                    failed += 1;
                    per_source.insert(
                        id,
                        SourceStatus::Failed {
                            kind: e.kind(),
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        let outcome = if failed == 0 {
            RefreshOutcome::Success
        } else if failed < per_source.len() {
            RefreshOutcome::Partial
        } else {
            RefreshOutcome::Failed
        };

        let merged = if outcome == RefreshOutcome::Failed {
            // Stale-if-error: previously cached quotes stay the best
            // available data.
            0
        } else {
            let merged = self.store.merge(&quotes, Utc::now());
            self.store.persist(self.repository.as_ref())?;
            self.repository.append_history(&quotes)?;
            merged
        };

        info!(
            outcome = outcome.as_str(),
            merged,
            failed_sources = failed,
            "Refresh cycle finished"
        );

        Ok(RefreshResult {
            per_source,
            merged,
            outcome,
        })
    }
}
