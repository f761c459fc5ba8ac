use anyhow::Result;
use chrono::Utc;
use console::style;

use super::ui;
use crate::App;
use crate::updater::{RefreshOutcome, SourceStatus};

pub async fn run(app: &App, source_filter: Option<&str>) -> Result<()> {
    let spinner = ui::new_spinner("Refreshing rates...");
    let result = app.updater.run_cycle(source_filter).await;
    spinner.finish_and_clear();
    let result = result?;

    for (id, status) in &result.per_source {
        match status {
            SourceStatus::Ok { quotes } => {
                println!("{} {id}: {quotes} quotes", style("ok").green().bold());
            }
            SourceStatus::Failed { kind, error } => {
                println!("{} {id}: {error} [{kind}]", style("error").red().bold());
            }
        }
    }

    match result.outcome {
        RefreshOutcome::Success => {
            println!("Updated {} rates.", result.merged);
            Ok(())
        }
        RefreshOutcome::Partial => {
            // Fresh data from the surviving sources was kept; the failure is
            // a warning, not an error.
            println!(
                "{} some sources failed; updated {} rates from the rest.",
                ui::style_text("warning:", ui::StyleType::Warning),
                result.merged
            );
            Ok(())
        }
        RefreshOutcome::Failed => {
            let cached_note = match app.store.last_refresh() {
                Some(at) => format!(
                    "cached rates from {} ago are still being served",
                    ui::format_age(Utc::now() - at)
                ),
                None => "no cached rates are available".to_string(),
            };
            println!(
                "{} every source failed; {}.",
                ui::style_text("error:", ui::StyleType::Error),
                cached_note
            );
            anyhow::bail!("refresh failed for every source")
        }
    }
}
