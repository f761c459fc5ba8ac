use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::App;
use crate::scheduler::Scheduler;

pub async fn run(app: &App) -> Result<()> {
    let hours = app.config.refresh_interval_hours;
    println!("Refreshing every {hours}h; press Ctrl-C to stop.");

    let scheduler = Scheduler::start(
        Arc::clone(&app.updater),
        Duration::from_secs(hours * 3600),
    );

    tokio::signal::ctrl_c().await?;
    println!("Stopping after the current cycle...");
    scheduler.stop().await;
    println!("Scheduler stopped.");
    Ok(())
}
