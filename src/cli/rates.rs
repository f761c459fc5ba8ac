use anyhow::Result;
use chrono::{Duration, Utc};
use comfy_table::Cell;

use super::ui;
use crate::App;
use crate::core::currency::normalize_code;
use crate::core::quote::RateQuote;

pub fn run(app: &App, currency_filter: Option<&str>, top: Option<usize>) -> Result<()> {
    let snapshot = app.store.snapshot();
    if snapshot.pairs.is_empty() {
        println!("Local rate cache is empty. Run 'valuta refresh' to load rates.");
        return Ok(());
    }

    let filter = currency_filter.map(normalize_code).transpose()?;
    let mut quotes: Vec<&RateQuote> = snapshot
        .pairs
        .values()
        .filter(|quote| {
            filter
                .as_deref()
                .is_none_or(|code| quote.base == code || quote.quote == code)
        })
        .collect();

    if quotes.is_empty() {
        println!("No cached rate involves '{}'.", filter.unwrap_or_default());
        return Ok(());
    }

    quotes.sort_by(|a, b| b.rate.partial_cmp(&a.rate).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(top) = top {
        quotes.truncate(top);
    }

    let now = Utc::now();
    let ttl = Duration::seconds(app.config.ttl_seconds as i64);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("Age"),
        ui::header_cell("Source"),
    ]);
    for quote in &quotes {
        table.add_row(vec![
            Cell::new(quote.pair_key().as_str()),
            ui::num_cell(format!("{:.8}", quote.rate)),
            ui::age_cell(now - quote.observed_at, quote.is_stale(ttl, now)),
            Cell::new(&quote.source),
        ]);
    }
    println!("{table}");

    let last_refresh = match snapshot.last_refresh {
        Some(at) => format!("{} ago", ui::format_age(now - at)),
        None => "never".to_string(),
    };
    println!(
        "{}",
        ui::style_text(
            &format!("{} rates shown; last refresh {}", quotes.len(), last_refresh),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}
