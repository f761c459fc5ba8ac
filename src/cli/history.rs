use anyhow::Result;
use comfy_table::Cell;

use super::ui;
use crate::App;
use crate::core::currency::normalize_code;
use crate::store::repository::RatesRepository;

pub fn run(app: &App, from: Option<&str>, to: Option<&str>, limit: usize) -> Result<()> {
    let from = from.map(normalize_code).transpose()?;
    let to = to.map(normalize_code).transpose()?;

    let history = app.repository.load_history()?;
    let mut records: Vec<_> = history
        .iter()
        .filter(|record| {
            from.as_deref().is_none_or(|code| record.base == code)
                && to.as_deref().is_none_or(|code| record.quote == code)
        })
        .collect();

    if records.is_empty() {
        println!("No rate history recorded yet.");
        return Ok(());
    }

    // Keep the most recent records, displayed oldest first.
    if records.len() > limit {
        records.drain(..records.len() - limit);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Observed"),
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("Source"),
    ]);
    for record in &records {
        table.add_row(vec![
            Cell::new(record.observed_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(record.pair_key().as_str()),
            ui::num_cell(format!("{:.8}", record.rate)),
            Cell::new(&record.source),
        ]);
    }
    println!("{table}");
    Ok(())
}
