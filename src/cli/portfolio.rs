use anyhow::{Context, Result};
use comfy_table::Cell;

use super::ui;
use crate::App;
use crate::core::currency::normalize_code;
use crate::valuation::{Valuation, value_holdings};

impl Valuation {
    pub fn display_as_table(&self) -> String {
        let base = &self.base_currency;

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell("Amount"),
            ui::header_cell(&format!("Rate ({base})")),
            ui::header_cell(&format!("Value ({base})")),
        ]);

        for position in &self.positions {
            let rate = match position.rate {
                Some(rate) if position.stale => ui::num_cell(format!("{rate:.6}*")),
                Some(rate) => ui::num_cell(format!("{rate:.6}")),
                None => ui::num_cell("-".to_string()),
            };
            table.add_row(vec![
                Cell::new(&position.currency),
                ui::num_cell(format!("{:.4}", position.amount)),
                rate,
                ui::num_cell(format!("{:.2}", position.value)),
            ]);
        }

        let mut output = format!(
            "Portfolio valuation ({})\n\n",
            ui::style_text(base, ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\nTotal ({}): {}",
            ui::style_text(base, ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}", self.total), ui::StyleType::TotalValue)
        ));
        if self.stale {
            output.push('\n');
            output.push_str(&ui::style_text(
                "* rate is older than the configured TTL",
                ui::StyleType::Subtle,
            ));
        }
        output
    }
}

pub fn run(app: &App, base_override: Option<&str>) -> Result<()> {
    let base = normalize_code(base_override.unwrap_or(&app.config.base_currency))?;

    if app.config.holdings.is_empty() {
        println!("No holdings configured. Add a 'holdings' section to the config file.");
        return Ok(());
    }

    let valuation = value_holdings(&app.config.holdings, &app.resolver, &base)
        .context("Portfolio valuation failed")?;
    println!("{}", valuation.display_as_table());
    Ok(())
}
