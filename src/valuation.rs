//! Portfolio valuation in a chosen base currency.

use crate::core::config::Holding;
use crate::core::error::RateError;
use crate::core::resolve::RateResolver;

#[derive(Debug, Clone)]
pub struct PositionValue {
    pub currency: String,
    pub amount: f64,
    /// `None` for zero-amount holdings, which are priced without a rate.
    pub rate: Option<f64>,
    pub value: f64,
    pub stale: bool,
}

#[derive(Debug, Clone)]
pub struct Valuation {
    pub base_currency: String,
    pub positions: Vec<PositionValue>,
    pub total: f64,
    /// True when any rate used was older than the TTL.
    pub stale: bool,
}

/// Prices every holding into `base_currency`. All-or-nothing: a single
/// non-zero holding without a resolvable rate fails the whole valuation,
/// naming the offending currency. Zero-amount holdings contribute zero
/// without needing a rate, so currencies the user once touched but no longer
/// holds cannot fail a valuation.
pub fn value_holdings(
    holdings: &[Holding],
    resolver: &RateResolver,
    base_currency: &str,
) -> Result<Valuation, RateError> {
    let mut positions = Vec::with_capacity(holdings.len());
    let mut total = 0.0;
    let mut stale = false;

    for holding in holdings {
        if holding.amount == 0.0 {
            positions.push(PositionValue {
                currency: holding.currency.clone(),
                amount: 0.0,
                rate: None,
                value: 0.0,
                stale: false,
            });
            continue;
        }

        let resolved = resolver.resolve(&holding.currency, base_currency)?;
        let value = holding.amount * resolved.rate;
        total += value;
        stale |= resolved.stale;
        positions.push(PositionValue {
            currency: holding.currency.clone(),
            amount: holding.amount,
            rate: Some(resolved.rate),
            value,
            stale: resolved.stale,
        });
    }

    Ok(Valuation {
        base_currency: base_currency.to_string(),
        positions,
        total,
        stale,
    })
}
