//! Currency code normalization.

use crate::core::error::RateError;

/// Normalizes a user-supplied currency code: trims, uppercases, and checks
/// the 2-5 character alphanumeric shape shared by ISO fiat codes and crypto
/// tickers.
pub fn normalize_code(input: &str) -> Result<String, RateError> {
    let code = input.trim().to_ascii_uppercase();
    let valid = (2..=5).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid {
        return Err(RateError::UnknownCurrency {
            code: input.trim().to_string(),
        });
    }
    Ok(code)
}
