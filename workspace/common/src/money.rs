use rusty_money::iso;
use std::fmt;
use tracing::debug;

/// A currency code that is not part of ISO 4217.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyError {
    pub code: String,
}

impl fmt::Display for CurrencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown currency code: {}", self.code)
    }
}

impl std::error::Error for CurrencyError {}

/// Checks `code` against the ISO 4217 table and returns its canonical upper-case form.
pub fn normalize_currency_code(code: &str) -> Result<String, CurrencyError> {
    let candidate = code.trim().to_ascii_uppercase();
    match iso::find(&candidate) {
        Some(currency) => Ok(currency.iso_alpha_code.to_string()),
        None => {
            debug!("Rejected currency code '{}'", code);
            Err(CurrencyError {
                code: code.to_string(),
            })
        }
    }
}
