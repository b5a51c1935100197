//! # Amounts
//!
//! Payment amounts in minor units, as the processor expects them.
//! The checkout form collects whole units; `Amount::from_major` converts.

use serde::{Deserialize, Serialize};

/// Currencies without a minor unit (ISO 4217 exponent 0)
const ZERO_DECIMAL: &[&str] = &[
    "CVE", "DJF", "GNF", "IDR", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "VND", "VUV", "XAF",
    "XOF", "XPF",
];

/// Currencies with three decimal places
const THREE_DECIMAL: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

/// Returns the number of decimal places for an ISO 4217 code
/// (JPY has 0 decimals, KWD has 3, most others have 2)
pub fn decimal_places(currency: &str) -> u32 {
    let code = currency.to_ascii_uppercase();
    if ZERO_DECIMAL.contains(&code.as_str()) {
        0
    } else if THREE_DECIMAL.contains(&code.as_str()) {
        3
    } else {
        2
    }
}

/// Amount with value in the smallest currency unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// ISO 4217 code, upper case
    pub currency: String,
    /// Value in minor units (cents for EUR)
    pub value: i64,
}

impl Amount {
    /// Create an amount from minor units
    pub fn new(currency: impl Into<String>, value: i64) -> Self {
        Self {
            currency: currency.into().to_ascii_uppercase(),
            value,
        }
    }

    /// Create an amount from whole units, e.g. `10 EUR` -> `1000`
    pub fn from_major(major: i64, currency: impl Into<String>) -> Self {
        let currency = currency.into().to_ascii_uppercase();
        let multiplier = 10_i64.pow(decimal_places(&currency));
        Self {
            value: major.saturating_mul(multiplier),
            currency,
        }
    }

    /// Format for display (e.g., "10.00 EUR")
    pub fn display(&self) -> String {
        let places = decimal_places(&self.currency);
        if places == 0 {
            return format!("{} {}", self.value, self.currency);
        }
        let divisor = 10_i64.pow(places);
        format!(
            "{}{}.{:0width$} {}",
            if self.value < 0 { "-" } else { "" },
            (self.value / divisor).abs(),
            (self.value % divisor).abs(),
            self.currency,
            width = places as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major() {
        assert_eq!(Amount::from_major(10, "eur"), Amount::new("EUR", 1000));
        assert_eq!(Amount::from_major(500, "JPY").value, 500);
        assert_eq!(Amount::from_major(2, "KWD").value, 2000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::new("EUR", 1099).display(), "10.99 EUR");
        assert_eq!(Amount::new("USD", 5).display(), "0.05 USD");
        assert_eq!(Amount::new("JPY", 500).display(), "500 JPY");
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(Amount::from_major(10, "EUR")).unwrap();
        assert_eq!(json, serde_json::json!({"currency": "EUR", "value": 1000}));
    }
}
