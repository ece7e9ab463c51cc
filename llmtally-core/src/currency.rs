//! Exchange-rate table and currency conversion.
//!
//! All rates are expressed relative to a fixed base currency (CNY). The
//! table is seeded with defaults, optionally overridden from the
//! [`RATES_ENV_VAR`] environment variable at construction, and immutable
//! afterwards.

use std::collections::BTreeMap;

use tracing::warn;

/// Environment variable carrying a JSON object of currency-code → rate
/// overrides, e.g. `LLMTALLY_RATES='{"USD": 7.3}'`.
pub const RATES_ENV_VAR: &str = "LLMTALLY_RATES";

/// The base currency every rate is expressed against.
const BASE_CURRENCY: &str = "CNY";

// ============================================================================
// Rate Table
// ============================================================================

/// Exchange rates relative to the CNY base, immutable once built.
#[derive(Debug, Clone)]
pub struct RateTable {
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    /// Builds the default-seeded table with no overrides.
    pub fn seeded() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert("CNY".to_string(), 1.0);
        rates.insert("USD".to_string(), 7.2);
        rates.insert("EUR".to_string(), 7.8);
        rates.insert("GBP".to_string(), 9.1);
        rates.insert("JPY".to_string(), 0.048);
        rates.insert("KRW".to_string(), 0.0054);
        // Platform-specific points currencies
        rates.insert("Points".to_string(), 0.01);
        Self { rates }
    }

    /// Builds the table from the default seed merged with the
    /// [`RATES_ENV_VAR`] environment override.
    pub fn from_env() -> Self {
        let mut table = Self::seeded();
        if let Ok(raw) = std::env::var(RATES_ENV_VAR) {
            table.merge_json(&raw);
        }
        table
    }

    /// Merges a JSON object of code → rate over the current table.
    ///
    /// A malformed payload leaves the defaults untouched; rates must be
    /// positive to be accepted.
    fn merge_json(&mut self, raw: &str) {
        match serde_json::from_str::<BTreeMap<String, f64>>(raw) {
            Ok(overrides) => {
                for (code, rate) in overrides {
                    if rate > 0.0 {
                        self.rates.insert(code, rate);
                    } else {
                        warn!(code = %code, rate, "Ignoring non-positive rate override");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Ignoring malformed {} override", RATES_ENV_VAR);
            }
        }
    }

    /// Returns the rate for a currency code, or the implicit 1:1 rate for
    /// codes not in the table.
    pub fn rate(&self, code: &str) -> f64 {
        self.rates.get(code).copied().unwrap_or(1.0)
    }

    /// Returns true if the code is actually listed (vs. falling back to the
    /// implicit 1:1 rate). Renderers use this to flag assumed rates.
    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    /// All listed currency codes, sorted.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }

    /// Iterates over (code, rate) pairs, sorted by code.
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(c, r)| (c.as_str(), *r))
    }

    /// The base currency the table is expressed against.
    pub fn base(&self) -> &'static str {
        BASE_CURRENCY
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::seeded()
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Converts an amount between currencies through the CNY base.
///
/// `rate[from]` CNY buys one unit of `from`, so the amount is first scaled
/// into CNY and then into the target. Unknown codes use an implicit 1:1
/// rate rather than failing; callers surface that via [`RateTable::contains`].
pub fn convert(amount: f64, from: &str, to: &str, rates: &RateTable) -> f64 {
    if from == to {
        return amount;
    }
    amount * rates.rate(from) / rates.rate(to)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_conversion_is_exact() {
        let rates = RateTable::seeded();
        assert_eq!(convert(42.5, "USD", "USD", &rates), 42.5);
    }

    #[test]
    fn cny_to_usd_matches_table() {
        let rates = RateTable::seeded();
        let usd = convert(72.0, "CNY", "USD", &rates);
        assert!((usd - 10.0).abs() < 1e-9);
    }

    #[test]
    fn round_trip_all_pairs() {
        let rates = RateTable::seeded();
        let codes: Vec<&str> = rates.codes().collect();
        for from in &codes {
            for to in &codes {
                let there = convert(123.456, from, to, &rates);
                let back = convert(there, to, from, &rates);
                assert!(
                    (back - 123.456).abs() < 1e-9,
                    "round trip {from} -> {to} drifted: {back}"
                );
            }
        }
    }

    #[test]
    fn unknown_code_uses_identity_rate() {
        let rates = RateTable::seeded();
        assert!(!rates.contains("XYZ"));
        // Implicit 1:1 against the base
        assert!((convert(5.0, "XYZ", "CNY", &rates) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn merge_accepts_overrides_and_rejects_garbage() {
        let mut table = RateTable::seeded();
        table.merge_json(r#"{"USD": 7.3, "HKD": 0.92, "BAD": -1.0}"#);
        assert!((table.rate("USD") - 7.3).abs() < 1e-9);
        assert!((table.rate("HKD") - 0.92).abs() < 1e-9);
        assert!(!table.contains("BAD"));

        let before: Vec<(String, f64)> = table
            .entries()
            .map(|(c, r)| (c.to_string(), r))
            .collect();
        table.merge_json("not json");
        let after: Vec<(String, f64)> = table
            .entries()
            .map(|(c, r)| (c.to_string(), r))
            .collect();
        assert_eq!(before, after);
    }
}
