//! Balance and spend reporting types.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

// ============================================================================
// Amount
// ============================================================================

/// A monetary metric that a backend may or may not be able to report.
///
/// `Unsupported` is a sentinel distinct from zero: a backend that cannot
/// report spend is not the same as a backend that reports zero spend.
/// Aggregation excludes the sentinel from sums and renderers show it as a
/// placeholder glyph, never as `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    /// A reported numeric value.
    Value(f64),
    /// The backend does not report this metric.
    Unsupported,
}

impl Amount {
    /// Returns the numeric value, or `None` for the unsupported sentinel.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Unsupported => None,
        }
    }

    /// Returns true if the metric is reported.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl From<f64> for Amount {
    fn from(v: f64) -> Self {
        Self::Value(v)
    }
}

// Wire shape: a number when reported, the string "-" when unsupported.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::Unsupported => serializer.serialize_str("-"),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or the string \"-\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                Ok(Amount::Value(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                Ok(Amount::Value(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount::Value(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                if v == "-" {
                    Ok(Amount::Unsupported)
                } else {
                    v.parse::<f64>()
                        .map(Amount::Value)
                        .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }

            fn visit_unit<E: de::Error>(self) -> Result<Amount, E> {
                Ok(Amount::Unsupported)
            }

            fn visit_none<E: de::Error>(self) -> Result<Amount, E> {
                Ok(Amount::Unsupported)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.2}"),
            Self::Unsupported => f.write_str("-"),
        }
    }
}

// ============================================================================
// Balance Report
// ============================================================================

/// Normalized balance/spend data for one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceReport {
    /// Platform display name.
    pub platform: String,
    /// Remaining account balance.
    pub balance: Amount,
    /// Currency code of the balance.
    pub currency: String,
    /// Amount spent so far, if the backend reports it.
    pub spent: Amount,
    /// Currency code of the spent figure.
    pub spent_currency: String,
    /// The raw backend payload, kept for JSON output and debugging.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl BalanceReport {
    /// Creates a report with an unsupported spend metric.
    pub fn balance_only(
        platform: impl Into<String>,
        balance: f64,
        currency: impl Into<String>,
        raw: serde_json::Value,
    ) -> Self {
        let currency = currency.into();
        Self {
            platform: platform.into(),
            balance: Amount::Value(balance),
            spent: Amount::Unsupported,
            spent_currency: currency.clone(),
            currency,
            raw,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
