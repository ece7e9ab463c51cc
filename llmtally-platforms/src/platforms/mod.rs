//! Per-platform handler implementations.

pub mod anthropic;
pub mod code88;
pub mod deepseek;
pub mod moonshot;
pub mod openai;
pub mod relay;
pub mod siliconflow;
pub mod volcengine;
pub mod zhipu;

use serde_json::Value;

/// Browser-like User-Agent most of these dashboards expect.
pub(crate) const BROWSER_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Reads a numeric field that backends variously encode as a number or a
/// string (sometimes with thousands separators).
pub(crate) fn number_field(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_field_accepts_both_encodings() {
        assert_eq!(number_field(&json!(12.5)), Some(12.5));
        assert_eq!(number_field(&json!("110.00")), Some(110.0));
        assert_eq!(number_field(&json!("1,234.5")), Some(1234.5));
        assert_eq!(number_field(&json!(null)), None);
        assert_eq!(number_field(&json!("n/a")), None);
    }
}
