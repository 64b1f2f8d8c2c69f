//! Form data and value coercions shared by the rule evaluators

use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;

/// Collected answers keyed by field id
pub type FormData = BTreeMap<String, Value>;

/// ISO calendar date format used by date fields
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// True when a field has no usable answer for validation purposes.
///
/// Missing, `null`, blank strings and empty arrays all count as absent.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// True when a condition target has not been collected at all
pub fn is_missing(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Numeric view of a value: numbers, and strings that parse as numbers
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Date view of a value: strings in `YYYY-MM-DD` form
pub fn as_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok(),
        _ => None,
    }
}

/// Renders a scalar for substring matching and messages
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Equality with number/string and bool/string coercion
pub fn loosely_equal(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }
    match (left, right) {
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            match (as_number(left), as_number(right)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            s.trim() == if *b { "true" } else { "false" }
        }
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_values() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&Value::Null)));
        assert!(is_blank(Some(&json!(""))));
        assert!(is_blank(Some(&json!("   "))));
        assert!(is_blank(Some(&json!([]))));
        assert!(!is_blank(Some(&json!(0))));
        assert!(!is_blank(Some(&json!(false))));
        assert!(!is_blank(Some(&json!("x"))));
    }

    #[test]
    fn test_missing_is_narrower_than_blank() {
        assert!(is_missing(None));
        assert!(is_missing(Some(&Value::Null)));
        assert!(!is_missing(Some(&json!(""))));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(as_number(&json!(3)), Some(3.0));
        assert_eq!(as_number(&json!(" 4.5 ")), Some(4.5));
        assert_eq!(as_number(&json!("four")), None);
        assert_eq!(as_number(&json!("NaN")), None);
        assert_eq!(as_number(&json!(true)), None);
    }

    #[test]
    fn test_date_coercion() {
        assert_eq!(
            as_date(&json!("1990-01-31")),
            NaiveDate::from_ymd_opt(1990, 1, 31)
        );
        assert_eq!(as_date(&json!("31/01/1990")), None);
        assert_eq!(as_date(&json!(19900131)), None);
    }

    #[test]
    fn test_loose_equality() {
        assert!(loosely_equal(&json!("Spouse"), &json!("Spouse")));
        assert!(loosely_equal(&json!(5), &json!("5")));
        assert!(loosely_equal(&json!("5.0"), &json!(5)));
        assert!(loosely_equal(&json!(true), &json!("true")));
        assert!(loosely_equal(&json!(1), &json!(1.0)));
        assert!(!loosely_equal(&json!("spouse"), &json!("Spouse")));
        assert!(!loosely_equal(&json!(0), &json!(false)));
    }
}
