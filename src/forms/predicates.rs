//! Stock custom predicates for immigration intake forms

use super::rules::PredicateRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// A-Number: `A` followed by 8 or 9 digits, dashes allowed
static ALIEN_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^A-?\d{3}-?\d{3}-?\d{2,3}$").unwrap());

/// Case receipt: three letters and ten digits
static RECEIPT_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}\d{10}$").unwrap());

static US_ZIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}(-\d{4})?$").unwrap());

fn matches(re: &Regex, value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| re.is_match(&s.trim().to_ascii_uppercase()))
}

/// Registry holding `alien_number`, `receipt_number` and `us_zip`
pub fn builtin() -> PredicateRegistry {
    PredicateRegistry::new()
        .register("alien_number", |v| matches(&ALIEN_NUMBER_RE, v))
        .register("receipt_number", |v| matches(&RECEIPT_NUMBER_RE, v))
        .register("us_zip", |v| matches(&US_ZIP_RE, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(name: &str, value: Value) -> bool {
        let registry = builtin();
        let predicate = registry.get(name).unwrap();
        predicate(&value)
    }

    #[test]
    fn test_alien_number() {
        assert!(check("alien_number", json!("A123456789")));
        assert!(check("alien_number", json!("a-123-456-78")));
        assert!(!check("alien_number", json!("123456789")));
        assert!(!check("alien_number", json!(123456789)));
    }

    #[test]
    fn test_receipt_number() {
        assert!(check("receipt_number", json!("IOE0912345678")));
        assert!(!check("receipt_number", json!("IOE091234567")));
    }

    #[test]
    fn test_us_zip() {
        assert!(check("us_zip", json!("94110")));
        assert!(check("us_zip", json!("94110-1234")));
        assert!(!check("us_zip", json!("9411")));
    }
}
