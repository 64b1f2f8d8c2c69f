//! Conditional visibility for fields and steps

use super::value::{as_date, as_number, display, is_missing, loosely_equal, FormData};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison applied between the target field and the rule's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

/// Shows a field or step only when another field's answer matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl ConditionalRule {
    pub fn new(field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value: value.into(),
        }
    }

    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Equals, value)
    }

    pub fn not_equals(field: &str, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::NotEquals, value)
    }

    /// Evaluate against the current answers.
    ///
    /// A missing target only satisfies `not_equals`.
    pub fn evaluate(&self, data: &FormData) -> bool {
        let target = data.get(&self.field);
        let Some(target) = target.filter(|_| !is_missing(target)) else {
            return self.operator == Operator::NotEquals;
        };

        match self.operator {
            Operator::Equals => loosely_equal(target, &self.value),
            Operator::NotEquals => !loosely_equal(target, &self.value),
            Operator::Contains => contains(target, &self.value),
            Operator::GreaterThan => compare(target, &self.value) == Some(Ordering::Greater),
            Operator::LessThan => compare(target, &self.value) == Some(Ordering::Less),
        }
    }
}

fn contains(target: &Value, needle: &Value) -> bool {
    match target {
        Value::String(haystack) => haystack.contains(display(needle).as_str()),
        Value::Array(items) => items.iter().any(|item| loosely_equal(item, needle)),
        _ => false,
    }
}

/// Numbers first, then ISO dates; anything else is incomparable
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return a.partial_cmp(&b);
    }
    match (as_date(left), as_date(right)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(pairs: &[(&str, Value)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    mod missing_target_tests {
        use super::*;

        #[test]
        fn test_only_not_equals_holds_for_missing_field() {
            let empty = FormData::new();
            let cases = [
                (Operator::Equals, false),
                (Operator::NotEquals, true),
                (Operator::Contains, false),
                (Operator::GreaterThan, false),
                (Operator::LessThan, false),
            ];
            for (operator, expected) in cases {
                let rule = ConditionalRule::new("status", operator, "x");
                assert_eq!(rule.evaluate(&empty), expected, "{operator:?}");
            }
        }

        #[test]
        fn test_null_counts_as_missing() {
            let answers = data(&[("status", Value::Null)]);
            assert!(!ConditionalRule::equals("status", Value::Null).evaluate(&answers));
            assert!(ConditionalRule::not_equals("status", "x").evaluate(&answers));
        }
    }

    mod equality_tests {
        use super::*;

        #[test]
        fn test_relationship_spouse() {
            let rule = ConditionalRule::equals("relationship", "Spouse");
            assert!(rule.evaluate(&data(&[("relationship", json!("Spouse"))])));
            assert!(!rule.evaluate(&FormData::new()));
            assert!(!rule.evaluate(&data(&[("relationship", json!("Child"))])));
        }

        #[test]
        fn test_not_equals_present_value() {
            let rule = ConditionalRule::not_equals("maritalStatus", "Single");
            assert!(!rule.evaluate(&data(&[("maritalStatus", json!("Single"))])));
            assert!(rule.evaluate(&data(&[("maritalStatus", json!("Married"))])));
        }

        #[test]
        fn test_number_string_coercion() {
            let rule = ConditionalRule::equals("children", 2);
            assert!(rule.evaluate(&data(&[("children", json!("2"))])));
        }
    }

    mod contains_tests {
        use super::*;

        #[test]
        fn test_substring() {
            let rule = ConditionalRule::new("notes", Operator::Contains, "asylum");
            assert!(rule.evaluate(&data(&[("notes", json!("prior asylum claim"))])));
            assert!(!rule.evaluate(&data(&[("notes", json!("none"))])));
        }

        #[test]
        fn test_array_membership() {
            let rule = ConditionalRule::new("visas", Operator::Contains, "H-1B");
            assert!(rule.evaluate(&data(&[("visas", json!(["F-1", "H-1B"]))])));
            assert!(!rule.evaluate(&data(&[("visas", json!(["F-1"]))])));
        }

        #[test]
        fn test_non_container_is_false() {
            let rule = ConditionalRule::new("count", Operator::Contains, 1);
            assert!(!rule.evaluate(&data(&[("count", json!(1))])));
            assert!(!rule.evaluate(&data(&[("count", json!({"a": 1}))])));
        }
    }

    mod ordering_tests {
        use super::*;

        #[test]
        fn test_numeric_ordering() {
            let gt = ConditionalRule::new("age", Operator::GreaterThan, 17);
            let lt = ConditionalRule::new("age", Operator::LessThan, 18);
            let adult = data(&[("age", json!("30"))]);
            assert!(gt.evaluate(&adult));
            assert!(!lt.evaluate(&adult));
        }

        #[test]
        fn test_date_ordering() {
            let rule = ConditionalRule::new("entryDate", Operator::LessThan, "2001-01-01");
            assert!(rule.evaluate(&data(&[("entryDate", json!("1999-06-15"))])));
            assert!(!rule.evaluate(&data(&[("entryDate", json!("2005-06-15"))])));
        }

        #[test]
        fn test_incomparable_is_false() {
            let gt = ConditionalRule::new("name", Operator::GreaterThan, 3);
            let lt = ConditionalRule::new("name", Operator::LessThan, 3);
            let answers = data(&[("name", json!("Ana"))]);
            assert!(!gt.evaluate(&answers));
            assert!(!lt.evaluate(&answers));
        }
    }

    #[test]
    fn test_deserialize_snake_case_operator() {
        let rule: ConditionalRule = serde_json::from_str(
            r#"{"field": "relationship", "operator": "not_equals", "value": "Spouse"}"#,
        )
        .unwrap();
        assert_eq!(rule.operator, Operator::NotEquals);
    }
}
