//! Cross-field consistency rules
//!
//! These run over the whole answer set at submission. A rule only applies
//! when every field it names has a usable answer; otherwise it is skipped.

use super::value::{as_date, as_number, is_blank, loosely_equal, FormData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyCheck {
    /// `later` must not fall before `earlier`
    DateOrder { earlier: String, later: String },
    /// `greater` must not be below `lesser`
    NumberOrder { lesser: String, greater: String },
    /// Both answers must be equal
    FieldsMatch { first: String, second: String },
}

impl ConsistencyCheck {
    /// Field ids the check reads
    pub fn fields(&self) -> [&str; 2] {
        match self {
            Self::DateOrder { earlier, later } => [earlier.as_str(), later.as_str()],
            Self::NumberOrder { lesser, greater } => [lesser.as_str(), greater.as_str()],
            Self::FieldsMatch { first, second } => [first.as_str(), second.as_str()],
        }
    }
}

/// A named cross-field check with its user-facing message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyRule {
    pub name: String,
    #[serde(flatten)]
    pub check: ConsistencyCheck,
    pub message: String,
}

impl ConsistencyRule {
    pub fn date_order(name: &str, earlier: &str, later: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            check: ConsistencyCheck::DateOrder {
                earlier: earlier.to_string(),
                later: later.to_string(),
            },
            message: message.to_string(),
        }
    }

    pub fn number_order(name: &str, lesser: &str, greater: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            check: ConsistencyCheck::NumberOrder {
                lesser: lesser.to_string(),
                greater: greater.to_string(),
            },
            message: message.to_string(),
        }
    }

    pub fn fields_match(name: &str, first: &str, second: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            check: ConsistencyCheck::FieldsMatch {
                first: first.to_string(),
                second: second.to_string(),
            },
            message: message.to_string(),
        }
    }

    /// `Some(true)` if consistent, `Some(false)` if not, `None` if not applicable
    pub fn holds(&self, data: &FormData) -> Option<bool> {
        let [a, b] = self.check.fields();
        let (left, right) = (data.get(a), data.get(b));
        if is_blank(left) || is_blank(right) {
            return None;
        }
        let (left, right) = (left?, right?);
        match &self.check {
            ConsistencyCheck::DateOrder { .. } => Some(as_date(right)? >= as_date(left)?),
            ConsistencyCheck::NumberOrder { .. } => Some(as_number(right)? >= as_number(left)?),
            ConsistencyCheck::FieldsMatch { .. } => Some(loosely_equal(left, right)),
        }
    }
}

/// A failed consistency rule; reported but never blocking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyWarning {
    pub rule: String,
    pub fields: Vec<String>,
    pub message: String,
}

/// Ordered set of cross-field rules for one form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsistencyChecker {
    rules: Vec<ConsistencyRule>,
}

impl ConsistencyChecker {
    pub fn new(rules: Vec<ConsistencyRule>) -> Self {
        Self { rules }
    }

    pub fn with_rule(mut self, rule: ConsistencyRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[ConsistencyRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule in registration order
    pub fn check(&self, data: &FormData) -> Vec<ConsistencyWarning> {
        self.rules
            .iter()
            .filter(|rule| rule.holds(data) == Some(false))
            .map(|rule| ConsistencyWarning {
                rule: rule.name.clone(),
                fields: rule.check.fields().iter().map(|f| f.to_string()).collect(),
                message: rule.message.clone(),
            })
            .collect()
    }
}
