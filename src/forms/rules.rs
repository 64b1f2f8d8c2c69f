//! Field-level validation rules
//!
//! A [`Validator`] checks one answer against its [`FormField`]: presence
//! first, then the format implied by the field type, then each declared rule
//! in order. Every failure after the presence check is reported; a missing
//! answer stops at presence.

use super::field::{FieldType, FormField};
use super::value::{as_date, as_number, display, is_blank, DATE_FORMAT};
use crate::error::DefinitionError;
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ().\-]{6,19}$").unwrap());

/// Either a fixed calendar date or the day validation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Today,
    On(NaiveDate),
}

impl DateBound {
    fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::On(date) => *date,
        }
    }
}

impl fmt::Display for DateBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => f.write_str("today"),
            Self::On(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

impl Serialize for DateBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateBound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.eq_ignore_ascii_case("today") {
            return Ok(Self::Today);
        }
        NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map(Self::On)
            .map_err(serde::de::Error::custom)
    }
}

/// A single constraint on a field's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationRule {
    Required {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Pattern {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Min {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Max {
        value: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MinLength {
        value: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MaxLength {
        value: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MinDate {
        value: DateBound,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MaxDate {
        value: DateBound,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Delegates to a predicate registered under `predicate`
    Custom {
        predicate: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Reads a rule list where parameterless rules may be written by name,
/// as in `["required", {"kind": "min", "value": 0}]`
pub(crate) fn deserialize_rules<'de, D>(deserializer: D) -> Result<Vec<ValidationRule>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Name(String),
        Rule(ValidationRule),
    }

    Vec::<Entry>::deserialize(deserializer)?
        .into_iter()
        .map(|entry| match entry {
            Entry::Rule(rule) => Ok(rule),
            Entry::Name(name) => match name.as_str() {
                "required" => Ok(ValidationRule::required()),
                "email" => Ok(ValidationRule::email()),
                other => Err(serde::de::Error::custom(format!(
                    "rule `{other}` takes parameters; write it as an object with a `kind`"
                ))),
            },
        })
        .collect()
}

impl ValidationRule {
    pub fn required() -> Self {
        Self::Required { message: None }
    }

    pub fn pattern(pattern: &str, message: &str) -> Self {
        Self::Pattern {
            pattern: pattern.to_string(),
            message: Some(message.to_string()),
        }
    }

    pub fn min(value: f64) -> Self {
        Self::Min {
            value,
            message: None,
        }
    }

    pub fn max(value: f64) -> Self {
        Self::Max {
            value,
            message: None,
        }
    }

    pub fn min_length(value: usize) -> Self {
        Self::MinLength {
            value,
            message: None,
        }
    }

    pub fn max_length(value: usize) -> Self {
        Self::MaxLength {
            value,
            message: None,
        }
    }

    pub fn email() -> Self {
        Self::Email { message: None }
    }

    pub fn min_date(value: DateBound) -> Self {
        Self::MinDate {
            value,
            message: None,
        }
    }

    pub fn max_date(value: DateBound) -> Self {
        Self::MaxDate {
            value,
            message: None,
        }
    }

    pub fn custom(predicate: &str, message: &str) -> Self {
        Self::Custom {
            predicate: predicate.to_string(),
            message: Some(message.to_string()),
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            Self::Required { .. } => ErrorKind::Required,
            Self::Pattern { .. } => ErrorKind::Pattern,
            Self::Min { .. } => ErrorKind::Min,
            Self::Max { .. } => ErrorKind::Max,
            Self::MinLength { .. } => ErrorKind::MinLength,
            Self::MaxLength { .. } => ErrorKind::MaxLength,
            Self::Email { .. } => ErrorKind::Email,
            Self::MinDate { .. } => ErrorKind::MinDate,
            Self::MaxDate { .. } => ErrorKind::MaxDate,
            Self::Custom { .. } => ErrorKind::Custom,
        }
    }

    fn custom_message(&self) -> Option<&str> {
        match self {
            Self::Required { message }
            | Self::Pattern { message, .. }
            | Self::Min { message, .. }
            | Self::Max { message, .. }
            | Self::MinLength { message, .. }
            | Self::MaxLength { message, .. }
            | Self::Email { message }
            | Self::MinDate { message, .. }
            | Self::MaxDate { message, .. }
            | Self::Custom { message, .. } => message.as_deref(),
        }
    }

    fn default_message(&self, name: &str) -> String {
        match self {
            Self::Required { .. } => format!("{name} is required"),
            Self::Pattern { .. } => format!("{name} has an invalid format"),
            Self::Min { value, .. } => format!("{name} must be at least {}", number(*value)),
            Self::Max { value, .. } => format!("{name} must be at most {}", number(*value)),
            Self::MinLength { value, .. } => {
                format!("{name} must be at least {value} characters")
            }
            Self::MaxLength { value, .. } => {
                format!("{name} must be at most {value} characters")
            }
            Self::Email { .. } => format!("{name} must be a valid email address"),
            Self::MinDate { value, .. } => format!("{name} must be on or after {value}"),
            Self::MaxDate { value, .. } => format!("{name} must be on or before {value}"),
            Self::Custom { .. } => format!("{name} is invalid"),
        }
    }
}

/// Category of a validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Required,
    Type,
    Pattern,
    Min,
    Max,
    MinLength,
    MaxLength,
    Email,
    MinDate,
    MaxDate,
    Custom,
}

/// One failed check on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of validating one or more fields
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.is_valid = self.errors.is_empty();
    }

    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }
}

/// Custom check over a single answer
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Named predicates available to `custom` rules
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Predicate>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `predicate` under `name`, replacing any earlier one
    pub fn register<F>(mut self, name: &str, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.to_string(), Arc::new(predicate));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.predicates.keys().collect();
        names.sort();
        f.debug_struct("PredicateRegistry")
            .field("predicates", &names)
            .finish()
    }
}

/// Checks answers against field definitions.
///
/// Patterns and predicate names are resolved up front by [`Validator::prepare`],
/// so validation itself cannot fail.
#[derive(Debug, Clone)]
pub struct Validator {
    predicates: PredicateRegistry,
    patterns: HashMap<String, Regex>,
    today: NaiveDate,
}

impl Validator {
    pub fn new(predicates: PredicateRegistry) -> Self {
        Self {
            predicates,
            patterns: HashMap::new(),
            today: Local::now().date_naive(),
        }
    }

    /// Pin the date used for `today` bounds
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Compile patterns and resolve predicates used by `field`
    pub fn prepare(&mut self, field: &FormField) -> Result<(), DefinitionError> {
        if field.field_type.is_choice() && field.options.is_empty() {
            return Err(DefinitionError::MissingOptions(field.id.clone()));
        }
        for rule in &field.rules {
            match rule {
                ValidationRule::Pattern { pattern, .. } => {
                    if self.patterns.contains_key(pattern) {
                        continue;
                    }
                    let compiled =
                        Regex::new(pattern).map_err(|e| DefinitionError::InvalidPattern {
                            field: field.id.clone(),
                            reason: e.to_string(),
                        })?;
                    self.patterns.insert(pattern.clone(), compiled);
                }
                ValidationRule::Custom { predicate, .. } if !self.predicates.contains(predicate) => {
                    return Err(DefinitionError::UnknownPredicate {
                        field: field.id.clone(),
                        predicate: predicate.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate one answer against its field
    pub fn validate(&self, field: &FormField, value: Option<&Value>) -> ValidationResult {
        let name = field.display_name();

        if is_blank(value) || unticked_requirement(field, value) {
            if !field.is_required() {
                return ValidationResult::valid();
            }
            let message = field
                .rules
                .iter()
                .find(|r| matches!(r, ValidationRule::Required { .. }))
                .and_then(|r| r.custom_message())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{name} is required"));
            return ValidationResult::from_errors(vec![FieldError {
                field: field.id.clone(),
                kind: ErrorKind::Required,
                message,
            }]);
        }
        let Some(value) = value else {
            return ValidationResult::valid();
        };

        let mut errors = Vec::new();
        if let Some(message) = self.type_error(field, value) {
            errors.push(FieldError {
                field: field.id.clone(),
                kind: ErrorKind::Type,
                message,
            });
        }
        for rule in &field.rules {
            if self.passes(rule, value) {
                continue;
            }
            errors.push(FieldError {
                field: field.id.clone(),
                kind: rule.kind(),
                message: rule
                    .custom_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| rule.default_message(name)),
            });
        }
        ValidationResult::from_errors(errors)
    }

    fn type_error(&self, field: &FormField, value: &Value) -> Option<String> {
        let name = field.display_name();
        let ok = match field.field_type {
            FieldType::Text | FieldType::Textarea => value.is_string() || value.is_number(),
            FieldType::Number => as_number(value).is_some(),
            FieldType::Email => value.as_str().is_some_and(|s| EMAIL_RE.is_match(s.trim())),
            FieldType::Phone => value.as_str().is_some_and(|s| PHONE_RE.is_match(s.trim())),
            FieldType::Date => as_date(value).is_some(),
            FieldType::Select => value
                .as_str()
                .is_some_and(|s| field.options.iter().any(|o| o == s)),
            FieldType::MultiSelect => value.as_array().is_some_and(|items| {
                items.iter().all(|item| {
                    item.as_str()
                        .is_some_and(|s| field.options.iter().any(|o| o == s))
                })
            }),
            FieldType::Checkbox => value.is_boolean(),
        };
        if ok {
            return None;
        }
        Some(match field.field_type {
            FieldType::Text | FieldType::Textarea => format!("{name} must be text"),
            FieldType::Number => format!("{name} must be a number"),
            FieldType::Email => format!("{name} must be a valid email address"),
            FieldType::Phone => format!("{name} must be a valid phone number"),
            FieldType::Date => format!("{name} must be a date (YYYY-MM-DD)"),
            FieldType::Select | FieldType::MultiSelect => {
                format!("{name} must be one of: {}", field.options.join(", "))
            }
            FieldType::Checkbox => format!("{name} must be checked or unchecked"),
        })
    }

    fn passes(&self, rule: &ValidationRule, value: &Value) -> bool {
        match rule {
            ValidationRule::Required { .. } => true,
            ValidationRule::Pattern { pattern, .. } => self
                .patterns
                .get(pattern)
                .is_some_and(|re| re.is_match(&display(value))),
            ValidationRule::Min { value: min, .. } => as_number(value).is_some_and(|n| n >= *min),
            ValidationRule::Max { value: max, .. } => as_number(value).is_some_and(|n| n <= *max),
            ValidationRule::MinLength { value: min, .. } => length(value).is_some_and(|n| n >= *min),
            ValidationRule::MaxLength { value: max, .. } => length(value).is_some_and(|n| n <= *max),
            ValidationRule::Email { .. } => {
                value.as_str().is_some_and(|s| EMAIL_RE.is_match(s.trim()))
            }
            ValidationRule::MinDate { value: bound, .. } => {
                as_date(value).is_some_and(|d| d >= bound.resolve(self.today))
            }
            ValidationRule::MaxDate { value: bound, .. } => {
                as_date(value).is_some_and(|d| d <= bound.resolve(self.today))
            }
            ValidationRule::Custom { predicate, .. } => {
                self.predicates.get(predicate).is_some_and(|p| p(value))
            }
        }
    }
}

/// A required checkbox is only answered once it is ticked
fn unticked_requirement(field: &FormField, value: Option<&Value>) -> bool {
    field.field_type == FieldType::Checkbox
        && field.is_required()
        && value == Some(&Value::Bool(false))
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.trim().chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Print whole bounds without a trailing `.0`
fn number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
