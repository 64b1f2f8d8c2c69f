//! Form field definitions

use super::condition::ConditionalRule;
use super::rules::{deserialize_rules, ValidationRule};
use serde::{Deserialize, Serialize};

/// Primitive kinds of input a field collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Email,
    Phone,
    Date,
    Select,
    MultiSelect,
    Checkbox,
}

impl FieldType {
    /// Whether answers must come from the field's `options`
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::MultiSelect)
    }
}

/// A single question in a form step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(
        default,
        alias = "validationRules",
        deserialize_with = "deserialize_rules",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub rules: Vec<ValidationRule>,
    /// Allowed answers for choice fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<ConditionalRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl FormField {
    /// Create a field of any type with no rules
    pub fn new(id: &str, field_type: FieldType, label: &str) -> Self {
        Self {
            id: id.to_string(),
            field_type,
            label: label.to_string(),
            required: false,
            rules: Vec::new(),
            options: Vec::new(),
            conditional: None,
            placeholder: None,
            help_text: None,
        }
    }

    pub fn text(id: &str, label: &str) -> Self {
        Self::new(id, FieldType::Text, label)
    }

    pub fn number(id: &str, label: &str) -> Self {
        Self::new(id, FieldType::Number, label)
    }

    pub fn email(id: &str, label: &str) -> Self {
        Self::new(id, FieldType::Email, label)
    }

    pub fn date(id: &str, label: &str) -> Self {
        Self::new(id, FieldType::Date, label)
    }

    /// Create a single-choice field
    pub fn select(id: &str, label: &str, options: &[&str]) -> Self {
        Self {
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Self::new(id, FieldType::Select, label)
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Append a validation rule
    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Only show the field when `condition` holds
    pub fn when(mut self, condition: ConditionalRule) -> Self {
        self.conditional = Some(condition);
        self
    }

    /// Whether the field demands an answer, by flag or by rule
    pub fn is_required(&self) -> bool {
        self.required
            || self
                .rules
                .iter()
                .any(|r| matches!(r, ValidationRule::Required { .. }))
    }

    /// Name used in messages: the label, or the id when unlabeled
    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_by_flag_or_rule() {
        assert!(FormField::text("a", "A").required().is_required());
        assert!(FormField::text("a", "A")
            .rule(ValidationRule::required())
            .is_required());
        assert!(!FormField::text("a", "A").is_required());
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        assert_eq!(FormField::number("age", "").display_name(), "age");
        assert_eq!(FormField::number("age", "Age").display_name(), "Age");
    }

    #[test]
    fn test_select_options() {
        let field = FormField::select("relationship", "Relationship", &["Spouse", "Child"]);
        assert_eq!(field.field_type, FieldType::Select);
        assert_eq!(field.options, vec!["Spouse", "Child"]);
        assert!(field.field_type.is_choice());
    }

    #[test]
    fn test_deserialize_minimal_field() {
        let field: FormField = serde_json::from_str(r#"{"id": "age", "type": "number"}"#).unwrap();
        assert_eq!(field.id, "age");
        assert_eq!(field.field_type, FieldType::Number);
        assert!(field.label.is_empty());
        assert!(!field.required);
        assert!(field.rules.is_empty());
        assert!(field.conditional.is_none());
    }

    #[test]
    fn test_validation_rules_key_with_bare_names() {
        let field: FormField = serde_json::from_str(
            r#"{"id": "age", "type": "number", "validationRules": ["required"]}"#,
        )
        .unwrap();
        assert_eq!(field.rules, vec![ValidationRule::required()]);
        assert!(field.is_required());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let parsed: Result<FormField, _> =
            serde_json::from_str(r#"{"id": "age", "type": "number", "requried": true}"#);
        let err = parsed.unwrap_err().to_string();
        assert!(err.contains("requried"), "{err}");
    }

    #[test]
    fn test_serialize_skips_empty_parts() {
        let json = serde_json::to_string(&FormField::text("name", "Name")).unwrap();
        assert!(!json.contains("rules"));
        assert!(!json.contains("options"));
        assert!(!json.contains("conditional"));
        assert!(json.contains(r#""type":"text""#));
    }
}
