//! Wizard pages

use super::condition::ConditionalRule;
use super::field::FormField;
use super::value::FormData;
use serde::{Deserialize, Serialize};

/// One page of a wizard: its questions and an optional gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormStep {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub fields: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<ConditionalRule>,
}

impl FormStep {
    pub fn new(id: &str, title: &str, fields: Vec<FormField>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            fields,
            conditional: None,
        }
    }

    /// Only show the step when `condition` holds
    pub fn when(mut self, condition: ConditionalRule) -> Self {
        self.conditional = Some(condition);
        self
    }

    pub fn is_active(&self, data: &FormData) -> bool {
        self.conditional.as_ref().is_none_or(|c| c.evaluate(data))
    }

    /// Fields currently shown on this step
    pub fn active_fields<'a>(&'a self, data: &'a FormData) -> impl Iterator<Item = &'a FormField> {
        self.fields
            .iter()
            .filter(move |f| f.conditional.as_ref().is_none_or(|c| c.evaluate(data)))
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn family_step() -> FormStep {
        FormStep::new(
            "family",
            "Family",
            vec![
                FormField::select("maritalStatus", "Marital status", &["Single", "Married"]),
                FormField::text("spouseName", "Spouse name")
                    .when(ConditionalRule::equals("maritalStatus", "Married")),
            ],
        )
    }

    #[test]
    fn test_unconditional_step_is_active() {
        assert!(family_step().is_active(&FormData::new()));
    }

    #[test]
    fn test_gated_step() {
        let step = family_step().when(ConditionalRule::equals("hasFamily", true));
        assert!(!step.is_active(&FormData::new()));
        let mut data = FormData::new();
        data.insert("hasFamily".to_string(), json!(true));
        assert!(step.is_active(&data));
    }

    #[test]
    fn test_conditional_fields_follow_answers() {
        let step = family_step();
        let mut data = FormData::new();
        let ids: Vec<_> = step.active_fields(&data).map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["maritalStatus"]);

        data.insert("maritalStatus".to_string(), json!("Married"));
        let ids: Vec<_> = step.active_fields(&data).map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["maritalStatus", "spouseName"]);
    }
}
