//! Validated form definitions
//!
//! A [`FormSchema`] is the serializable description of a wizard. Building a
//! [`FormDefinition`] from it checks that ids are unique, that every condition
//! looks only at answers collected earlier in the flow, that consistency rules
//! name real fields, and that patterns and custom predicates resolve.

use super::consistency::{ConsistencyChecker, ConsistencyWarning};
use super::field::FormField;
use super::rules::{PredicateRegistry, ValidationResult, Validator};
use super::step::FormStep;
use super::value::{is_blank, FormData};
use crate::error::DefinitionError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Serializable description of a wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormSchema {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub steps: Vec<FormStep>,
    #[serde(default, skip_serializing_if = "ConsistencyChecker::is_empty")]
    pub consistency: ConsistencyChecker,
}

impl FormSchema {
    pub fn new(id: &str, title: &str, steps: Vec<FormStep>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            steps,
            consistency: ConsistencyChecker::default(),
        }
    }

    pub fn with_consistency(mut self, consistency: ConsistencyChecker) -> Self {
        self.consistency = consistency;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Behaviour switches for the wizard controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardOptions {
    pub allow_back: bool,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self { allow_back: true }
    }
}

/// A schema that has passed all structural checks, ready to drive a wizard
#[derive(Debug, Clone)]
pub struct FormDefinition {
    schema: FormSchema,
    validator: Validator,
    options: WizardOptions,
}

impl FormDefinition {
    pub fn new(
        schema: FormSchema,
        predicates: PredicateRegistry,
        options: WizardOptions,
    ) -> Result<Self, DefinitionError> {
        if schema.steps.is_empty() {
            return Err(DefinitionError::Empty {
                form: schema.id.clone(),
            });
        }

        let mut validator = Validator::new(predicates);
        let mut step_ids = HashSet::new();
        let mut collected: HashSet<&str> = HashSet::new();

        for step in &schema.steps {
            if !step_ids.insert(step.id.as_str()) {
                return Err(DefinitionError::DuplicateStep(step.id.clone()));
            }
            if let Some(condition) = &step.conditional {
                if !collected.contains(condition.field.as_str()) {
                    return Err(DefinitionError::ForwardReference {
                        owner: format!("step `{}`", step.id),
                        field: condition.field.clone(),
                    });
                }
            }
            for field in &step.fields {
                if let Some(condition) = &field.conditional {
                    if !collected.contains(condition.field.as_str()) {
                        return Err(DefinitionError::ForwardReference {
                            owner: format!("field `{}`", field.id),
                            field: condition.field.clone(),
                        });
                    }
                }
                if !collected.insert(field.id.as_str()) {
                    return Err(DefinitionError::DuplicateField(field.id.clone()));
                }
                validator.prepare(field)?;
            }
        }

        for rule in schema.consistency.rules() {
            if let Some(missing) = rule.check.fields().into_iter().find(|f| !collected.contains(f)) {
                return Err(DefinitionError::UnknownConsistencyField {
                    rule: rule.name.clone(),
                    field: missing.to_string(),
                });
            }
        }

        Ok(Self {
            schema,
            validator,
            options,
        })
    }

    /// Parse and validate a JSON schema in one go
    pub fn from_json(
        json: &str,
        predicates: PredicateRegistry,
        options: WizardOptions,
    ) -> anyhow::Result<Self> {
        let schema = FormSchema::from_json(json)?;
        Ok(Self::new(schema, predicates, options)?)
    }

    /// Pin the date used by `today` bounds
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.validator = self.validator.with_today(today);
        self
    }

    pub fn id(&self) -> &str {
        &self.schema.id
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn options(&self) -> WizardOptions {
        self.options
    }

    pub fn steps(&self) -> &[FormStep] {
        &self.schema.steps
    }

    pub fn step(&self, index: usize) -> Option<&FormStep> {
        self.schema.steps.get(index)
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.schema.steps.iter().find_map(|s| s.field(id))
    }

    pub fn field_count(&self) -> usize {
        self.schema.steps.iter().map(|s| s.fields.len()).sum()
    }

    /// Indexes of the steps whose gates currently hold, in order
    pub fn active_steps(&self, data: &FormData) -> Vec<usize> {
        self.schema
            .steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.is_active(data))
            .map(|(i, _)| i)
            .collect()
    }

    /// Validate the shown fields of one step
    pub fn validate_step(&self, index: usize, data: &FormData) -> ValidationResult {
        let Some(step) = self.step(index) else {
            return ValidationResult::valid();
        };
        let mut result = ValidationResult::valid();
        for field in step.active_fields(data) {
            result.merge(self.validator.validate(field, data.get(&field.id)));
        }
        result
    }

    /// Validate every shown field of every active step
    pub fn validate_all(&self, data: &FormData) -> ValidationResult {
        let mut result = ValidationResult::valid();
        for index in self.active_steps(data) {
            result.merge(self.validate_step(index, data));
        }
        result
    }

    pub fn check_consistency(&self, data: &FormData) -> Vec<ConsistencyWarning> {
        self.schema.consistency.check(data)
    }

    /// Answers to the fields that are currently shown, dropping blanks
    pub fn collect_active(&self, data: &FormData) -> FormData {
        let mut collected = FormData::new();
        for index in self.active_steps(data) {
            for field in self.schema.steps[index].active_fields(data) {
                if let Some(value) = data.get(&field.id).filter(|v| !is_blank(Some(*v))) {
                    collected.insert(field.id.clone(), value.clone());
                }
            }
        }
        collected
    }
}
