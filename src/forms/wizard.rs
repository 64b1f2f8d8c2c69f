//! Adaptive wizard controller
//!
//! The controller walks the *active* steps of a [`FormDefinition`], i.e. the
//! steps whose gates hold for the answers collected so far. Activity is
//! recomputed from the data on every call, so changing an earlier answer can
//! add or remove later steps without any bookkeeping.
//!
//! ```text
//!  AtStep(n) --next--> AtStep(m)         (m = next active step after n)
//!  AtStep(last) --next--> Submitting
//!  Submitting --submit--> Submitting     (ready: host sends the submission)
//!             \---------> AtStep(k)      (blocked: first step with errors)
//!  Submitting --mark_submitted--> Submitted
//!  Submitting --mark_failed-----> Failed --edit/submit--> ...
//! ```
//!
//! No transition performs I/O; the caller owns transport.

use super::consistency::ConsistencyWarning;
use super::definition::FormDefinition;
use super::rules::ValidationResult;
use super::step::FormStep;
use super::value::FormData;
use crate::error::WizardError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Where the wizard is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WizardState {
    /// Showing the step at this index of the definition
    AtStep { index: usize },
    Submitting,
    Submitted,
    Failed { reason: String },
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtStep { index } => write!(f, "at step {index}"),
            Self::Submitting => f.write_str("submitting"),
            Self::Submitted => f.write_str("submitted"),
            Self::Failed { .. } => f.write_str("failed"),
        }
    }
}

/// Result of asking for the next step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved { from: usize, to: usize },
    /// The current step has field errors; the wizard did not move
    Blocked(ValidationResult),
    /// The last active step passed; the wizard is now `Submitting`
    ReadyToSubmit,
}

/// Answers ready to hand to a store, with non-blocking warnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub form_id: String,
    pub data: FormData,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Result of a submission attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ready(Submission),
    /// Field errors block submission; the wizard returned to `step`
    Blocked {
        step: usize,
        result: ValidationResult,
    },
}

/// Drives one user's pass through a form
#[derive(Debug, Clone)]
pub struct Wizard {
    definition: Arc<FormDefinition>,
    data: FormData,
    state: WizardState,
}

impl Wizard {
    pub fn new(definition: Arc<FormDefinition>) -> Self {
        Self::resume(definition, FormData::new())
    }

    /// Start over the first step with previously saved answers
    pub fn resume(definition: Arc<FormDefinition>, data: FormData) -> Self {
        let first = definition.active_steps(&data).first().copied().unwrap_or(0);
        Self {
            definition,
            data,
            state: WizardState::AtStep { index: first },
        }
    }

    pub fn definition(&self) -> &Arc<FormDefinition> {
        &self.definition
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            WizardState::AtStep { index } => Some(index),
            _ => None,
        }
    }

    pub fn current_step(&self) -> Option<&FormStep> {
        self.current_index().and_then(|i| self.definition.step(i))
    }

    pub fn active_steps(&self) -> Vec<usize> {
        self.definition.active_steps(&self.data)
    }

    /// 1-based position among active steps and the number of active steps
    pub fn progress(&self) -> (usize, usize) {
        let active = self.active_steps();
        let position = match self.state {
            WizardState::AtStep { index } => active.iter().filter(|&&i| i <= index).count(),
            _ => active.len(),
        };
        (position, active.len())
    }

    /// Record an answer
    pub fn set_value(&mut self, field: &str, value: Value) -> Result<(), WizardError> {
        self.ensure_editable(field)?;
        tracing::debug!(field, "answer recorded");
        self.data.insert(field.to_string(), value);
        self.reopen_after_failure();
        Ok(())
    }

    /// Forget an answer
    pub fn clear_value(&mut self, field: &str) -> Result<(), WizardError> {
        self.ensure_editable(field)?;
        self.data.remove(field);
        self.reopen_after_failure();
        Ok(())
    }

    /// Validate the current step without moving
    pub fn validate_current(&self) -> ValidationResult {
        match self.current_index() {
            Some(index) => self.definition.validate_step(index, &self.data),
            None => ValidationResult::valid(),
        }
    }

    /// Validate every active step without moving
    pub fn validate_all(&self) -> ValidationResult {
        self.definition.validate_all(&self.data)
    }

    /// Validate the current step and move forward on success
    pub fn next(&mut self) -> Result<Advance, WizardError> {
        let WizardState::AtStep { index } = self.state else {
            return Err(self.invalid("advance"));
        };

        let active = self.active_steps();
        if active.contains(&index) {
            let result = self.definition.validate_step(index, &self.data);
            if !result.is_valid {
                tracing::debug!(step = index, errors = result.errors.len(), "step blocked");
                return Ok(Advance::Blocked(result));
            }
        }

        match active.into_iter().find(|&i| i > index) {
            Some(to) => {
                tracing::debug!(from = index, to, "advanced");
                self.state = WizardState::AtStep { index: to };
                Ok(Advance::Moved { from: index, to })
            }
            None => {
                tracing::debug!(step = index, "last step passed, submitting");
                self.state = WizardState::Submitting;
                Ok(Advance::ReadyToSubmit)
            }
        }
    }

    /// Return to the previous active step, keeping all answers
    pub fn back(&mut self) -> Result<usize, WizardError> {
        if !self.definition.options().allow_back {
            return Err(WizardError::BackNotAllowed);
        }
        let index = match &self.state {
            WizardState::AtStep { index } => *index,
            WizardState::Failed { .. } => self.last_active_step() + 1,
            WizardState::Submitting => return Err(WizardError::SubmissionPending),
            WizardState::Submitted => return Err(WizardError::AlreadySubmitted),
        };
        let previous = self
            .active_steps()
            .into_iter()
            .rev()
            .find(|&i| i < index)
            .ok_or(WizardError::AtFirstStep)?;
        tracing::debug!(from = index, to = previous, "went back");
        self.state = WizardState::AtStep { index: previous };
        Ok(previous)
    }

    /// Re-validate everything and build the submission.
    ///
    /// Field errors block and send the wizard back to the first failing
    /// step. Consistency problems are attached as warnings only.
    pub fn submit(&mut self) -> Result<SubmitOutcome, WizardError> {
        if !matches!(
            self.state,
            WizardState::Submitting | WizardState::Failed { .. }
        ) {
            return Err(self.invalid("submit"));
        }

        let active = self.active_steps();
        let result = self.definition.validate_all(&self.data);
        if !result.is_valid {
            let step = active
                .iter()
                .copied()
                .find(|&i| !self.definition.validate_step(i, &self.data).is_valid)
                .unwrap_or(0);
            tracing::debug!(step, errors = result.errors.len(), "submission blocked");
            self.state = WizardState::AtStep { index: step };
            return Ok(SubmitOutcome::Blocked { step, result });
        }

        let data = self.definition.collect_active(&self.data);
        let warnings = self.definition.check_consistency(&data);
        self.state = WizardState::Submitting;
        Ok(SubmitOutcome::Ready(Submission {
            form_id: self.definition.id().to_string(),
            data,
            warnings,
        }))
    }

    /// The host delivered the submission
    pub fn mark_submitted(&mut self) -> Result<(), WizardError> {
        if self.state != WizardState::Submitting {
            return Err(self.invalid("complete"));
        }
        self.state = WizardState::Submitted;
        Ok(())
    }

    /// The host failed to deliver the submission
    pub fn mark_failed(&mut self, reason: &str) -> Result<(), WizardError> {
        if self.state != WizardState::Submitting {
            return Err(self.invalid("fail"));
        }
        self.state = WizardState::Failed {
            reason: reason.to_string(),
        };
        Ok(())
    }

    fn ensure_editable(&self, field: &str) -> Result<(), WizardError> {
        match self.state {
            WizardState::Submitting => return Err(WizardError::SubmissionPending),
            WizardState::Submitted => return Err(WizardError::AlreadySubmitted),
            _ => {}
        }
        if self.definition.field(field).is_none() {
            return Err(WizardError::UnknownField(field.to_string()));
        }
        Ok(())
    }

    fn reopen_after_failure(&mut self) {
        if let WizardState::Failed { .. } = self.state {
            self.state = WizardState::AtStep {
                index: self.last_active_step(),
            };
        }
    }

    fn last_active_step(&self) -> usize {
        self.active_steps().last().copied().unwrap_or(0)
    }

    fn invalid(&self, action: &'static str) -> WizardError {
        WizardError::InvalidTransition {
            action,
            state: self.state.to_string(),
        }
    }
}
