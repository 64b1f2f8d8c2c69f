//! Async driver around a [`Wizard`]
//!
//! The session owns a store and takes care of the two I/O concerns the
//! controller leaves to its host: best-effort auto-save of drafts, and
//! delivering the finished submission.

use crate::error::WizardError;
use crate::forms::{
    Advance, ConsistencyWarning, FormDefinition, SubmitOutcome, ValidationResult, Wizard,
};
use crate::store::FormStore;
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

/// Shown to the user when the store rejects a submission
const SUBMIT_FAILED: &str = "Submission failed, please try again";

/// What happened after a forward move or submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStep {
    Moved { from: usize, to: usize },
    Blocked(ValidationResult),
    Submitted {
        receipt: String,
        warnings: Vec<ConsistencyWarning>,
    },
    Failed { reason: String },
}

pub struct WizardSession<S: FormStore> {
    wizard: Wizard,
    store: S,
    auto_save_every: usize,
    unsaved_changes: usize,
}

impl<S: FormStore> WizardSession<S> {
    /// Wrap a wizard; `auto_save_every` of zero disables auto-save
    pub fn new(wizard: Wizard, store: S, auto_save_every: usize) -> Self {
        Self {
            wizard,
            store,
            auto_save_every,
            unsaved_changes: 0,
        }
    }

    /// Start a wizard from the stored draft, or empty if there is none
    pub async fn resume(
        definition: Arc<FormDefinition>,
        store: S,
        auto_save_every: usize,
    ) -> Result<Self> {
        let draft = store.load_draft(definition.id()).await?;
        let wizard = match draft {
            Some(data) => {
                tracing::info!(form = definition.id(), answers = data.len(), "resumed draft");
                Wizard::resume(definition, data)
            }
            None => Wizard::new(definition),
        };
        Ok(Self::new(wizard, store, auto_save_every))
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record an answer, auto-saving once enough changes pile up
    pub async fn set_value(&mut self, field: &str, value: Value) -> Result<(), WizardError> {
        self.wizard.set_value(field, value)?;
        self.unsaved_changes += 1;
        if self.auto_save_every > 0 && self.unsaved_changes >= self.auto_save_every {
            self.save_draft().await;
        }
        Ok(())
    }

    /// Best-effort draft save; failures are logged and swallowed
    pub async fn save_draft(&mut self) -> bool {
        let form_id = self.wizard.definition().id().to_string();
        match self.store.save_draft(&form_id, self.wizard.data()).await {
            Ok(()) => {
                tracing::debug!(form = %form_id, "draft saved");
                self.unsaved_changes = 0;
                true
            }
            Err(e) => {
                tracing::warn!(form = %form_id, "auto-save failed: {e:#}");
                false
            }
        }
    }

    /// Move forward; passing the last step submits
    pub async fn next(&mut self) -> Result<SessionStep, WizardError> {
        match self.wizard.next()? {
            Advance::Moved { from, to } => Ok(SessionStep::Moved { from, to }),
            Advance::Blocked(result) => Ok(SessionStep::Blocked(result)),
            Advance::ReadyToSubmit => self.submit().await,
        }
    }

    pub fn back(&mut self) -> Result<usize, WizardError> {
        self.wizard.back()
    }

    /// Validate, then hand the submission to the store.
    ///
    /// The store call is awaited to completion; there is no cancellation.
    pub async fn submit(&mut self) -> Result<SessionStep, WizardError> {
        let submission = match self.wizard.submit()? {
            SubmitOutcome::Ready(submission) => submission,
            SubmitOutcome::Blocked { result, .. } => return Ok(SessionStep::Blocked(result)),
        };

        match self.store.submit(&submission).await {
            Ok(receipt) => {
                self.wizard.mark_submitted()?;
                tracing::info!(
                    form = %submission.form_id,
                    %receipt,
                    warnings = submission.warnings.len(),
                    "submission delivered"
                );
                if let Err(e) = self.store.clear_draft(&submission.form_id).await {
                    tracing::warn!(form = %submission.form_id, "could not clear draft: {e:#}");
                }
                Ok(SessionStep::Submitted {
                    receipt,
                    warnings: submission.warnings,
                })
            }
            Err(e) => {
                tracing::warn!(form = %submission.form_id, "submission failed: {e:#}");
                self.wizard.mark_failed(SUBMIT_FAILED)?;
                Ok(SessionStep::Failed {
                    reason: SUBMIT_FAILED.to_string(),
                })
            }
        }
    }
}
