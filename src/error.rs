//! Error types for form definitions and wizard transitions.
//!
//! Field validation failures and consistency warnings are not errors here;
//! they are ordinary data returned to the caller (see [`crate::forms`]).

/// A form definition that cannot be used to drive a wizard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    /// The definition has no steps.
    #[error("form `{form}` has no steps")]
    Empty { form: String },

    /// Two steps share an id.
    #[error("duplicate step id `{0}`")]
    DuplicateStep(String),

    /// Two fields share an id, possibly across steps.
    #[error("duplicate field id `{0}`")]
    DuplicateField(String),

    /// A condition names a field that is not collected before it.
    #[error("{owner} depends on `{field}`, which is not collected before it")]
    ForwardReference { owner: String, field: String },

    /// A consistency rule names a field that does not exist.
    #[error("consistency rule `{rule}` references unknown field `{field}`")]
    UnknownConsistencyField { rule: String, field: String },

    /// A pattern rule carries an invalid regular expression.
    #[error("field `{field}` has an invalid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },

    /// A custom rule names a predicate that was never registered.
    #[error("field `{field}` uses unregistered predicate `{predicate}`")]
    UnknownPredicate { field: String, predicate: String },

    /// A choice field was declared without choices.
    #[error("field `{0}` is a choice field without options")]
    MissingOptions(String),
}

/// A wizard transition that is not legal in the current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("going back is disabled for this form")]
    BackNotAllowed,

    #[error("already at the first step")]
    AtFirstStep,

    #[error("a submission is in progress")]
    SubmissionPending,

    #[error("the form has already been submitted")]
    AlreadySubmitted,

    /// `submit` called outside `Submitting`/`Failed`, or `next` outside a step.
    #[error("cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: String },

    #[error("unknown field `{0}`")]
    UnknownField(String),
}
