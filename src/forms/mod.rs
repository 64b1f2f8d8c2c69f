//! Form domain layer
//!
//! Field definitions, validation rules, conditional visibility, cross-field
//! consistency, and the wizard controller that ties them together. Nothing
//! in here performs I/O.

mod condition;
mod consistency;
mod definition;
mod field;
pub mod predicates;
mod rules;
mod step;
mod value;
mod wizard;

pub use condition::{ConditionalRule, Operator};
pub use consistency::{ConsistencyCheck, ConsistencyChecker, ConsistencyRule, ConsistencyWarning};
pub use definition::{FormDefinition, FormSchema, WizardOptions};
pub use field::{FieldType, FormField};
pub use rules::{
    DateBound, ErrorKind, FieldError, Predicate, PredicateRegistry, ValidationResult,
    ValidationRule, Validator,
};
pub use step::FormStep;
pub use value::{FormData, DATE_FORMAT};
pub use wizard::{Advance, Submission, SubmitOutcome, Wizard, WizardState};
