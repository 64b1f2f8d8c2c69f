//! Intake forms - rule engine for adaptive intake wizards
//!
//! Conditional visibility, field validation and cross-field consistency for
//! multi-step client intake forms, plus an async session that auto-saves
//! drafts and delivers submissions through a [`store::FormStore`].

pub mod commands;
pub mod config;
pub mod error;
pub mod forms;
pub mod session;
pub mod store;

pub use error::{DefinitionError, WizardError};
