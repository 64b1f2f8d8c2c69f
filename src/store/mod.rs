//! Persistence collaborators for drafts and submissions

mod file_store;
mod traits;

pub use file_store::{JsonFileStore, SubmissionRecord};
pub use traits::FormStore;

#[cfg(test)]
pub use traits::MockFormStore;
