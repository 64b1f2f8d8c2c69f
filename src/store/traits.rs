//! Trait abstraction for form persistence to enable mocking in tests

use crate::forms::{FormData, Submission};
use anyhow::Result;
use async_trait::async_trait;

/// Where drafts and finished submissions go
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Persist in-progress answers, replacing any earlier draft
    async fn save_draft(&self, form_id: &str, data: &FormData) -> Result<()>;

    /// Load the latest draft, if one was saved
    async fn load_draft(&self, form_id: &str) -> Result<Option<FormData>>;

    /// Remove the draft once it is no longer needed
    async fn clear_draft(&self, form_id: &str) -> Result<()>;

    /// Deliver a completed submission; returns a receipt id
    async fn submit(&self, submission: &Submission) -> Result<String>;
}
