//! JSON file store
//!
//! Drafts live at `<root>/drafts/<form_id>.json`; each submission is written
//! once to `<root>/submissions/<form_id>-<receipt>.json`.

use super::traits::FormStore;
use crate::forms::{ConsistencyWarning, FormData, Submission};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// What a submission file contains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub receipt: Uuid,
    pub form_id: String,
    pub submitted_at: DateTime<Utc>,
    pub data: FormData,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Stores drafts and submissions as pretty-printed JSON files
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn draft_path(&self, form_id: &str) -> Result<PathBuf> {
        Ok(self
            .root
            .join("drafts")
            .join(format!("{}.json", safe_name(form_id)?)))
    }

    fn submission_path(&self, form_id: &str, receipt: &Uuid) -> Result<PathBuf> {
        Ok(self
            .root
            .join("submissions")
            .join(format!("{}-{receipt}.json", safe_name(form_id)?)))
    }

    /// Read back a stored submission by receipt
    pub async fn load_submission(&self, form_id: &str, receipt: &str) -> Result<SubmissionRecord> {
        let receipt = Uuid::parse_str(receipt).context("Invalid receipt")?;
        let path = self.submission_path(form_id, &receipt)?;
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Form ids become file names, so keep them to a safe alphabet
fn safe_name(form_id: &str) -> Result<&str> {
    let ok = !form_id.is_empty()
        && form_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(form_id)
    } else {
        Err(anyhow!("Form id {form_id:?} is not usable as a file name"))
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[async_trait]
impl FormStore for JsonFileStore {
    async fn save_draft(&self, form_id: &str, data: &FormData) -> Result<()> {
        write_json(&self.draft_path(form_id)?, data).await
    }

    async fn load_draft(&self, form_id: &str) -> Result<Option<FormData>> {
        let path = self.draft_path(form_id)?;
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn clear_draft(&self, form_id: &str) -> Result<()> {
        let path = self.draft_path(form_id)?;
        if fs::try_exists(&path).await? {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn submit(&self, submission: &Submission) -> Result<String> {
        let record = SubmissionRecord {
            receipt: Uuid::new_v4(),
            form_id: submission.form_id.clone(),
            submitted_at: Utc::now(),
            data: submission.data.clone(),
            warnings: submission.warnings.clone(),
        };
        let path = self.submission_path(&record.form_id, &record.receipt)?;
        write_json(&path, &record).await?;
        Ok(record.receipt.to_string())
    }
}
