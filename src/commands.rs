//! Operations behind the `intake-forms` subcommands
//!
//! The binary only parses arguments, prints and picks exit codes; the work
//! lives here so it can be exercised without a terminal.

use crate::forms::{
    predicates, ConsistencyWarning, FieldError, FormData, FormDefinition, Wizard, WizardOptions,
};
use crate::session::{SessionStep, WizardSession};
use crate::store::FormStore;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Read a JSON form definition with the stock predicates available
pub fn load_definition(path: &Path, options: WizardOptions) -> Result<Arc<FormDefinition>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let definition = FormDefinition::from_json(&content, predicates::builtin(), options)
        .with_context(|| format!("Invalid form definition {}", path.display()))?;
    Ok(Arc::new(definition))
}

/// Read a JSON object of answers keyed by field id
pub fn load_data(path: &Path) -> Result<FormData> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON object of answers", path.display()))
}

/// One-line description of a loaded definition
pub fn summary(definition: &FormDefinition) -> String {
    format!(
        "{} ({}): {} steps, {} fields, {} consistency rules",
        definition.id(),
        definition.schema().title,
        definition.steps().len(),
        definition.field_count(),
        definition.schema().consistency.rules().len()
    )
}

/// An active step as listed by `steps`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLine {
    pub id: String,
    pub title: String,
    pub shown_fields: usize,
}

pub fn active_steps(definition: &FormDefinition, data: &FormData) -> Vec<StepLine> {
    definition
        .active_steps(data)
        .into_iter()
        .map(|index| {
            let step = &definition.steps()[index];
            StepLine {
                id: step.id.clone(),
                title: step.title.clone(),
                shown_fields: step.active_fields(data).count(),
            }
        })
        .collect()
}

/// Result of `validate`, printable as JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Validate answers the way a submission would
pub fn validate(definition: &FormDefinition, data: &FormData) -> Report {
    let result = definition.validate_all(data);
    Report {
        is_valid: result.is_valid,
        errors: result.errors,
        warnings: definition.check_consistency(&definition.collect_active(data)),
    }
}

/// Walk a fresh wizard through `answers` and deliver the result to `store`.
///
/// The answers are the whole submission: a draft left by an earlier blocked
/// run is replaced, never merged. When a step blocks, the answers so far are
/// saved as the new draft.
pub async fn submit<S: FormStore>(
    definition: Arc<FormDefinition>,
    answers: &FormData,
    store: S,
    auto_save_every: usize,
) -> Result<SessionStep> {
    let mut session = WizardSession::new(Wizard::new(definition), store, auto_save_every);
    loop {
        let Some(step) = session.wizard().current_step().cloned() else {
            bail!("wizard stopped in state {}", session.wizard().state());
        };
        for field in &step.fields {
            if let Some(value) = answers.get(&field.id) {
                session.set_value(&field.id, value.clone()).await?;
            }
        }

        match session.next().await? {
            SessionStep::Moved { .. } => continue,
            SessionStep::Blocked(result) => {
                session.save_draft().await;
                return Ok(SessionStep::Blocked(result));
            }
            done => return Ok(done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use serde_json::json;
    use std::path::PathBuf;

    fn client_intake_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("forms/client_intake.json")
    }

    fn intake() -> Arc<FormDefinition> {
        load_definition(&client_intake_path(), WizardOptions::default()).unwrap()
    }

    fn answers() -> FormData {
        [
            ("fullName", json!("Ana Diaz")),
            ("dateOfBirth", json!("1990-01-01")),
            ("email", json!("ana@example.org")),
            ("emailConfirm", json!("ana@example.org")),
            ("maritalStatus", json!("Single")),
            ("entryDate", json!("2015-03-04")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    mod loading_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_summary_of_sample() {
            assert_eq!(
                summary(&intake()),
                "client_intake (Client intake): 5 steps, 17 fields, 4 consistency rules"
            );
        }

        #[test]
        fn test_load_data_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("answers.json");
            fs::write(&path, serde_json::to_string(&answers()).unwrap()).unwrap();
            assert_eq!(load_data(&path).unwrap(), answers());
        }

        #[test]
        fn test_load_data_rejects_non_object() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("answers.json");
            fs::write(&path, "[1, 2]").unwrap();
            let err = load_data(&path).unwrap_err();
            assert!(err.to_string().contains("not a JSON object"), "{err:#}");
        }

        #[test]
        fn test_missing_definition_file() {
            let err = load_definition(Path::new("/nonexistent/form.json"), WizardOptions::default())
                .unwrap_err();
            assert!(err.to_string().contains("Failed to read"), "{err:#}");
        }
    }

    mod report_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_active_steps_for_single_applicant() {
            let ids: Vec<_> = active_steps(&intake(), &answers())
                .into_iter()
                .map(|line| line.id)
                .collect();
            assert_eq!(ids, vec!["personal", "family", "immigration"]);
        }

        #[test]
        fn test_validate_accepts_complete_answers() {
            let report = validate(&intake(), &answers());
            assert!(report.is_valid);
            assert!(report.errors.is_empty());
            assert!(report.warnings.is_empty());
        }

        #[test]
        fn test_validate_reports_errors_and_warnings() {
            let mut data = answers();
            data.insert("phone".to_string(), json!("call me"));
            data.insert("entryDate".to_string(), json!("1980-01-01"));
            let report = validate(&intake(), &data);
            assert!(!report.is_valid);
            let fields: Vec<_> = report.errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["phone"]);
            let rules: Vec<_> = report.warnings.iter().map(|w| w.rule.as_str()).collect();
            assert_eq!(rules, vec!["entry_after_birth"]);
        }

        #[test]
        fn test_report_json_shape() {
            let report = validate(&intake(), &answers());
            let value = serde_json::to_value(&report).unwrap();
            assert_eq!(value, json!({"is_valid": true, "errors": [], "warnings": []}));
        }
    }

    mod submit_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_submit_writes_record_and_clears_draft() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonFileStore::new(dir.path());

            let step = submit(intake(), &answers(), store.clone(), 0).await.unwrap();
            let (receipt, warnings) = match step {
                SessionStep::Submitted { receipt, warnings } => (receipt, warnings),
                other => panic!("expected a submission, got {other:?}"),
            };
            assert!(warnings.is_empty());

            let record = store.load_submission("client_intake", &receipt).await.unwrap();
            assert_eq!(record.data, answers());
            assert_eq!(store.load_draft("client_intake").await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_blocked_submit_saves_draft() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonFileStore::new(dir.path());
            let mut data = answers();
            data.insert("phone".to_string(), json!("call me"));

            let step = submit(intake(), &data, store.clone(), 0).await.unwrap();
            let result = match step {
                SessionStep::Blocked(result) => result,
                other => panic!("expected a blocked step, got {other:?}"),
            };
            let fields: Vec<_> = result.errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["phone"]);

            let draft = store.load_draft("client_intake").await.unwrap().unwrap();
            assert_eq!(draft.get("phone"), Some(&json!("call me")));
        }

        #[tokio::test]
        async fn test_stale_draft_does_not_leak_into_resubmission() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonFileStore::new(dir.path());
            let mut first = answers();
            first.insert("phone".to_string(), json!("call me"));
            let blocked = submit(intake(), &first, store.clone(), 0).await.unwrap();
            assert!(matches!(blocked, SessionStep::Blocked(_)));

            // same answers without the bad phone now pass, as `validate` says
            assert!(validate(&intake(), &answers()).is_valid);
            let step = submit(intake(), &answers(), store.clone(), 0).await.unwrap();
            let receipt = match step {
                SessionStep::Submitted { receipt, .. } => receipt,
                other => panic!("expected a submission, got {other:?}"),
            };
            let record = store.load_submission("client_intake", &receipt).await.unwrap();
            assert!(!record.data.contains_key("phone"));
        }
    }
}
