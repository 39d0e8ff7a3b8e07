pub mod history;
pub mod i18n;
pub mod render;
pub mod schema;
pub mod show;
pub mod steps;
pub mod wizard;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use intake_lib::repository;
use intake_lib::{IntakeConfig, LocalArchive, SubmissionRepository};
use intake_spec::{AnswerSet, StepCatalog, Submission, SubmissionId, decode_answers};
use serde_json::Value as JsonValue;

use self::i18n::trf;

/// Config plus the catalog every command works against.
pub struct Workspace {
    pub config: IntakeConfig,
    pub catalog: Arc<StepCatalog>,
}

impl Workspace {
    pub fn new(config: IntakeConfig) -> Result<Self> {
        let catalog = StepCatalog::avatar_intake().context("embedded step catalog is invalid")?;
        Ok(Self {
            config,
            catalog: Arc::new(catalog),
        })
    }

    pub fn repository(&self) -> Result<Arc<dyn SubmissionRepository>> {
        repository::from_config(&self.config, self.catalog.summary_field())
            .context("failed to open submission repository")
    }

    pub fn archive(&self) -> LocalArchive {
        LocalArchive::new(self.config.data_dir(), self.config.submission.retention)
    }

    /// Looks a submission up in the repository, then in the local archive.
    pub async fn find_submission(&self, raw_id: &str) -> Result<Submission> {
        let id = SubmissionId::parse(raw_id.trim())
            .with_context(|| trf("cli.result.invalid_id", &[raw_id]))?;
        match self.repository()?.get_by_id(id).await {
            Ok(Some(found)) => return Ok(found),
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "repository lookup failed, trying local archive"),
        }
        let archived = self
            .archive()
            .load_all()
            .await
            .context("failed to read local archive")?;
        match archived.into_iter().find(|entry| entry.id() == id) {
            Some(found) => Ok(found),
            None => bail!("{}", trf("cli.result.not_found", &[raw_id])),
        }
    }

    /// Repository listing, or the local archive when the repository is unreachable.
    pub async fn list_submissions(&self) -> Result<Vec<Submission>> {
        match self.repository()?.list_all().await {
            Ok(entries) => Ok(entries),
            Err(err) => {
                tracing::warn!(error = %err, "repository unavailable, listing local archive");
                self.archive()
                    .load_all()
                    .await
                    .context("failed to read local archive")
            }
        }
    }
}

/// Reads an answers file and decodes it against the catalog.
pub fn load_answers_file(catalog: &StepCatalog, path: &Path) -> Result<AnswerSet> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read answers {}", path.display()))?;
    let json: JsonValue = serde_json::from_str(&raw)
        .with_context(|| format!("answers {} must be valid JSON", path.display()))?;
    match decode_answers(catalog, &json) {
        Ok(answers) => {
            for field in answers.keys() {
                if catalog.step_for_field(field).is_none() {
                    eprintln!("{}", trf("cli.result.unknown_field", &[field.as_str()]));
                }
            }
            Ok(answers)
        }
        Err(result) => {
            for error in &result.errors {
                eprintln!("  {}: {}", error.path, error.message);
            }
            bail!(
                "{}",
                trf(
                    "cli.result.invalid_answers",
                    &[&path.display().to_string(), &result.errors.len().to_string()],
                )
            )
        }
    }
}
