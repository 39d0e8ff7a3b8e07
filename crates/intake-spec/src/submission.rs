use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::answers::{AnswerSet, AnswerValue, FieldKey};
use crate::spec::catalog::StepCatalog;

const ANONYMOUS_LABEL: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw.trim()).map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SubmissionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A completed, confirmed pass through the wizard. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    id: SubmissionId,
    version: u32,
    #[serde(with = "time::serde::rfc3339")]
    submitted_at: OffsetDateTime,
    catalog_id: String,
    catalog_version: String,
    answers: AnswerSet,
}

impl Submission {
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn submitted_at(&self) -> OffsetDateTime {
        self.submitted_at
    }

    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    pub fn catalog_version(&self) -> &str {
        &self.catalog_version
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    /// Trimmed text of `summary_field`, if it holds anything.
    pub fn summary_value(&self, summary_field: Option<&str>) -> Option<&str> {
        summary_field
            .and_then(|field| self.answers.get(field))
            .and_then(AnswerValue::as_str)
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    /// Human label read from `summary_field`, `Anonymous` when unset or blank.
    pub fn label(&self, summary_field: Option<&str>) -> String {
        self.summary_value(summary_field)
            .unwrap_or(ANONYMOUS_LABEL)
            .to_string()
    }

    pub fn summary(&self, summary_field: Option<&str>) -> SubmissionSummary {
        SubmissionSummary {
            id: self.id,
            version: self.version,
            submitted_at: self.submitted_at,
            label: self.label(summary_field),
        }
    }
}

/// Listing entry for history views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub id: SubmissionId,
    pub version: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
    pub label: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("confirmation field '{field}' must be checked before submitting")]
    ConfirmationRequired { field: FieldKey },
}

/// Submissions recorded so far. The next version follows [`SubmissionHistory::latest_version`].
pub trait SubmissionHistory: Send {
    fn append(&mut self, submission: Submission);
    fn list_all(&self) -> Vec<Submission>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest version handed out so far.
    ///
    /// A history recovered from a retention-bounded store holds fewer entries
    /// than were ever submitted, so this can exceed `len`.
    fn latest_version(&self) -> u32 {
        u32::try_from(self.len()).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    entries: Vec<Submission>,
    latest_version: u32,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the history, e.g. with entries recovered from a local archive.
    pub fn from_entries(entries: Vec<Submission>) -> Self {
        let latest_version = entries.iter().map(Submission::version).max().unwrap_or(0);
        Self {
            entries,
            latest_version,
        }
    }
}

impl SubmissionHistory for InMemoryHistory {
    fn append(&mut self, submission: Submission) {
        self.latest_version = self.latest_version.max(submission.version());
        self.entries.push(submission);
    }

    fn list_all(&self) -> Vec<Submission> {
        self.entries.clone()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn latest_version(&self) -> u32 {
        let counted = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        self.latest_version.max(counted)
    }
}

pub struct SubmissionAssembler<'a> {
    catalog: &'a StepCatalog,
}

impl<'a> SubmissionAssembler<'a> {
    pub fn new(catalog: &'a StepCatalog) -> Self {
        Self { catalog }
    }

    /// Succeeds only when the confirmation field holds `true`.
    pub fn check_confirmation(&self, answers: &AnswerSet) -> Result<(), AssembleError> {
        let field = self.catalog.confirmation_field();
        match answers.get(field) {
            Some(AnswerValue::Flag(true)) => Ok(()),
            _ => Err(AssembleError::ConfirmationRequired {
                field: field.to_string(),
            }),
        }
    }

    pub fn assemble(&self, answers: &AnswerSet, prior_count: usize) -> Result<Submission, AssembleError> {
        self.assemble_at(answers, prior_count, OffsetDateTime::now_utc())
    }

    pub fn assemble_at(
        &self,
        answers: &AnswerSet,
        prior_count: usize,
        now: OffsetDateTime,
    ) -> Result<Submission, AssembleError> {
        self.check_confirmation(answers)?;
        let version = u32::try_from(prior_count)
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        Ok(Submission {
            id: SubmissionId::new(),
            version,
            submitted_at: now,
            catalog_id: self.catalog.id().to_string(),
            catalog_version: self.catalog.version().to_string(),
            answers: answers.clone(),
        })
    }

    pub fn assemble_next(
        &self,
        answers: &AnswerSet,
        history: &dyn SubmissionHistory,
    ) -> Result<Submission, AssembleError> {
        self.assemble(answers, history.latest_version() as usize)
    }
}
