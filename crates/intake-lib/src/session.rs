use std::sync::Arc;
use std::time::Duration;

use intake_spec::{
    AnswerSet, AnswerStore, AnswerValue, AssembleError, CooldownGuard, GuardDecision,
    InMemoryHistory, NavigationError, Navigator, StepCatalog, StepDefinition, Submission,
    SubmissionAssembler, SubmissionHistory, ValueError, VisibleSteps, check_value, compute_visible,
};
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

use crate::archive::{ArchiveError, DraftSnapshot, LocalArchive};
use crate::config::IntakeConfig;
use crate::document::PdfReportRenderer;
use crate::error::IntakeError;
use crate::notify::{LogNotifier, Notifier, WebhookNotifier};
use crate::repository::{self, MemoryRepository, SubmissionRepository, recover_history};

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in progress; the wizard has not been opened or was exited.
    Landing,
    Editing,
    /// The last pass was submitted. Answers stay loaded until the next open or exit.
    Completed,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no step writes field '{0}'")]
    UnknownField(String),
    #[error("invalid answer for '{field}': {source}")]
    Invalid {
        field: String,
        #[source]
        source: ValueError,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] AssembleError),
    #[error("please wait {} more second(s) before submitting again", remaining.as_secs())]
    RateLimited { remaining: Duration },
}

/// Where an accepted submission ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    Stored,
    /// The repository refused; only the local archive and history hold the record.
    LocalOnly { reason: String },
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub submission: Submission,
    pub persistence: Persistence,
}

pub struct IntakeSessionBuilder {
    catalog: Arc<StepCatalog>,
    repository: Option<Arc<dyn SubmissionRepository>>,
    notifier: Option<Arc<dyn Notifier>>,
    archive: Option<LocalArchive>,
    history: Option<Box<dyn SubmissionHistory>>,
    cooldown: Duration,
    clock: Arc<dyn Clock>,
}

impl IntakeSessionBuilder {
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        Self {
            catalog,
            repository: None,
            notifier: None,
            archive: None,
            history: None,
            cooldown: intake_spec::DEFAULT_COOLDOWN,
            clock: Arc::new(SystemClock),
        }
    }

    /// Wires the collaborators named by `config` and recovers the submission history.
    pub async fn from_config(
        catalog: Arc<StepCatalog>,
        config: &IntakeConfig,
    ) -> Result<Self, IntakeError> {
        let summary_field = catalog.summary_field().map(str::to_string);
        let repository = repository::from_config(config, summary_field.as_deref())?;
        let notifier: Arc<dyn Notifier> = match config.webhook_url()? {
            Some(endpoint) => {
                let renderer = Arc::new(PdfReportRenderer::new(
                    catalog.clone(),
                    config.report_layout(),
                ));
                Arc::new(
                    WebhookNotifier::new(endpoint, renderer, summary_field.clone())?
                        .with_admin_email(config.notify.admin_email.clone())
                        .with_sender(config.notify.sender.clone()),
                )
            }
            None => Arc::new(LogNotifier::new(summary_field)),
        };
        let archive = LocalArchive::new(config.data_dir(), config.submission.retention);
        let history = recover_history(repository.as_ref(), Some(&archive)).await;

        Ok(Self::new(catalog)
            .repository(repository)
            .notifier(notifier)
            .archive(archive)
            .history(Box::new(history))
            .cooldown(config.cooldown()))
    }

    pub fn repository(mut self, repository: Arc<dyn SubmissionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn archive(mut self, archive: LocalArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn history(mut self, history: Box<dyn SubmissionHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> IntakeSession {
        let summary_field = self.catalog.summary_field().map(str::to_string);
        IntakeSession {
            repository: self
                .repository
                .unwrap_or_else(|| Arc::new(MemoryRepository::new())),
            notifier: self
                .notifier
                .unwrap_or_else(|| Arc::new(LogNotifier::new(summary_field))),
            history: self
                .history
                .unwrap_or_else(|| Box::new(InMemoryHistory::new())),
            archive: self.archive,
            guard: CooldownGuard::new(self.cooldown),
            clock: self.clock,
            catalog: self.catalog,
            store: AnswerStore::new(),
            navigator: Navigator::new(),
            phase: Phase::Landing,
            last_accepted: None,
        }
    }
}

/// One wizard instance: answers, position and the collaborators a submit needs.
pub struct IntakeSession {
    catalog: Arc<StepCatalog>,
    store: AnswerStore,
    navigator: Navigator,
    phase: Phase,
    history: Box<dyn SubmissionHistory>,
    repository: Arc<dyn SubmissionRepository>,
    notifier: Arc<dyn Notifier>,
    archive: Option<LocalArchive>,
    guard: CooldownGuard,
    clock: Arc<dyn Clock>,
    last_accepted: Option<OffsetDateTime>,
}

impl IntakeSession {
    pub fn builder(catalog: Arc<StepCatalog>) -> IntakeSessionBuilder {
        IntakeSessionBuilder::new(catalog)
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn answers(&self) -> &AnswerSet {
        self.store.answers()
    }

    pub fn history(&self) -> &dyn SubmissionHistory {
        self.history.as_ref()
    }

    pub fn last_accepted(&self) -> Option<OffsetDateTime> {
        self.last_accepted
    }

    /// Starts a new pass seeded with the catalog defaults.
    pub fn open_fresh(&mut self) {
        self.open_with(self.catalog.default_answers());
    }

    /// Loads a past submission for editing, positioned on the first step.
    pub fn open_from(&mut self, submission: &Submission) {
        tracing::debug!(id = %submission.id(), version = submission.version(), "loading submission");
        self.open_with(submission.answers().clone());
    }

    /// Restores a saved draft, returning to the step it was saved on when still valid.
    pub fn open_from_draft(&mut self, draft: &DraftSnapshot) {
        self.open_with(draft.answers.clone());
        if let Ok(index) = usize::try_from(draft.current_step) {
            let visible = compute_visible(&self.catalog, self.store.answers());
            let clamped = index.min(visible.len().saturating_sub(1));
            // An empty list leaves the navigator unstarted; nothing to jump to.
            let _ = self.navigator.jump_to(clamped, &visible);
        }
    }

    fn open_with(&mut self, answers: AnswerSet) {
        self.store.replace_all(answers);
        self.phase = Phase::Editing;
        let visible = compute_visible(&self.catalog, self.store.answers());
        self.navigator.start(&visible);
    }

    /// Abandons the wizard: answers are dropped and the position resets.
    pub fn exit(&mut self) {
        self.store.clear();
        self.navigator.reset();
        self.phase = Phase::Landing;
    }

    pub fn visible_steps(&self) -> VisibleSteps<'_> {
        compute_visible(&self.catalog, self.store.answers())
    }

    pub fn current_step(&self) -> Option<&StepDefinition> {
        let visible = self.visible_steps();
        self.navigator.current_step(&visible)
    }

    /// `-1` before the first step.
    pub fn current_index(&self) -> isize {
        self.navigator.index()
    }

    pub fn is_last_step(&self) -> bool {
        self.navigator.is_last_step(self.visible_steps().len())
    }

    pub fn progress(&self) -> f64 {
        self.navigator.progress(self.visible_steps().len())
    }

    pub fn advance(&mut self) {
        let visible = compute_visible(&self.catalog, self.store.answers());
        self.navigator.advance(&visible);
    }

    pub fn retreat(&mut self) {
        let visible = compute_visible(&self.catalog, self.store.answers());
        self.navigator.retreat(&visible);
    }

    pub fn jump_to(&mut self, index: usize) -> Result<(), NavigationError> {
        let visible = compute_visible(&self.catalog, self.store.answers());
        self.navigator.jump_to(index, &visible)
    }

    /// Decodes plain JSON for `field`, checks it against its step and stores it.
    /// `null` unsets the field.
    pub fn capture(&mut self, field: &str, raw: &Value) -> Result<(), CaptureError> {
        if raw.is_null() {
            self.clear_answer(field);
            return Ok(());
        }
        let step = self
            .catalog
            .step_for_field(field)
            .ok_or_else(|| CaptureError::UnknownField(field.to_string()))?;
        let value = AnswerValue::from_json(step.kind, raw).map_err(|source| {
            CaptureError::Invalid {
                field: field.to_string(),
                source,
            }
        })?;
        self.set_answer(field, value).map(|_| ())
    }

    /// Checks and stores a typed answer, then reconciles the position.
    pub fn set_answer(
        &mut self,
        field: &str,
        value: AnswerValue,
    ) -> Result<Option<AnswerValue>, CaptureError> {
        let step = self
            .catalog
            .step_for_field(field)
            .ok_or_else(|| CaptureError::UnknownField(field.to_string()))?;
        check_value(step, &value).map_err(|source| CaptureError::Invalid {
            field: field.to_string(),
            source,
        })?;
        let previous = self.store.set(field, value);
        self.refresh_position();
        Ok(previous)
    }

    /// Merges an already decoded answer set, e.g. from `decode_answers`.
    /// Keys unknown to the catalog are kept as they are.
    pub fn apply_answers(&mut self, answers: AnswerSet) {
        self.store.apply_patch(answers);
        self.refresh_position();
    }

    pub fn clear_answer(&mut self, field: &str) -> Option<AnswerValue> {
        let previous = self.store.remove(field);
        self.refresh_position();
        previous
    }

    fn refresh_position(&mut self) {
        let visible = compute_visible(&self.catalog, self.store.answers());
        let before = self.navigator.index();
        self.navigator.reanchor(&visible);
        if before != self.navigator.index() {
            tracing::debug!(
                from = before,
                to = self.navigator.index(),
                anchor = ?self.navigator.anchor(),
                "visible steps changed, position reconciled"
            );
        }
    }

    pub fn draft(&self) -> DraftSnapshot {
        DraftSnapshot {
            answers: self.store.snapshot(),
            current_step: self.navigator.index(),
            saved_at: self.clock.now(),
        }
    }

    /// Saves the in-progress answers to the local archive, if one is configured.
    pub async fn checkpoint(&self) -> Result<(), ArchiveError> {
        match &self.archive {
            Some(archive) => archive.save_draft(&self.draft()).await,
            None => Ok(()),
        }
    }

    /// Confirms, rate-limits, assembles and persists the current answers.
    ///
    /// Validation and cooldown refusals leave the session untouched. A
    /// repository failure still completes the wizard; the record is kept in
    /// the local archive and history and reported as [`Persistence::LocalOnly`].
    pub async fn submit(&mut self) -> Result<SubmitOutcome, SubmitError> {
        let answers = self.store.snapshot();
        let assembler = SubmissionAssembler::new(&self.catalog);
        assembler.check_confirmation(&answers)?;

        let now = self.clock.now();
        let decision = self.guard.check(now, self.last_accepted);
        if let GuardDecision::Blocked { remaining_millis } = decision {
            return Err(SubmitError::RateLimited {
                remaining: Duration::from_millis(remaining_millis),
            });
        }

        let prior = self.history.latest_version() as usize;
        let submission = assembler.assemble_at(&answers, prior, now)?;

        let persistence = match self.repository.append(&submission).await {
            Ok(()) => {
                if let Err(err) = self.notifier.notify(&submission).await {
                    tracing::warn!(id = %submission.id(), error = %err, "notification failed");
                }
                Persistence::Stored
            }
            Err(err) => {
                tracing::warn!(
                    id = %submission.id(),
                    error = %err,
                    "repository unavailable, submission kept locally"
                );
                Persistence::LocalOnly {
                    reason: err.to_string(),
                }
            }
        };

        self.history.append(submission.clone());
        if let Some(archive) = &self.archive {
            if let Err(err) = archive.retain(&submission).await {
                tracing::warn!(id = %submission.id(), error = %err, "local archive write failed");
            }
            if persistence == Persistence::Stored
                && let Err(err) = archive.clear_draft().await
            {
                tracing::warn!(error = %err, "failed to clear draft");
            }
        }
        if persistence == Persistence::Stored {
            self.last_accepted = Some(now);
        }

        tracing::info!(
            id = %submission.id(),
            version = submission.version(),
            stored = persistence == Persistence::Stored,
            "submission accepted"
        );
        self.navigator.reset();
        self.phase = Phase::Completed;
        Ok(SubmitOutcome {
            submission,
            persistence,
        })
    }
}
