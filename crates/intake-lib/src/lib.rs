#![allow(missing_docs)]

pub mod archive;
pub mod config;
pub mod document;
pub mod error;
pub mod notify;
pub mod repository;
pub mod session;

pub use archive::{ArchiveError, DraftSnapshot, LocalArchive};
pub use config::{
    ConfigError, IntakeConfig, NotifyConfig, ReportConfig, StorageConfig, SubmissionConfig,
};
pub use document::{
    DocumentRenderer, PdfReportRenderer, RenderError, RenderedDocument, TextReportRenderer,
};
pub use error::IntakeError;
pub use notify::{LogNotifier, NotifyError, Notifier, WebhookNotifier};
pub use repository::{
    FsRepository, HttpRepository, MemoryRepository, RepositoryError, SubmissionRepository,
    recover_history,
};
pub use session::{
    CaptureError, Clock, IntakeSession, IntakeSessionBuilder, Persistence, Phase, SubmitError,
    SubmitOutcome, SystemClock,
};
