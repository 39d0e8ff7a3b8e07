use std::sync::Arc;

use async_trait::async_trait;
use intake_spec::{InMemoryHistory, Submission, SubmissionId};
use thiserror::Error;

use crate::archive::LocalArchive;
use crate::config::IntakeConfig;
use crate::error::IntakeError;

mod fs;
mod http;
mod memory;

pub use fs::FsRepository;
pub use http::HttpRepository;
pub use memory::MemoryRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode stored submission: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{method} {url} returned status {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },
    #[error("invalid repository url: {0}")]
    Url(#[from] url::ParseError),
}

/// Durable store of submissions.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn append(&self, submission: &Submission) -> Result<(), RepositoryError>;

    /// Most recent first, bounded by the repository's retention.
    async fn list_all(&self) -> Result<Vec<Submission>, RepositoryError>;

    async fn get_by_id(&self, id: SubmissionId) -> Result<Option<Submission>, RepositoryError>;
}

/// Picks the remote store when `storage.remote_url` is set, the data directory otherwise.
pub fn from_config(
    config: &IntakeConfig,
    summary_field: Option<&str>,
) -> Result<Arc<dyn SubmissionRepository>, IntakeError> {
    let retention = config.submission.retention;
    match config.remote_url()? {
        Some(url) => Ok(Arc::new(HttpRepository::new(url, retention)?)),
        None => Ok(Arc::new(FsRepository::new(
            config.data_dir(),
            summary_field.map(str::to_string),
            retention,
        ))),
    }
}

/// Rebuilds the submission history for version numbering.
///
/// The repository is asked first; when it is unreachable the local archive
/// stands in. The result is ordered oldest first.
pub async fn recover_history(
    repository: &dyn SubmissionRepository,
    archive: Option<&LocalArchive>,
) -> InMemoryHistory {
    let mut entries = match repository.list_all().await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(error = %err, "repository unavailable, reading local archive");
            match archive {
                Some(archive) => archive.load_all().await.unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "local archive unreadable");
                    Vec::new()
                }),
                None => Vec::new(),
            }
        }
    };
    entries.sort_by_key(|submission| submission.submitted_at());
    InMemoryHistory::from_entries(entries)
}
