use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use intake_spec::{AnswerSet, Submission};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::fs;

const ARCHIVE_FILE: &str = "local-submissions.json";
const DRAFT_FILE: &str = "draft.json";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("archive file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// In-progress answers saved between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub answers: AnswerSet,
    /// Visible-step index the user was on, `-1` before the first step.
    pub current_step: isize,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
}

/// Local fallback copy of submissions plus the current draft.
///
/// Every accepted submission is retained here, whether or not the primary
/// repository took it.
#[derive(Debug, Clone)]
pub struct LocalArchive {
    dir: PathBuf,
    retention: usize,
}

impl LocalArchive {
    pub fn new(dir: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            dir: dir.into(),
            retention,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Adds `submission` to the front of the archive, replacing an entry with the same id.
    pub async fn retain(&self, submission: &Submission) -> Result<(), ArchiveError> {
        let mut entries = self.load_all().await?;
        entries.retain(|entry| entry.id() != submission.id());
        entries.insert(0, submission.clone());
        entries.truncate(self.retention);
        self.write_json(ARCHIVE_FILE, &entries).await
    }

    /// Archived submissions, newest first.
    pub async fn load_all(&self) -> Result<Vec<Submission>, ArchiveError> {
        Ok(self.read_json(ARCHIVE_FILE).await?.unwrap_or_default())
    }

    pub async fn save_draft(&self, draft: &DraftSnapshot) -> Result<(), ArchiveError> {
        self.write_json(DRAFT_FILE, draft).await
    }

    pub async fn load_draft(&self) -> Result<Option<DraftSnapshot>, ArchiveError> {
        self.read_json(DRAFT_FILE).await
    }

    pub async fn clear_draft(&self) -> Result<(), ArchiveError> {
        let path = self.dir.join(DRAFT_FILE);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ArchiveError::Io { path, source }),
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, ArchiveError> {
        let path = self.dir.join(name);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ArchiveError::Io { path, source }),
        }
    }

    async fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), ArchiveError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ArchiveError::Io {
                path: self.dir.clone(),
                source,
            })?;
        let path = self.dir.join(name);
        let bytes = serde_json::to_vec_pretty(value)?;
        fs::write(&path, bytes)
            .await
            .map_err(|source| ArchiveError::Io { path, source })
    }
}
