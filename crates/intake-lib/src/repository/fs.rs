use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use intake_spec::{Submission, SubmissionId, SubmissionSummary};
use tokio::fs;
use tokio::sync::Mutex;

use super::{RepositoryError, SubmissionRepository};

const SUBMISSIONS_DIR: &str = "submissions";
const INDEX_FILE: &str = "index.json";

/// Directory-backed repository.
///
/// ```text
/// base_dir/
/// ├── submissions/
/// │   └── <id>.json
/// └── index.json      newest first, at most `retention` entries
/// ```
pub struct FsRepository {
    base_dir: PathBuf,
    summary_field: Option<String>,
    retention: usize,
    index_lock: Mutex<()>,
}

impl FsRepository {
    pub fn new(base_dir: impl Into<PathBuf>, summary_field: Option<String>, retention: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            summary_field,
            retention,
            index_lock: Mutex::new(()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn submissions_dir(&self) -> PathBuf {
        self.base_dir.join(SUBMISSIONS_DIR)
    }

    fn submission_path(&self, id: SubmissionId) -> PathBuf {
        self.submissions_dir().join(format!("{id}.json"))
    }

    fn index_path(&self) -> PathBuf {
        self.base_dir.join(INDEX_FILE)
    }

    /// Summaries as recorded in the index, newest first.
    pub async fn summaries(&self) -> Result<Vec<SubmissionSummary>, RepositoryError> {
        let path = self.index_path();
        match fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(io_error(&path, source)),
        }
    }
}

#[async_trait]
impl SubmissionRepository for FsRepository {
    async fn append(&self, submission: &Submission) -> Result<(), RepositoryError> {
        let dir = self.submissions_dir();
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| io_error(&dir, source))?;

        let path = self.submission_path(submission.id());
        let bytes = serde_json::to_vec_pretty(submission)?;
        write_atomic(&path, &bytes).await?;

        let _guard = self.index_lock.lock().await;
        let mut index = self.summaries().await?;
        index.retain(|entry| entry.id != submission.id());
        index.insert(0, submission.summary(self.summary_field.as_deref()));
        index.truncate(self.retention);
        let bytes = serde_json::to_vec_pretty(&index)?;
        write_atomic(&self.index_path(), &bytes).await?;

        tracing::debug!(id = %submission.id(), path = %path.display(), "stored submission");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Submission>, RepositoryError> {
        let index = self.summaries().await?;
        let mut submissions = Vec::with_capacity(index.len());
        for entry in index {
            match self.get_by_id(entry.id).await? {
                Some(submission) => submissions.push(submission),
                None => tracing::warn!(id = %entry.id, "indexed submission is missing on disk"),
            }
        }
        Ok(submissions)
    }

    async fn get_by_id(&self, id: SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let path = self.submission_path(id);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_error(&path, source)),
        }
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RepositoryError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)
        .await
        .map_err(|source| io_error(&tmp, source))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> RepositoryError {
    RepositoryError::Io {
        path: path.display().to_string(),
        source,
    }
}
