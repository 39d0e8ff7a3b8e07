use async_trait::async_trait;
use intake_spec::{Submission, SubmissionId};
use tokio::sync::RwLock;

use super::{RepositoryError, SubmissionRepository};

/// Process-local repository, used in tests and when nothing durable is configured.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    entries: RwLock<Vec<Submission>>,
    retention: Option<usize>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            retention: Some(retention),
        }
    }
}

#[async_trait]
impl SubmissionRepository for MemoryRepository {
    async fn append(&self, submission: &Submission) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.insert(0, submission.clone());
        if let Some(retention) = self.retention {
            entries.truncate(retention);
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Submission>, RepositoryError> {
        Ok(self.entries.read().await.clone())
    }

    async fn get_by_id(&self, id: SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .find(|submission| submission.id() == id)
            .cloned())
    }
}
