use async_trait::async_trait;
use intake_spec::{Submission, SubmissionId};
use reqwest::{Client, StatusCode};
use url::Url;

use super::{RepositoryError, SubmissionRepository};

/// Remote submission store reached over HTTP.
///
/// `POST {base}/submissions` stores, `GET {base}/submissions` lists newest
/// first and `GET {base}/submissions/{id}` fetches one record.
#[derive(Clone)]
pub struct HttpRepository {
    client: Client,
    base: Url,
    retention: usize,
}

impl HttpRepository {
    pub fn new(base: Url, retention: usize) -> Result<Self, RepositoryError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base, retention))
    }

    pub fn with_client(client: Client, mut base: Url, retention: usize) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            client,
            base,
            retention,
        }
    }

    fn submissions_url(&self) -> Result<Url, RepositoryError> {
        Ok(self.base.join("submissions")?)
    }

    fn submission_url(&self, id: SubmissionId) -> Result<Url, RepositoryError> {
        Ok(self.base.join(&format!("submissions/{id}"))?)
    }
}

#[async_trait]
impl SubmissionRepository for HttpRepository {
    async fn append(&self, submission: &Submission) -> Result<(), RepositoryError> {
        let url = self.submissions_url()?;
        let response = self.client.post(url.clone()).json(submission).send().await?;
        if !response.status().is_success() {
            return Err(RepositoryError::Status {
                method: "POST",
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        tracing::debug!(id = %submission.id(), %url, "stored submission remotely");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Submission>, RepositoryError> {
        let url = self.submissions_url()?;
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(RepositoryError::Status {
                method: "GET",
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let mut submissions: Vec<Submission> = response.json().await?;
        submissions.truncate(self.retention);
        Ok(submissions)
    }

    async fn get_by_id(&self, id: SubmissionId) -> Result<Option<Submission>, RepositoryError> {
        let url = self.submission_url(id)?;
        let response = self.client.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(RepositoryError::Status {
                method: "GET",
                url: url.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}
