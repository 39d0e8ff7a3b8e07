use std::sync::Arc;

use async_trait::async_trait;
use handlebars::Handlebars;
use intake_spec::Submission;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::document::{DocumentRenderer, RenderError};

const BODY_TEMPLATE_NAME: &str = "submission_body";
const BODY_TEMPLATE: &str = "New Avatar Intake Form Submission
---------------------------------

A new submission has been received.
Product Name: {{product_name}}
Submission ID: {{id}}
Version: {{version}}

Please find the full details in the attached report.
";
const SUBJECT_FALLBACK: &str = "Avatar Config";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to render report: {0}")]
    Render(#[from] RenderError),
    #[error("notification template error: {0}")]
    Template(String),
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notification endpoint {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Tells someone a submission was accepted. Failures never block the submission.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, submission: &Submission) -> Result<(), NotifyError>;
}

/// Logs accepted submissions and does nothing else.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier {
    summary_field: Option<String>,
}

impl LogNotifier {
    pub fn new(summary_field: Option<String>) -> Self {
        Self { summary_field }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, submission: &Submission) -> Result<(), NotifyError> {
        tracing::info!(
            id = %submission.id(),
            version = submission.version(),
            label = %submission.label(self.summary_field.as_deref()),
            "submission accepted"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct MailAttachment {
    filename: String,
    content_type: String,
    content_base64: String,
}

#[derive(Debug, Serialize)]
struct MailPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    subject: String,
    text: String,
    attachments: Vec<MailAttachment>,
}

/// Posts a mail-relay request with the rendered report attached.
pub struct WebhookNotifier {
    client: Client,
    endpoint: Url,
    admin_email: Option<String>,
    sender: Option<String>,
    summary_field: Option<String>,
    renderer: Arc<dyn DocumentRenderer>,
    templates: Handlebars<'static>,
}

impl WebhookNotifier {
    pub fn new(
        endpoint: Url,
        renderer: Arc<dyn DocumentRenderer>,
        summary_field: Option<String>,
    ) -> Result<Self, NotifyError> {
        let mut templates = Handlebars::new();
        templates.register_escape_fn(handlebars::no_escape);
        templates.set_strict_mode(true);
        templates
            .register_template_string(BODY_TEMPLATE_NAME, BODY_TEMPLATE)
            .map_err(|err| NotifyError::Template(err.to_string()))?;
        Ok(Self {
            client: Client::builder().build()?,
            endpoint,
            admin_email: None,
            sender: None,
            summary_field,
            renderer,
            templates,
        })
    }

    pub fn with_admin_email(mut self, email: Option<String>) -> Self {
        self.admin_email = email;
        self
    }

    pub fn with_sender(mut self, sender: Option<String>) -> Self {
        self.sender = sender;
        self
    }

    /// `New Submission: <label> (v<version>)`.
    pub fn subject(&self, submission: &Submission) -> String {
        let label = submission
            .summary_value(self.summary_field.as_deref())
            .unwrap_or(SUBJECT_FALLBACK);
        format!("New Submission: {label} (v{})", submission.version())
    }

    pub fn body(&self, submission: &Submission) -> Result<String, NotifyError> {
        let context = json!({
            "product_name": submission
                .summary_value(self.summary_field.as_deref())
                .unwrap_or("N/A"),
            "id": submission.id().to_string(),
            "version": submission.version(),
        });
        self.templates
            .render(BODY_TEMPLATE_NAME, &context)
            .map_err(|err| NotifyError::Template(err.to_string()))
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, submission: &Submission) -> Result<(), NotifyError> {
        let document = self.renderer.render(submission).await?;
        let payload = MailPayload {
            to: self.admin_email.as_deref(),
            from: self.sender.as_deref(),
            subject: self.subject(submission),
            text: self.body(submission)?,
            attachments: vec![MailAttachment {
                filename: document.filename,
                content_type: document.content_type,
                content_base64: base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    &document.bytes,
                ),
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                url: self.endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        tracing::info!(id = %submission.id(), endpoint = %self.endpoint, "notification sent");
        Ok(())
    }
}
