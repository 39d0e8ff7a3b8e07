use std::sync::Arc;

use async_trait::async_trait;
use intake_spec::{Report, ReportLayout, StepCatalog, Submission, render_report};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("submission {id} was recorded against catalog '{found}', expected '{expected}'")]
    CatalogMismatch {
        id: String,
        found: String,
        expected: String,
    },
    #[error("failed to build PDF report: {0}")]
    Pdf(String),
}

/// A rendered submission, ready to attach to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, submission: &Submission) -> Result<RenderedDocument, RenderError>;
}

/// Renders the paginated plain-text report.
pub struct TextReportRenderer {
    catalog: Arc<StepCatalog>,
    layout: ReportLayout,
}

impl TextReportRenderer {
    pub fn new(catalog: Arc<StepCatalog>, layout: ReportLayout) -> Self {
        Self { catalog, layout }
    }

    /// `submission-<label>.txt`, falling back to `submission-config.txt`.
    pub fn filename_for(&self, submission: &Submission) -> String {
        document_filename(&self.catalog, submission, "txt")
    }
}

#[async_trait]
impl DocumentRenderer for TextReportRenderer {
    async fn render(&self, submission: &Submission) -> Result<RenderedDocument, RenderError> {
        ensure_catalog(&self.catalog, submission)?;
        let report = render_report(&self.catalog, submission, &self.layout);
        Ok(RenderedDocument {
            filename: self.filename_for(submission),
            content_type: "text/plain; charset=utf-8".to_string(),
            bytes: report.to_bytes(),
        })
    }
}

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 40.0;
const MAX_FONT_SIZE: f32 = 10.0;
/// Advance of one Courier glyph relative to the font size.
const COURIER_ADVANCE: f32 = 0.6;

/// Lays the report pages out as an A4 PDF, one PDF page per report page.
pub struct PdfReportRenderer {
    catalog: Arc<StepCatalog>,
    layout: ReportLayout,
}

impl PdfReportRenderer {
    pub fn new(catalog: Arc<StepCatalog>, layout: ReportLayout) -> Self {
        Self { catalog, layout }
    }

    /// `submission-<label>.pdf`, falling back to `submission-config.pdf`.
    pub fn filename_for(&self, submission: &Submission) -> String {
        document_filename(&self.catalog, submission, "pdf")
    }

    fn build(&self, report: &Report) -> Result<Vec<u8>, RenderError> {
        let max_lines = report.pages().iter().map(Vec::len).max().unwrap_or(1).max(1);
        let columns = self.layout.line_width.max(1);
        let font_size = ((PAGE_WIDTH - 2.0 * MARGIN) / (columns as f32 * COURIER_ADVANCE))
            .min(MAX_FONT_SIZE);
        let leading = ((PAGE_HEIGHT - 2.0 * MARGIN) / max_lines as f32).min(font_size * 1.3);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(report.page_count());
        for page in report.pages() {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), font_size.into()]),
                Operation::new("TL", vec![leading.into()]),
                Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - font_size).into()]),
            ];
            for line in page {
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(win_ansi(line), StringFormat::Literal)],
                ));
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("ET", vec![]));
            let content = Content { operations }
                .encode()
                .map_err(|err| RenderError::Pdf(err.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.0_f32.into(), 0.0_f32.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );
        let root_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", root_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|err| RenderError::Pdf(err.to_string()))?;
        Ok(bytes)
    }
}

#[async_trait]
impl DocumentRenderer for PdfReportRenderer {
    async fn render(&self, submission: &Submission) -> Result<RenderedDocument, RenderError> {
        ensure_catalog(&self.catalog, submission)?;
        let report = render_report(&self.catalog, submission, &self.layout);
        let bytes = self.build(&report)?;
        tracing::debug!(
            submission = %submission.id(),
            pages = report.page_count(),
            bytes = bytes.len(),
            "rendered PDF report"
        );
        Ok(RenderedDocument {
            filename: self.filename_for(submission),
            content_type: "application/pdf".to_string(),
            bytes,
        })
    }
}

fn ensure_catalog(catalog: &StepCatalog, submission: &Submission) -> Result<(), RenderError> {
    if submission.catalog_id() != catalog.id() {
        return Err(RenderError::CatalogMismatch {
            id: submission.id().to_string(),
            found: submission.catalog_id().to_string(),
            expected: catalog.id().to_string(),
        });
    }
    Ok(())
}

fn document_filename(catalog: &StepCatalog, submission: &Submission, extension: &str) -> String {
    let label = submission
        .summary_value(catalog.summary_field())
        .map(file_safe)
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| "config".to_string());
    format!("submission-{label}.{extension}")
}

/// The standard Courier font only covers Latin-1; anything else prints as `?`.
fn win_ansi(line: &str) -> Vec<u8> {
    line.chars()
        .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
        .collect()
}

fn file_safe(label: &str) -> String {
    label
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}
