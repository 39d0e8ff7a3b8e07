use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use intake_lib::{DocumentRenderer, PdfReportRenderer, TextReportRenderer};

use crate::cmd::Workspace;
use crate::cmd::i18n::trf;

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Submission id
    pub id: String,
    /// Write the report here instead of stdout
    #[arg(long = "out", value_name = "PATH")]
    pub out: Option<PathBuf>,
    /// Render the PDF attached to notifications instead of plain text
    #[arg(long = "pdf", default_value_t = false, requires = "out")]
    pub pdf: bool,
}

pub async fn run(args: &RenderArgs, workspace: &Workspace) -> Result<()> {
    let submission = workspace.find_submission(&args.id).await?;
    let catalog = workspace.catalog.clone();
    let layout = workspace.config.report_layout();
    let renderer: Box<dyn DocumentRenderer> = if args.pdf {
        Box::new(PdfReportRenderer::new(catalog, layout))
    } else {
        Box::new(TextReportRenderer::new(catalog, layout))
    };
    let document = renderer
        .render(&submission)
        .await
        .context("failed to render report")?;

    match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, &document.bytes)
                .with_context(|| format!("failed to write report {}", path.display()))?;
            println!(
                "{}",
                trf(
                    "cli.render.result.written",
                    &[&path.display().to_string(), &document.filename],
                )
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&document.bytes)?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
