use anyhow::Result;
use clap::Args;
use intake_spec::SubmissionSummary;
use time::macros::format_description;

use crate::cmd::Workspace;
use crate::cmd::i18n::{tr, trf};

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Show at most this many entries
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,
    #[arg(long = "json", default_value_t = false)]
    pub json: bool,
}

pub async fn run(args: &HistoryArgs, workspace: &Workspace) -> Result<()> {
    let summary_field = workspace.catalog.summary_field();
    let mut summaries = workspace
        .list_submissions()
        .await?
        .iter()
        .map(|submission| submission.summary(summary_field))
        .collect::<Vec<SubmissionSummary>>();
    if let Some(limit) = args.limit {
        summaries.truncate(limit);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    if summaries.is_empty() {
        println!("{}", tr("cli.history.result.empty"));
        return Ok(());
    }

    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    for entry in &summaries {
        let date = entry
            .submitted_at
            .format(&format)
            .unwrap_or_else(|_| entry.submitted_at.to_string());
        println!(
            "v{:<4} {date}  {}  {}",
            entry.version, entry.id, entry.label
        );
    }
    println!(
        "{}",
        trf("cli.history.result.count", &[&summaries.len().to_string()])
    );
    Ok(())
}
