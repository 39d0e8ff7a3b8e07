use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use intake_spec::compute_visible;
use serde::Serialize;

use crate::cmd::i18n::trf;
use crate::cmd::{Workspace, load_answers_file};

#[derive(Args, Debug, Clone)]
pub struct StepsArgs {
    /// Answers to evaluate visibility against, layered over the defaults
    #[arg(long = "answers", value_name = "answers.json")]
    pub answers: Option<PathBuf>,
    /// Ignore the catalog defaults
    #[arg(long = "no-defaults", default_value_t = false)]
    pub no_defaults: bool,
    #[arg(long = "json", default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct VisibleStepRow<'a> {
    index: usize,
    id: &'a str,
    field: &'a str,
    kind: &'static str,
    title: &'a str,
    conditional: bool,
}

pub fn run(args: &StepsArgs, workspace: &Workspace) -> Result<()> {
    let catalog = workspace.catalog.as_ref();
    let mut answers = if args.no_defaults {
        Default::default()
    } else {
        catalog.default_answers()
    };
    if let Some(path) = &args.answers {
        for (field, value) in load_answers_file(catalog, path)? {
            answers.insert(field, value);
        }
    }

    let visible = compute_visible(catalog, &answers);
    let rows = visible
        .iter()
        .enumerate()
        .map(|(index, step)| VisibleStepRow {
            index: index + 1,
            id: &step.id,
            field: &step.field,
            kind: step.kind.as_str(),
            title: &step.title,
            conditional: step.is_conditional(),
        })
        .collect::<Vec<_>>();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in &rows {
        let marker = if row.conditional { "*" } else { " " };
        println!(
            "{:>3}{marker} {:<22} {:<20} {}",
            row.index, row.id, row.kind, row.title
        );
    }
    println!(
        "{}",
        trf(
            "cli.steps.result.summary",
            &[&rows.len().to_string(), &catalog.len().to_string()],
        )
    );
    Ok(())
}
