use anyhow::Result;
use clap::Args;

use crate::cmd::Workspace;

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Submission id
    pub id: String,
    /// Print plain `field: value` lines instead of JSON
    #[arg(long = "plain", default_value_t = false)]
    pub plain: bool,
}

pub async fn run(args: &ShowArgs, workspace: &Workspace) -> Result<()> {
    let submission = workspace.find_submission(&args.id).await?;
    if !args.plain {
        println!("{}", serde_json::to_string_pretty(&submission)?);
        return Ok(());
    }
    for (field, value) in submission.answers().iter() {
        let shown = match workspace.catalog.step_for_field(field) {
            Some(step) => step.display_value(value),
            None => value.to_string(),
        };
        println!("{field}: {shown}");
    }
    Ok(())
}
