use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use intake_lib::IntakeConfig;
use tracing_subscriber::EnvFilter;

use crate::cmd::{
    self, history::HistoryArgs, render::RenderArgs, schema::SchemaArgs, show::ShowArgs,
    steps::StepsArgs, wizard::WizardArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "avatar-intake",
    about = "Collect avatar and voice persona requirements",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Config file (defaults to $INTAKE_CONFIG or the per-user config dir)
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Directory for local submissions, the fallback archive and drafts
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG wins when set
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the intake wizard and submit the answers
    Wizard(WizardArgs),
    /// List the steps visible for a set of answers
    Steps(StepsArgs),
    /// List past submissions, newest first
    History(HistoryArgs),
    /// Print one submission as JSON
    Show(ShowArgs),
    /// Render the report for a submission as text or PDF
    Render(RenderArgs),
    /// Print the JSON schema of the step catalog format
    Schema(SchemaArgs),
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Schema(args) = &cli.command {
        return cmd::schema::run(args);
    }

    let mut config = IntakeConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }
    let workspace = cmd::Workspace::new(config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(async move {
        match cli.command {
            Commands::Wizard(args) => cmd::wizard::run(args, &workspace).await,
            Commands::Steps(args) => cmd::steps::run(&args, &workspace),
            Commands::History(args) => cmd::history::run(&args, &workspace).await,
            Commands::Show(args) => cmd::show::run(&args, &workspace).await,
            Commands::Render(args) => cmd::render::run(&args, &workspace).await,
            Commands::Schema(args) => cmd::schema::run(&args),
        }
    })
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
