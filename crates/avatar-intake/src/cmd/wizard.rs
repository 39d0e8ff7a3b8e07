use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use intake_lib::{IntakeSession, IntakeSessionBuilder, Persistence, SubmitError, SubmitOutcome};
use intake_spec::{AnswerValue, StepDefinition, ValueShape};
use serde_json::Value as JsonValue;

use crate::cmd::i18n::{tr, trf};
use crate::cmd::{Workspace, load_answers_file};

#[derive(Args, Debug, Clone)]
pub struct WizardArgs {
    /// Submit answers from a JSON object instead of prompting
    #[arg(long = "answers", value_name = "answers.json")]
    pub answers: Option<PathBuf>,
    /// Start from a past submission
    #[arg(long = "load", value_name = "ID", conflicts_with = "resume")]
    pub load: Option<String>,
    /// Continue the saved draft
    #[arg(long = "resume", default_value_t = false)]
    pub resume: bool,
    /// Print the accepted submission as JSON
    #[arg(long = "json", default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Reply {
    Value(JsonValue),
    Keep,
    Back,
    Jump(usize),
    Quit,
}

pub async fn run(args: WizardArgs, workspace: &Workspace) -> Result<()> {
    let mut session = IntakeSessionBuilder::from_config(workspace.catalog.clone(), &workspace.config)
        .await
        .context("failed to prepare wizard session")?
        .build();
    open(&mut session, &args, workspace).await?;

    let outcome = match &args.answers {
        Some(path) => {
            let answers = load_answers_file(&workspace.catalog, path)?;
            session.apply_answers(answers);
            session.submit().await.map_err(submit_error)?
        }
        None => match interact(&mut session).await? {
            Some(outcome) => outcome,
            None => return Ok(()),
        },
    };
    print_outcome(&outcome, &args, workspace)
}

async fn open(session: &mut IntakeSession, args: &WizardArgs, workspace: &Workspace) -> Result<()> {
    if let Some(id) = &args.load {
        let submission = workspace.find_submission(id).await?;
        session.open_from(&submission);
        return Ok(());
    }
    if args.resume {
        let draft = workspace
            .archive()
            .load_draft()
            .await
            .context("failed to read draft")?
            .ok_or_else(|| anyhow!(tr("cli.wizard.result.no_draft")))?;
        session.open_from_draft(&draft);
        return Ok(());
    }
    session.open_fresh();
    Ok(())
}

/// Prompts step by step. `None` when the user quit and the draft was saved.
async fn interact(session: &mut IntakeSession) -> Result<Option<SubmitOutcome>> {
    println!("{}", trf("cli.wizard.result.intro", &[session.catalog().title()]));
    println!("{}", tr("cli.wizard.result.commands_hint"));

    loop {
        let Some(step) = session.current_step().cloned() else {
            bail!("{}", tr("cli.wizard.result.no_steps"));
        };
        let total = session.visible_steps().len();
        let number = session.current_index() + 1;
        let percent = (session.progress() * 100.0).round() as u32;
        println!();
        println!(
            "{}",
            trf(
                "cli.wizard.step.header",
                &[&number.to_string(), &total.to_string(), &percent.to_string()],
            )
        );

        let current = session.answers().get(&step.field).cloned();
        match prompt_step(&step, current.as_ref())? {
            Reply::Back => session.retreat(),
            Reply::Jump(target) => {
                let jumped = target
                    .checked_sub(1)
                    .is_some_and(|index| session.jump_to(index).is_ok());
                if !jumped {
                    println!(
                        "{}",
                        trf(
                            "cli.wizard.result.jump_out_of_range",
                            &[&target.to_string(), &total.to_string()],
                        )
                    );
                }
            }
            Reply::Quit => {
                session.checkpoint().await.context("failed to save draft")?;
                println!("{}", tr("cli.wizard.result.draft_saved"));
                return Ok(None);
            }
            reply @ (Reply::Value(_) | Reply::Keep) => {
                if let Reply::Value(value) = reply
                    && let Err(err) = session.capture(&step.field, &value)
                {
                    println!("{}", trf("cli.wizard.result.validation_error", &[&err.to_string()]));
                    continue;
                }
                if let Err(err) = session.checkpoint().await {
                    tracing::warn!(error = %err, "failed to save draft");
                }
                if !session.is_last_step() {
                    session.advance();
                    continue;
                }
                match session.submit().await {
                    Ok(outcome) => return Ok(Some(outcome)),
                    Err(SubmitError::Validation(_)) => {
                        println!("{}", tr("cli.wizard.result.confirmation_required"));
                    }
                    Err(err) => return Err(submit_error(err)),
                }
            }
        }
    }
}

fn prompt_step(step: &StepDefinition, current: Option<&AnswerValue>) -> Result<Reply> {
    println!("{}", step.title);
    if let Some(description) = &step.description {
        println!("  {description}");
    }
    if !step.examples.is_empty() {
        println!(
            "  {}",
            trf("cli.wizard.step.examples", &[&step.examples.join("; ")])
        );
    }
    for (idx, choice) in step.choices.iter().enumerate() {
        match &choice.description {
            Some(description) => println!("  {}. {} - {description}", idx + 1, choice.label),
            None => println!("  {}. {}", idx + 1, choice.label),
        }
    }

    let prompt = prompt_line(step, current);
    loop {
        let input = read_line(&prompt)?;
        if input.starts_with(':') {
            match parse_command(&input) {
                Some(reply) => return Ok(reply),
                None => {
                    println!("{}", tr("cli.wizard.result.unknown_command"));
                    continue;
                }
            }
        }
        if input.is_empty() {
            if current.is_some() || step.optional {
                return Ok(Reply::Keep);
            }
            println!("{}", tr("cli.wizard.result.value_required"));
            continue;
        }
        match parse_input(step, &input) {
            Ok(value) => return Ok(Reply::Value(value)),
            Err(key) => println!("{}", tr(key)),
        }
    }
}

fn prompt_line(step: &StepDefinition, current: Option<&AnswerValue>) -> String {
    let current_text = current.map(|value| step.display_value(value));
    match step.kind.shape() {
        ValueShape::Flag => {
            let suffix = match current.and_then(AnswerValue::as_bool) {
                Some(true) => "[Y/n]",
                Some(false) => "[y/N]",
                None => "[y/n]",
            };
            format!("{suffix}: ")
        }
        ValueShape::Choice => match current_text {
            Some(text) => format!("{} [{text}] ", tr("cli.wizard.prompt.select")),
            None => format!("{} ", tr("cli.wizard.prompt.select")),
        },
        ValueShape::Files | ValueShape::Links => match current_text {
            Some(text) if !text.is_empty() => format!("{} [{text}] ", tr("cli.wizard.prompt.list")),
            _ => format!("{} ", tr("cli.wizard.prompt.list")),
        },
        ValueShape::Text | ValueShape::Number => match current_text {
            Some(text) if !text.is_empty() => format!("[{text}]: "),
            _ => "> ".to_string(),
        },
    }
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input)?;
    if read == 0 {
        bail!("stdin closed");
    }
    Ok(input.trim().to_string())
}

fn parse_command(input: &str) -> Option<Reply> {
    let mut parts = input.strip_prefix(':')?.split_whitespace();
    match parts.next()? {
        "back" | "b" => Some(Reply::Back),
        "quit" | "q" => Some(Reply::Quit),
        "clear" => Some(Reply::Value(JsonValue::Null)),
        "jump" | "j" => parts.next()?.parse().ok().map(Reply::Jump),
        _ => None,
    }
}

/// Turns a typed line into the plain JSON `capture` expects. Errors are message keys.
fn parse_input(step: &StepDefinition, input: &str) -> Result<JsonValue, &'static str> {
    match step.kind.shape() {
        ValueShape::Choice => {
            if let Ok(number) = input.parse::<usize>()
                && let Some(choice) = number.checked_sub(1).and_then(|idx| step.choices.get(idx))
            {
                return Ok(JsonValue::String(choice.value.clone()));
            }
            step.choices
                .iter()
                .find(|choice| {
                    choice.value.eq_ignore_ascii_case(input)
                        || choice.label.eq_ignore_ascii_case(input)
                })
                .map(|choice| JsonValue::String(choice.value.clone()))
                .ok_or("cli.wizard.result.invalid_choice")
        }
        ValueShape::Flag => match input.to_ascii_lowercase().as_str() {
            "y" | "yes" | "true" => Ok(JsonValue::Bool(true)),
            "n" | "no" | "false" => Ok(JsonValue::Bool(false)),
            _ => Err("cli.wizard.result.answer_yes_no"),
        },
        ValueShape::Files | ValueShape::Links => Ok(JsonValue::Array(
            input
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| JsonValue::String(item.to_string()))
                .collect(),
        )),
        ValueShape::Text | ValueShape::Number => Ok(JsonValue::String(input.to_string())),
    }
}

fn submit_error(err: SubmitError) -> anyhow::Error {
    match err {
        SubmitError::Validation(_) => anyhow!(tr("cli.wizard.result.confirmation_required")),
        SubmitError::RateLimited { remaining } => anyhow!(trf(
            "cli.wizard.result.rate_limited",
            &[&remaining.as_secs().to_string()],
        )),
    }
}

fn print_outcome(outcome: &SubmitOutcome, args: &WizardArgs, workspace: &Workspace) -> Result<()> {
    let submission = &outcome.submission;
    if args.json {
        println!("{}", serde_json::to_string_pretty(submission)?);
    } else {
        println!(
            "{}",
            trf(
                "cli.wizard.result.submitted",
                &[
                    &submission.label(workspace.catalog.summary_field()),
                    &submission.version().to_string(),
                    &submission.id().to_string(),
                ],
            )
        );
    }
    if let Persistence::LocalOnly { reason } = &outcome.persistence {
        eprintln!("{}", trf("cli.wizard.result.stored_locally", &[reason]));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use intake_spec::StepCatalog;
    use serde_json::json;

    use super::*;

    fn step(id: &str) -> StepDefinition {
        let catalog = StepCatalog::avatar_intake().expect("catalog");
        catalog.step(id).expect("step").clone()
    }

    #[test]
    fn commands_are_recognised() {
        assert_eq!(parse_command(":back"), Some(Reply::Back));
        assert_eq!(parse_command(":j 4"), Some(Reply::Jump(4)));
        assert_eq!(parse_command(":clear"), Some(Reply::Value(JsonValue::Null)));
        assert_eq!(parse_command(":jump"), None);
        assert_eq!(parse_command(":dance"), None);
    }

    #[test]
    fn choices_accept_numbers_values_and_labels() {
        let accent = step("accent");
        assert_eq!(parse_input(&accent, "2"), Ok(json!("other")));
        assert_eq!(parse_input(&accent, "OTHER"), Ok(json!("other")));
        assert_eq!(
            parse_input(&accent, "9"),
            Err("cli.wizard.result.invalid_choice")
        );
    }

    #[test]
    fn flags_and_lists_parse() {
        let store_audio = step("store-audio");
        assert_eq!(parse_input(&store_audio, "Yes"), Ok(json!(true)));
        assert!(parse_input(&store_audio, "maybe").is_err());

        let links = step("like-links");
        assert_eq!(
            parse_input(&links, "https://a.example, ,https://b.example"),
            Ok(json!(["https://a.example", "https://b.example"]))
        );
    }
}
