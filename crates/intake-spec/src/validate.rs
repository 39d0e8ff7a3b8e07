use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::answers::{AnswerSet, AnswerValue, ValueShape};
use crate::spec::catalog::StepCatalog;
use crate::spec::step::StepDefinition;
use crate::visibility::is_visible;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("expected a {expected} value, found {found}")]
    TypeMismatch { expected: ValueShape, found: String },
    #[error("'{value}' is not one of the available options")]
    UnknownChoice { value: String },
    #[error("{value} is below the minimum of {min}")]
    BelowMinimum { value: i64, min: i64 },
    #[error("{value} is above the maximum of {max}")]
    AboveMaximum { value: i64, max: i64 },
    #[error("{count} items given, at most {max} allowed")]
    TooManyItems { count: usize, max: usize },
    #[error("'{link}' is not a valid link: {reason}")]
    InvalidLink { link: String, reason: String },
    #[error("'{name}' is not an accepted file type ({accept})")]
    UnsupportedFile { name: String, accept: String },
}

impl ValueError {
    pub fn code(&self) -> &'static str {
        match self {
            ValueError::TypeMismatch { .. } => "type_mismatch",
            ValueError::UnknownChoice { .. } => "unknown_choice",
            ValueError::BelowMinimum { .. } => "min",
            ValueError::AboveMaximum { .. } => "max",
            ValueError::TooManyItems { .. } => "max_items",
            ValueError::InvalidLink { .. } => "invalid_link",
            ValueError::UnsupportedFile { .. } => "unsupported_file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub path: String,
    pub message: String,
    pub code: String,
}

impl ValidationError {
    fn for_field(field: &str, error: &ValueError) -> Self {
        Self {
            field: field.to_string(),
            path: format!("/{field}"),
            message: error.to_string(),
            code: error.code().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub unknown_fields: Vec<String>,
}

/// Checks one value against the constraints of its step.
pub fn check_value(step: &StepDefinition, value: &AnswerValue) -> Result<(), ValueError> {
    if !value.fits(step.kind) {
        return Err(ValueError::TypeMismatch {
            expected: step.kind.shape(),
            found: value.shape().to_string(),
        });
    }
    match value {
        AnswerValue::Choice(selected) => {
            if step.choice(selected).is_none() {
                return Err(ValueError::UnknownChoice {
                    value: selected.clone(),
                });
            }
        }
        AnswerValue::Number(number) => {
            if let Some(min) = step.min
                && *number < min
            {
                return Err(ValueError::BelowMinimum {
                    value: *number,
                    min,
                });
            }
            if let Some(max) = step.max
                && *number > max
            {
                return Err(ValueError::AboveMaximum {
                    value: *number,
                    max,
                });
            }
        }
        AnswerValue::Links(links) => {
            check_item_count(links.len(), step.max_items)?;
            for link in links {
                check_link(link)?;
            }
        }
        AnswerValue::Files(files) => {
            check_item_count(files.len(), step.max_items)?;
            if !step.accept.is_empty() {
                for file in files {
                    if !has_accepted_extension(&file.name, &step.accept) {
                        return Err(ValueError::UnsupportedFile {
                            name: file.name.clone(),
                            accept: step.accept.join(", "),
                        });
                    }
                }
            }
        }
        AnswerValue::Text(_) | AnswerValue::Flag(_) => {}
    }
    Ok(())
}

/// Validates a whole answer set. Steps that are hidden for these answers are skipped.
pub fn validate_answers(catalog: &StepCatalog, answers: &AnswerSet) -> ValidationResult {
    let mut errors = Vec::new();
    let mut unknown_fields = Vec::new();

    for (field, value) in answers.iter() {
        let Some(step) = catalog.step_for_field(field) else {
            unknown_fields.push(field.clone());
            continue;
        };
        if !is_visible(step, answers) {
            continue;
        }
        if let Err(error) = check_value(step, value) {
            errors.push(ValidationError::for_field(field, &error));
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        unknown_fields,
    }
}

/// Decodes a plain JSON object into typed answers and validates them.
///
/// `null` entries are treated as unset. Keys unknown to the catalog are kept
/// as text and reported in `unknown_fields`.
pub fn decode_answers(catalog: &StepCatalog, raw: &Value) -> Result<AnswerSet, ValidationResult> {
    let Some(object) = raw.as_object() else {
        return Err(ValidationResult {
            valid: false,
            errors: vec![ValidationError {
                field: String::new(),
                path: "/".into(),
                message: "answers must be a JSON object".into(),
                code: "type_mismatch".into(),
            }],
            unknown_fields: Vec::new(),
        });
    };

    let mut answers = AnswerSet::new();
    let mut errors = Vec::new();
    for (field, value) in object {
        if value.is_null() {
            continue;
        }
        match catalog.step_for_field(field) {
            Some(step) => match AnswerValue::from_json(step.kind, value) {
                Ok(decoded) => {
                    answers.insert(field.clone(), decoded);
                }
                Err(error) => errors.push(ValidationError::for_field(field, &error)),
            },
            None => {
                let text = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                answers.insert(field.clone(), AnswerValue::Text(text));
            }
        }
    }

    let mut result = validate_answers(catalog, &answers);
    if !errors.is_empty() {
        errors.append(&mut result.errors);
        result.errors = errors;
        result.valid = false;
    }
    if result.valid {
        Ok(answers)
    } else {
        Err(result)
    }
}

fn check_item_count(count: usize, max: Option<usize>) -> Result<(), ValueError> {
    match max {
        Some(max) if count > max => Err(ValueError::TooManyItems { count, max }),
        _ => Ok(()),
    }
}

fn check_link(link: &str) -> Result<(), ValueError> {
    let invalid = |reason: String| ValueError::InvalidLink {
        link: link.to_string(),
        reason,
    };
    let parsed = Url::parse(link).map_err(|err| invalid(err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

fn has_accepted_extension(name: &str, accept: &[String]) -> bool {
    let lowered = name.to_ascii_lowercase();
    accept.iter().any(|extension| {
        let extension = extension.to_ascii_lowercase();
        if extension.starts_with('.') {
            lowered.ends_with(&extension)
        } else {
            lowered.ends_with(&format!(".{extension}"))
        }
    })
}
