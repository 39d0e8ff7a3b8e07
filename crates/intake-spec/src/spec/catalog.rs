use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use thiserror::Error;

use crate::answers::{AnswerSet, AnswerValue, FieldKey};
use crate::spec::definition::{CatalogSpec, RuleOp, RuleSpec, StepSpec};
use crate::spec::step::{InputKind, StepDefinition, VisibilityRule};
use crate::validate::{ValueError, check_value};

const AVATAR_INTAKE_JSON: &str = include_str!("../../catalogs/avatar_intake.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate step id '{0}'")]
    DuplicateStepId(String),
    #[error("field '{field}' is written by both '{first}' and '{second}'")]
    DuplicateField {
        field: String,
        first: String,
        second: String,
    },
    #[error("step '{step}' depends on unknown field '{field}'")]
    UnknownDependency { step: String, field: String },
    #[error("step '{step}' depends on field '{field}' which is not answered before it")]
    ForwardDependency { step: String, field: String },
    #[error("step '{step}' cannot depend on collection field '{field}'")]
    UnsupportedDependency { step: String, field: String },
    #[error("rule on step '{step}' does not fit field '{field}': {source}")]
    IncompatibleRuleValue {
        step: String,
        field: String,
        #[source]
        source: ValueError,
    },
    #[error("rule on step '{step}' references unknown option '{value}' of field '{field}'")]
    UnknownRuleChoice {
        step: String,
        field: String,
        value: String,
    },
    #[error("rule on step '{step}' is malformed: {reason}")]
    MalformedRule { step: String, reason: String },
    #[error("choice step '{0}' declares no options")]
    MissingChoices(String),
    #[error("step '{0}' declares options but is not a choice step")]
    UnexpectedChoices(String),
    #[error("default of step '{step}' is invalid: {source}")]
    InvalidDefault {
        step: String,
        #[source]
        source: ValueError,
    },
    #[error("step '{step}' has min {min} greater than max {max}")]
    InvalidRange { step: String, min: i64, max: i64 },
    #[error("confirmation field '{0}' is not written by any step")]
    UnknownConfirmationField(String),
    #[error("confirmation field '{field}' must be a boolean_confirm step, found {kind}")]
    ConfirmationKindMismatch { field: String, kind: &'static str },
    #[error("summary field '{0}' is not written by any step")]
    UnknownSummaryField(String),
}

/// Ordered, validated list of wizard steps.
///
/// Construction checks that every visibility rule points at a field written by
/// an earlier step, so the visible list can be computed in a single pass.
#[derive(Debug, Clone)]
pub struct StepCatalog {
    id: String,
    title: String,
    version: String,
    steps: Vec<StepDefinition>,
    by_id: BTreeMap<String, usize>,
    by_field: BTreeMap<FieldKey, usize>,
    confirmation_field: FieldKey,
    summary_field: Option<FieldKey>,
}

impl StepCatalog {
    /// The built-in avatar configuration catalog.
    pub fn avatar_intake() -> Result<Self, CatalogError> {
        Self::from_json_str(AVATAR_INTAKE_JSON)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let spec: CatalogSpec = serde_json::from_str(raw)?;
        Self::from_definition(spec)
    }

    pub fn from_definition(spec: CatalogSpec) -> Result<Self, CatalogError> {
        let mut by_id = BTreeMap::new();
        let mut by_field: BTreeMap<FieldKey, usize> = BTreeMap::new();
        for (idx, step) in spec.steps.iter().enumerate() {
            if by_id.insert(step.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateStepId(step.id.clone()));
            }
            if let Some(previous) = by_field.insert(step.field.clone(), idx) {
                return Err(CatalogError::DuplicateField {
                    field: step.field.clone(),
                    first: spec.steps[previous].id.clone(),
                    second: step.id.clone(),
                });
            }
        }

        let mut steps: Vec<StepDefinition> = Vec::with_capacity(spec.steps.len());
        for step in &spec.steps {
            let visible_if = match &step.visible_if {
                Some(rule) => Some(resolve_rule(step, rule, &steps, &by_field)?),
                None => None,
            };
            let mut definition = base_definition(step, visible_if)?;
            if let Some(raw) = &step.default {
                let value = AnswerValue::from_json(step.kind, raw).and_then(|value| {
                    check_value(&definition, &value)?;
                    Ok(value)
                });
                definition.default = Some(value.map_err(|source| CatalogError::InvalidDefault {
                    step: step.id.clone(),
                    source,
                })?);
            }
            steps.push(definition);
        }

        let confirmation = by_field
            .get(&spec.confirmation_field)
            .map(|idx| &steps[*idx])
            .ok_or_else(|| CatalogError::UnknownConfirmationField(spec.confirmation_field.clone()))?;
        if confirmation.kind != InputKind::BooleanConfirm {
            return Err(CatalogError::ConfirmationKindMismatch {
                field: spec.confirmation_field.clone(),
                kind: confirmation.kind.as_str(),
            });
        }
        if let Some(summary) = &spec.summary_field
            && !by_field.contains_key(summary)
        {
            return Err(CatalogError::UnknownSummaryField(summary.clone()));
        }

        Ok(Self {
            id: spec.id,
            title: spec.title,
            version: spec.version,
            steps,
            by_id,
            by_field,
            confirmation_field: spec.confirmation_field,
            summary_field: spec.summary_field,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Every step in authoring order, regardless of visibility.
    pub fn list_all(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, id: &str) -> Option<&StepDefinition> {
        self.by_id.get(id).map(|idx| &self.steps[*idx])
    }

    pub fn step_for_field(&self, field: &str) -> Option<&StepDefinition> {
        self.by_field.get(field).map(|idx| &self.steps[*idx])
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn confirmation_field(&self) -> &str {
        &self.confirmation_field
    }

    pub fn summary_field(&self) -> Option<&str> {
        self.summary_field.as_deref()
    }

    /// Answers a fresh session starts with: every declared default.
    pub fn default_answers(&self) -> AnswerSet {
        self.steps
            .iter()
            .filter_map(|step| {
                step.default
                    .clone()
                    .map(|value| (step.field.clone(), value))
            })
            .collect()
    }

    /// Category names in order of first appearance.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.steps
            .iter()
            .filter_map(|step| step.category.as_deref())
            .filter(|category| seen.insert(*category))
            .collect()
    }
}

fn base_definition(
    step: &StepSpec,
    visible_if: Option<VisibilityRule>,
) -> Result<StepDefinition, CatalogError> {
    if step.kind.is_choice() && step.choices.is_empty() {
        return Err(CatalogError::MissingChoices(step.id.clone()));
    }
    if !step.kind.is_choice() && !step.choices.is_empty() {
        return Err(CatalogError::UnexpectedChoices(step.id.clone()));
    }
    if let (Some(min), Some(max)) = (step.min, step.max)
        && min > max
    {
        return Err(CatalogError::InvalidRange {
            step: step.id.clone(),
            min,
            max,
        });
    }
    Ok(StepDefinition {
        id: step.id.clone(),
        field: step.field.clone(),
        kind: step.kind,
        title: step.title.clone(),
        description: step.description.clone(),
        examples: step.examples.clone(),
        choices: step.choices.clone(),
        optional: step.optional,
        category: step.category.clone(),
        visible_if,
        default: None,
        min: step.min,
        max: step.max,
        max_items: step.max_items,
        accept: step.accept.clone(),
    })
}

fn resolve_rule(
    step: &StepSpec,
    rule: &RuleSpec,
    earlier: &[StepDefinition],
    all_fields: &BTreeMap<FieldKey, usize>,
) -> Result<VisibilityRule, CatalogError> {
    let Some(target) = earlier.iter().find(|candidate| candidate.field == rule.field) else {
        return Err(if all_fields.contains_key(&rule.field) {
            CatalogError::ForwardDependency {
                step: step.id.clone(),
                field: rule.field.clone(),
            }
        } else {
            CatalogError::UnknownDependency {
                step: step.id.clone(),
                field: rule.field.clone(),
            }
        });
    };
    if target.kind.is_collection() {
        return Err(CatalogError::UnsupportedDependency {
            step: step.id.clone(),
            field: rule.field.clone(),
        });
    }

    let raw_values: Vec<&Value> = match rule.op {
        RuleOp::Eq => {
            let value = rule.value.as_ref().ok_or_else(|| CatalogError::MalformedRule {
                step: step.id.clone(),
                reason: "`eq` requires `value`".into(),
            })?;
            vec![value]
        }
        RuleOp::OneOf => {
            if rule.values.is_empty() {
                return Err(CatalogError::MalformedRule {
                    step: step.id.clone(),
                    reason: "`one_of` requires a non-empty `values` list".into(),
                });
            }
            rule.values.iter().collect()
        }
    };

    let mut resolved = Vec::with_capacity(raw_values.len());
    for raw in raw_values {
        let value = AnswerValue::from_json(target.kind, raw).map_err(|source| {
            CatalogError::IncompatibleRuleValue {
                step: step.id.clone(),
                field: rule.field.clone(),
                source,
            }
        })?;
        if let AnswerValue::Choice(selected) = &value
            && target.choice(selected).is_none()
        {
            return Err(CatalogError::UnknownRuleChoice {
                step: step.id.clone(),
                field: rule.field.clone(),
                value: selected.clone(),
            });
        }
        resolved.push(value);
    }

    Ok(match rule.op {
        RuleOp::Eq => VisibilityRule::equals(rule.field.clone(), resolved.remove(0)),
        RuleOp::OneOf => VisibilityRule::one_of(rule.field.clone(), resolved),
    })
}
