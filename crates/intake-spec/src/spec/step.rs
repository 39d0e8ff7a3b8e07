use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerSet, AnswerValue, FieldKey, ValueShape};

/// Identifier for wizard steps, stable across sessions.
pub type StepId = String;

/// Input widgets a step can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    SingleChoice,
    /// Dropdown over a list of options; stores the one selected value.
    MultiChoiceSelect,
    FreeText,
    LongText,
    Numeric,
    BooleanToggle,
    BooleanConfirm,
    FileSet,
    LinkSet,
}

impl InputKind {
    pub fn shape(self) -> ValueShape {
        match self {
            InputKind::SingleChoice | InputKind::MultiChoiceSelect => ValueShape::Choice,
            InputKind::FreeText | InputKind::LongText => ValueShape::Text,
            InputKind::Numeric => ValueShape::Number,
            InputKind::BooleanToggle | InputKind::BooleanConfirm => ValueShape::Flag,
            InputKind::FileSet => ValueShape::Files,
            InputKind::LinkSet => ValueShape::Links,
        }
    }

    pub fn is_choice(self) -> bool {
        self.shape() == ValueShape::Choice
    }

    /// Collections cannot be targets of visibility rules.
    pub fn is_collection(self) -> bool {
        matches!(self.shape(), ValueShape::Files | ValueShape::Links)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::SingleChoice => "single_choice",
            InputKind::MultiChoiceSelect => "multi_choice_select",
            InputKind::FreeText => "free_text",
            InputKind::LongText => "long_text",
            InputKind::Numeric => "numeric",
            InputKind::BooleanToggle => "boolean_toggle",
            InputKind::BooleanConfirm => "boolean_confirm",
            InputKind::FileSet => "file_set",
            InputKind::LinkSet => "link_set",
        }
    }
}

/// One selectable option of a choice step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Choice {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Predicate applied to the answer of an earlier field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Condition {
    Equals(AnswerValue),
    OneOf(Vec<AnswerValue>),
}

/// Makes a step visible only while another field holds a matching answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibilityRule {
    pub field: FieldKey,
    pub condition: Condition,
}

impl VisibilityRule {
    pub fn equals(field: impl Into<FieldKey>, value: AnswerValue) -> Self {
        Self {
            field: field.into(),
            condition: Condition::Equals(value),
        }
    }

    pub fn one_of(field: impl Into<FieldKey>, values: Vec<AnswerValue>) -> Self {
        Self {
            field: field.into(),
            condition: Condition::OneOf(values),
        }
    }

    pub fn depends_on(&self) -> &str {
        &self.field
    }

    /// Evaluates against the raw answer data. An absent answer never matches.
    pub fn matches(&self, answers: &AnswerSet) -> bool {
        let Some(current) = answers.get(&self.field) else {
            return false;
        };
        match &self.condition {
            Condition::Equals(required) => current == required,
            Condition::OneOf(allowed) => allowed.contains(current),
        }
    }
}

/// A validated step of the catalog. Only [`crate::StepCatalog`] builds these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepDefinition {
    pub id: StepId,
    pub field: FieldKey,
    pub kind: InputKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<VisibilityRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<AnswerValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<String>,
}

impl StepDefinition {
    pub fn is_conditional(&self) -> bool {
        self.visible_if.is_some()
    }

    pub fn choice(&self, value: &str) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.value == value)
    }

    /// Human label for a stored value: the choice label for choice steps, the value otherwise.
    pub fn display_value(&self, value: &AnswerValue) -> String {
        match value {
            AnswerValue::Choice(selected) => self
                .choice(selected)
                .map(|choice| choice.label.clone())
                .unwrap_or_else(|| selected.clone()),
            other => other.to_string(),
        }
    }
}
