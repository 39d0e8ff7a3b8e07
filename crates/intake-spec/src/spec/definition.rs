use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::spec::step::{Choice, InputKind};

/// Operators available to `visible_if` rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleOp {
    #[default]
    Eq,
    OneOf,
}

/// `visible_if` as written in a catalog file. `op` defaults to equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleSpec {
    pub field: String,
    #[serde(default)]
    pub op: RuleOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

/// Definition of a single step inside a catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepSpec {
    pub id: String,
    pub field: String,
    pub kind: InputKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<RuleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<String>,
}

impl StepSpec {
    /// Minimal always-visible step; handy for building catalogs in code.
    pub fn new(
        id: impl Into<String>,
        field: impl Into<String>,
        kind: InputKind,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            kind,
            title: title.into(),
            description: None,
            examples: Vec::new(),
            choices: Vec::new(),
            optional: false,
            category: None,
            visible_if: None,
            default: None,
            min: None,
            max: None,
            max_items: None,
            accept: Vec::new(),
        }
    }

    pub fn with_choices(mut self, values: &[&str]) -> Self {
        self.choices = values
            .iter()
            .map(|value| Choice {
                value: (*value).to_string(),
                label: (*value).to_string(),
                description: None,
            })
            .collect();
        self
    }

    pub fn visible_when(mut self, field: impl Into<String>, value: Value) -> Self {
        self.visible_if = Some(RuleSpec {
            field: field.into(),
            op: RuleOp::Eq,
            value: Some(value),
            values: Vec::new(),
        });
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Top-level catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    /// Field that must hold `true` before a submission can be assembled.
    pub confirmation_field: String,
    /// Field used as the human label of a submission in listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_field: Option<String>,
    pub steps: Vec<StepSpec>,
}
