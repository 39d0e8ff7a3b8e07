use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::spec::step::InputKind;
use crate::validate::ValueError;

/// Identifier of the answer slot a step writes to.
pub type FieldKey = String;

/// Metadata for one uploaded file. The bytes travel through a separate channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl FileRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes: None,
            media_type: None,
        }
    }
}

/// Storage shape of an answer, shared by every input kind that stores the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Choice,
    Text,
    Number,
    Flag,
    Files,
    Links,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueShape::Choice => "choice",
            ValueShape::Text => "text",
            ValueShape::Number => "number",
            ValueShape::Flag => "boolean",
            ValueShape::Files => "file list",
            ValueShape::Links => "link list",
        };
        f.write_str(label)
    }
}

/// A single answer. Each [`InputKind`] maps to exactly one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Choice(String),
    Text(String),
    Number(i64),
    Flag(bool),
    Files(Vec<FileRef>),
    Links(Vec<String>),
}

impl AnswerValue {
    pub fn shape(&self) -> ValueShape {
        match self {
            AnswerValue::Choice(_) => ValueShape::Choice,
            AnswerValue::Text(_) => ValueShape::Text,
            AnswerValue::Number(_) => ValueShape::Number,
            AnswerValue::Flag(_) => ValueShape::Flag,
            AnswerValue::Files(_) => ValueShape::Files,
            AnswerValue::Links(_) => ValueShape::Links,
        }
    }

    pub fn fits(&self, kind: InputKind) -> bool {
        self.shape() == kind.shape()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnswerValue::Choice(text) | AnswerValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnswerValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            AnswerValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Plain JSON form used at the input boundary and in outbound payloads.
    pub fn to_json(&self) -> Value {
        match self {
            AnswerValue::Choice(text) | AnswerValue::Text(text) => Value::String(text.clone()),
            AnswerValue::Number(number) => Value::from(*number),
            AnswerValue::Flag(flag) => Value::Bool(*flag),
            AnswerValue::Files(files) => Value::Array(
                files
                    .iter()
                    .map(|file| serde_json::to_value(file).unwrap_or(Value::Null))
                    .collect(),
            ),
            AnswerValue::Links(links) => {
                Value::Array(links.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// Interprets plain JSON as a value of the given kind.
    ///
    /// Numbers are accepted for choice kinds (option values such as `"50"` are
    /// strings), numeric strings for `numeric`, and the usual yes/no spellings
    /// for the boolean kinds. Files may be given as bare names.
    pub fn from_json(kind: InputKind, raw: &Value) -> Result<Self, ValueError> {
        let mismatch = || ValueError::TypeMismatch {
            expected: kind.shape(),
            found: json_type_name(raw).to_string(),
        };
        match kind.shape() {
            ValueShape::Choice => match raw {
                Value::String(text) => Ok(AnswerValue::Choice(text.clone())),
                Value::Number(number) => Ok(AnswerValue::Choice(number.to_string())),
                _ => Err(mismatch()),
            },
            ValueShape::Text => match raw {
                Value::String(text) => Ok(AnswerValue::Text(text.clone())),
                _ => Err(mismatch()),
            },
            ValueShape::Number => match raw {
                Value::Number(number) => number
                    .as_i64()
                    .map(AnswerValue::Number)
                    .ok_or_else(mismatch),
                Value::String(text) => text
                    .trim()
                    .parse::<i64>()
                    .map(AnswerValue::Number)
                    .map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            ValueShape::Flag => match raw {
                Value::Bool(flag) => Ok(AnswerValue::Flag(*flag)),
                Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "y" | "1" => Ok(AnswerValue::Flag(true)),
                    "false" | "no" | "n" | "0" => Ok(AnswerValue::Flag(false)),
                    _ => Err(mismatch()),
                },
                _ => Err(mismatch()),
            },
            ValueShape::Files => {
                let items = raw.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(name) => Ok(FileRef::named(name.clone())),
                        Value::Object(_) => {
                            serde_json::from_value::<FileRef>(item.clone()).map_err(|_| mismatch())
                        }
                        _ => Err(mismatch()),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(AnswerValue::Files)
            }
            ValueShape::Links => {
                let items = raw.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|item| item.as_str().map(|link| link.trim().to_string()))
                    .collect::<Option<Vec<_>>>()
                    .map(AnswerValue::Links)
                    .ok_or_else(mismatch)
            }
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Choice(text) | AnswerValue::Text(text) => f.write_str(text),
            AnswerValue::Number(number) => write!(f, "{number}"),
            AnswerValue::Flag(true) => f.write_str("yes"),
            AnswerValue::Flag(false) => f.write_str("no"),
            AnswerValue::Files(files) => {
                let names = files
                    .iter()
                    .map(|file| file.name.as_str())
                    .collect::<Vec<_>>();
                f.write_str(&names.join(", "))
            }
            AnswerValue::Links(links) => f.write_str(&links.join(", ")),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Answers keyed by field. A field that was never set is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<FieldKey, AnswerValue>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&AnswerValue> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<FieldKey>, value: AnswerValue) -> Option<AnswerValue> {
        self.0.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<AnswerValue> {
        self.0.remove(field)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &AnswerValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.0.keys()
    }

    /// Flattens the set into a plain JSON object.
    pub fn to_json(&self) -> Value {
        let map = self
            .0
            .iter()
            .map(|(field, value)| (field.clone(), value.to_json()))
            .collect::<Map<String, Value>>();
        Value::Object(map)
    }
}

impl FromIterator<(FieldKey, AnswerValue)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (FieldKey, AnswerValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for AnswerSet {
    type Item = (FieldKey, AnswerValue);
    type IntoIter = std::collections::btree_map::IntoIter<FieldKey, AnswerValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
