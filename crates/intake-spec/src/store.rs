use crate::answers::{AnswerSet, AnswerValue, FieldKey};

/// Mutable answer data for one wizard session.
///
/// The store does no validation; callers check values against the catalog
/// before writing.
#[derive(Debug, Clone, Default)]
pub struct AnswerStore {
    answers: AnswerSet,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers(answers: AnswerSet) -> Self {
        Self { answers }
    }

    pub fn get(&self, field: &str) -> Option<&AnswerValue> {
        self.answers.get(field)
    }

    /// Writes one field, returning the value it replaced.
    pub fn set(&mut self, field: impl Into<FieldKey>, value: AnswerValue) -> Option<AnswerValue> {
        self.answers.insert(field, value)
    }

    pub fn remove(&mut self, field: &str) -> Option<AnswerValue> {
        self.answers.remove(field)
    }

    /// Merges `patch` over the current answers.
    pub fn apply_patch(&mut self, patch: AnswerSet) {
        for (field, value) in patch {
            self.answers.insert(field, value);
        }
    }

    pub fn replace_all(&mut self, answers: AnswerSet) {
        self.answers = answers;
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn snapshot(&self) -> AnswerSet {
        self.answers.clone()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
