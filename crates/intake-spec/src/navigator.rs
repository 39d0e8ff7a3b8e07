use thiserror::Error;

use crate::spec::step::{StepDefinition, StepId};
use crate::visibility::VisibleSteps;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("step index {index} is out of range (visible steps: {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Where the wizard currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Position {
    /// Landing state before the first step; also where `exit` returns to.
    #[default]
    NotStarted,
    /// Index into the current visible-step list.
    OnStep(usize),
}

/// Tracks the current step as an index into the visible list.
///
/// The navigator also remembers the id of the step it was on so that a change
/// to the visible list can keep the user on the same step when possible.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    position: Position,
    anchor: Option<StepId>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Current index, `-1` before the wizard is started.
    pub fn index(&self) -> isize {
        match self.position {
            Position::NotStarted => -1,
            Position::OnStep(index) => index as isize,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.position {
            Position::NotStarted => None,
            Position::OnStep(index) => Some(index),
        }
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn is_started(&self) -> bool {
        self.position != Position::NotStarted
    }

    pub fn current_step<'a>(&self, visible: &VisibleSteps<'a>) -> Option<&'a StepDefinition> {
        self.current_index().and_then(|index| visible.get(index))
    }

    /// Moves to the first visible step. Starting an already started wizard restarts it.
    pub fn start(&mut self, visible: &VisibleSteps<'_>) {
        if visible.is_empty() {
            self.reset();
            return;
        }
        self.set_index(0, visible);
    }

    pub fn advance(&mut self, visible: &VisibleSteps<'_>) {
        if let Position::OnStep(index) = self.position
            && index + 1 < visible.len()
        {
            self.set_index(index + 1, visible);
        }
    }

    pub fn retreat(&mut self, visible: &VisibleSteps<'_>) {
        if let Position::OnStep(index) = self.position
            && index > 0
        {
            self.set_index(index - 1, visible);
        }
    }

    pub fn jump_to(&mut self, index: usize, visible: &VisibleSteps<'_>) -> Result<(), NavigationError> {
        if index >= visible.len() {
            return Err(NavigationError::OutOfRange {
                index,
                len: visible.len(),
            });
        }
        self.set_index(index, visible);
        Ok(())
    }

    /// Keeps the index in bounds after the visible list changed length.
    ///
    /// Only the index is considered, so the anchor is always dropped; use
    /// [`Navigator::reanchor`] to stay on the same step when the list was
    /// reshaped around it.
    pub fn on_visible_list_changed(&mut self, new_len: usize) {
        if let Position::OnStep(index) = self.position {
            if new_len == 0 {
                self.reset();
                return;
            }
            self.position = Position::OnStep(index.min(new_len - 1));
            self.anchor = None;
        }
    }

    /// Re-resolves the current position against a recomputed visible list.
    ///
    /// Stays on the anchored step if it is still visible. Otherwise the index is
    /// clamped and the navigator anchors to whatever step now sits there.
    pub fn reanchor(&mut self, visible: &VisibleSteps<'_>) {
        let Position::OnStep(index) = self.position else {
            return;
        };
        if let Some(anchor) = &self.anchor
            && let Some(found) = visible.position_of(anchor)
        {
            self.position = Position::OnStep(found);
            return;
        }
        if visible.is_empty() {
            self.reset();
            return;
        }
        let clamped = index.min(visible.len() - 1);
        self.set_index(clamped, visible);
    }

    pub fn is_first_step(&self) -> bool {
        self.position == Position::OnStep(0)
    }

    pub fn is_last_step(&self, visible_len: usize) -> bool {
        matches!(self.position, Position::OnStep(index) if index + 1 == visible_len)
    }

    /// Fraction of the visible steps reached, counting the current one.
    pub fn progress(&self, visible_len: usize) -> f64 {
        match self.position {
            Position::OnStep(index) if visible_len > 0 => {
                ((index + 1) as f64 / visible_len as f64).min(1.0)
            }
            _ => 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.position = Position::NotStarted;
        self.anchor = None;
    }

    fn set_index(&mut self, index: usize, visible: &VisibleSteps<'_>) {
        self.position = Position::OnStep(index);
        self.anchor = visible.get(index).map(|step| step.id.clone());
    }
}
