#![allow(missing_docs)]

pub mod answers;
pub mod guard;
pub mod navigator;
pub mod render;
pub mod spec;
pub mod store;
pub mod submission;
pub mod validate;
pub mod visibility;

pub use answers::{AnswerSet, AnswerValue, FieldKey, FileRef, ValueShape};
pub use guard::{CooldownGuard, DEFAULT_COOLDOWN, GuardDecision, check_cooldown};
pub use navigator::{NavigationError, Navigator, Position};
pub use render::{OTHER_FIELDS_HEADING, Report, ReportLayout, render_report};
pub use spec::{
    CatalogError, CatalogSpec, Choice, Condition, InputKind, RuleOp, RuleSpec, StepCatalog,
    StepDefinition, StepId, StepSpec, VisibilityRule,
};
pub use store::AnswerStore;
pub use submission::{
    AssembleError, InMemoryHistory, Submission, SubmissionAssembler, SubmissionHistory,
    SubmissionId, SubmissionSummary,
};
pub use validate::{
    ValidationError, ValidationResult, ValueError, check_value, decode_answers, validate_answers,
};
pub use visibility::{VisibilityMap, VisibleSteps, compute_visible, is_visible, resolve_visibility};
