pub mod catalog;
pub mod definition;
pub mod step;

pub use catalog::{CatalogError, StepCatalog};
pub use definition::{CatalogSpec, RuleOp, RuleSpec, StepSpec};
pub use step::{Choice, Condition, InputKind, StepDefinition, StepId, VisibilityRule};
