use crate::answers::AnswerSet;
use crate::spec::catalog::StepCatalog;
use crate::spec::step::StepDefinition;

pub type VisibilityMap = std::collections::BTreeMap<String, bool>;

/// Steps currently shown to the user, in catalog order.
#[derive(Debug, Clone)]
pub struct VisibleSteps<'a> {
    steps: Vec<&'a StepDefinition>,
}

impl<'a> VisibleSteps<'a> {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a StepDefinition> {
        self.steps.get(index).copied()
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position_of(id).is_some()
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.steps.iter().map(|step| step.id.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a StepDefinition> + '_ {
        self.steps.iter().copied()
    }
}

pub fn is_visible(step: &StepDefinition, answers: &AnswerSet) -> bool {
    step.visible_if
        .as_ref()
        .is_none_or(|rule| rule.matches(answers))
}

/// Filters the catalog down to the steps whose rule holds for `answers`.
pub fn compute_visible<'a>(catalog: &'a StepCatalog, answers: &AnswerSet) -> VisibleSteps<'a> {
    let steps: Vec<&StepDefinition> = catalog
        .list_all()
        .iter()
        .filter(|step| is_visible(step, answers))
        .collect();
    tracing::debug!(
        visible = steps.len(),
        total = catalog.len(),
        "computed visible steps"
    );
    VisibleSteps { steps }
}

pub fn resolve_visibility(catalog: &StepCatalog, answers: &AnswerSet) -> VisibilityMap {
    catalog
        .list_all()
        .iter()
        .map(|step| (step.id.clone(), is_visible(step, answers)))
        .collect()
}
