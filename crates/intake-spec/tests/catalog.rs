use serde_json::json;

use intake_spec::{
    AnswerValue, CatalogError, CatalogSpec, Condition, InputKind, RuleOp, RuleSpec, StepCatalog,
    StepSpec,
};

fn confirm_step() -> StepSpec {
    StepSpec::new("confirm", "confirm", InputKind::BooleanConfirm, "Confirm")
}

fn catalog_spec(steps: Vec<StepSpec>) -> CatalogSpec {
    CatalogSpec {
        id: "test".into(),
        title: "Test".into(),
        version: "1.0".into(),
        confirmation_field: "confirm".into(),
        summary_field: None,
        steps,
    }
}

#[test]
fn builtin_catalog_loads() {
    let catalog = StepCatalog::avatar_intake().expect("builtin catalog");
    assert_eq!(catalog.id(), "avatar-intake");
    assert_eq!(catalog.len(), 50);
    assert_eq!(catalog.confirmation_field(), "confirm_defaults");
    assert_eq!(catalog.summary_field(), Some("product_name"));
    assert_eq!(catalog.list_all()[0].field, "product_name");

    let custom_accent = catalog.step("custom-accent").expect("custom accent step");
    let rule = custom_accent.visible_if.as_ref().expect("conditional");
    assert_eq!(rule.depends_on(), "accent");
    assert_eq!(
        rule.condition,
        Condition::Equals(AnswerValue::Choice("other".into()))
    );
}

#[test]
fn builtin_catalog_defaults_and_categories() {
    let catalog = StepCatalog::avatar_intake().expect("builtin catalog");
    let defaults = catalog.default_answers();
    assert_eq!(
        defaults.get("avatar_type"),
        Some(&AnswerValue::Choice("realistic".into()))
    );
    assert_eq!(defaults.get("allow_export"), Some(&AnswerValue::Flag(true)));
    assert_eq!(
        defaults.get("confirm_defaults"),
        Some(&AnswerValue::Flag(false))
    );
    assert!(defaults.get("product_name").is_none());

    let categories = catalog.categories();
    assert_eq!(categories.first(), Some(&"Product Info"));
    assert_eq!(categories.last(), Some(&"Confirmation"));
    assert!(categories.contains(&"Storage & Export"));
}

#[test]
fn lookups_by_id_and_field() {
    let catalog = StepCatalog::avatar_intake().expect("builtin catalog");
    let step = catalog.step_for_field("audio_days").expect("audio days");
    assert_eq!(step.id, "audio-days");
    assert_eq!(step.kind, InputKind::Numeric);
    assert_eq!((step.min, step.max), (Some(1), Some(365)));
    assert_eq!(catalog.position_of("product-name"), Some(0));
    assert!(catalog.step("missing").is_none());
}

#[test]
fn rejects_duplicate_ids_and_fields() {
    let err = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("a", "a", InputKind::FreeText, "A"),
        StepSpec::new("a", "b", InputKind::FreeText, "B"),
        confirm_step(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateStepId(id) if id == "a"));

    let err = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("a", "same", InputKind::FreeText, "A"),
        StepSpec::new("b", "same", InputKind::FreeText, "B"),
        confirm_step(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateField { field, .. } if field == "same"));
}

#[test]
fn rejects_unknown_and_forward_dependencies() {
    let err = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("a", "a", InputKind::FreeText, "A").visible_when("nope", json!("x")),
        confirm_step(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CatalogError::UnknownDependency { .. }));

    let err = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("a", "a", InputKind::FreeText, "A").visible_when("b", json!("x")),
        StepSpec::new("b", "b", InputKind::FreeText, "B"),
        confirm_step(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CatalogError::ForwardDependency { step, .. } if step == "a"));
}

#[test]
fn rejects_self_reference() {
    let err = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("a", "a", InputKind::FreeText, "A").visible_when("a", json!("x")),
        confirm_step(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CatalogError::ForwardDependency { .. }));
}

#[test]
fn rejects_collection_dependencies() {
    let err = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("links", "links", InputKind::LinkSet, "Links"),
        StepSpec::new("b", "b", InputKind::FreeText, "B").visible_when("links", json!([])),
        confirm_step(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CatalogError::UnsupportedDependency { .. }));
}

#[test]
fn rejects_rule_values_that_cannot_match() {
    let err = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("flag", "flag", InputKind::BooleanToggle, "Flag"),
        StepSpec::new("b", "b", InputKind::FreeText, "B").visible_when("flag", json!("maybe")),
        confirm_step(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CatalogError::IncompatibleRuleValue { .. }));

    let err = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("pick", "pick", InputKind::SingleChoice, "Pick").with_choices(&["a", "b"]),
        StepSpec::new("b", "b", InputKind::FreeText, "B").visible_when("pick", json!("c")),
        confirm_step(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CatalogError::UnknownRuleChoice { value, .. } if value == "c"));
}

#[test]
fn one_of_rules_resolve_every_value() {
    let mut dependent = StepSpec::new("b", "b", InputKind::FreeText, "B");
    dependent.visible_if = Some(RuleSpec {
        field: "pick".into(),
        op: RuleOp::OneOf,
        value: None,
        values: vec![json!("a"), json!("b")],
    });
    let catalog = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("pick", "pick", InputKind::SingleChoice, "Pick").with_choices(&["a", "b", "c"]),
        dependent,
        confirm_step(),
    ]))
    .expect("catalog");
    let rule = catalog.step("b").and_then(|step| step.visible_if.clone());
    assert_eq!(
        rule.map(|rule| rule.condition),
        Some(Condition::OneOf(vec![
            AnswerValue::Choice("a".into()),
            AnswerValue::Choice("b".into()),
        ]))
    );

    let mut empty = StepSpec::new("b", "b", InputKind::FreeText, "B");
    empty.visible_if = Some(RuleSpec {
        field: "pick".into(),
        op: RuleOp::OneOf,
        value: None,
        values: vec![],
    });
    let err = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("pick", "pick", InputKind::SingleChoice, "Pick").with_choices(&["a"]),
        empty,
        confirm_step(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CatalogError::MalformedRule { .. }));
}

#[test]
fn choice_steps_need_choices() {
    let err = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("pick", "pick", InputKind::SingleChoice, "Pick"),
        confirm_step(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CatalogError::MissingChoices(id) if id == "pick"));

    let err = StepCatalog::from_definition(catalog_spec(vec![
        StepSpec::new("text", "text", InputKind::FreeText, "Text").with_choices(&["a"]),
        confirm_step(),
    ]))
    .unwrap_err();
    assert!(matches!(err, CatalogError::UnexpectedChoices(_)));
}

#[test]
fn rejects_invalid_defaults() {
    let mut step = StepSpec::new("days", "days", InputKind::Numeric, "Days");
    step.min = Some(1);
    step.max = Some(365);
    step.default = Some(json!(400));
    let err = StepCatalog::from_definition(catalog_spec(vec![step, confirm_step()])).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidDefault { .. }));
}

#[test]
fn confirmation_field_must_be_a_confirm_step() {
    let mut spec = catalog_spec(vec![StepSpec::new("a", "a", InputKind::FreeText, "A")]);
    spec.confirmation_field = "missing".into();
    assert!(matches!(
        StepCatalog::from_definition(spec).unwrap_err(),
        CatalogError::UnknownConfirmationField(_)
    ));

    let mut spec = catalog_spec(vec![StepSpec::new("a", "a", InputKind::BooleanToggle, "A")]);
    spec.confirmation_field = "a".into();
    assert!(matches!(
        StepCatalog::from_definition(spec).unwrap_err(),
        CatalogError::ConfirmationKindMismatch { .. }
    ));

    let mut spec = catalog_spec(vec![confirm_step()]);
    spec.summary_field = Some("title".into());
    assert!(matches!(
        StepCatalog::from_definition(spec).unwrap_err(),
        CatalogError::UnknownSummaryField(_)
    ));
}

#[test]
fn parses_catalog_json() {
    let raw = json!({
        "id": "mini",
        "title": "Mini",
        "version": "0.1",
        "confirmation_field": "ok",
        "steps": [
            {"id": "flag", "field": "flag", "kind": "boolean_toggle", "title": "Flag", "default": false},
            {"id": "days", "field": "days", "kind": "numeric", "title": "Days",
             "visible_if": {"field": "flag", "value": true}, "min": 1, "max": 10},
            {"id": "ok", "field": "ok", "kind": "boolean_confirm", "title": "OK"}
        ]
    });
    let catalog = StepCatalog::from_json_str(&raw.to_string()).expect("catalog");
    assert_eq!(catalog.len(), 3);
    assert!(catalog.step("days").is_some_and(|step| step.is_conditional()));

    let err = StepCatalog::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, CatalogError::Parse(_)));
}
