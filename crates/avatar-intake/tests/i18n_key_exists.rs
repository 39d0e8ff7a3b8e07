use std::collections::BTreeMap;

#[test]
fn cli_i18n_keys_exist_in_root_en_catalog() {
    let root_en = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join("i18n/en.json");
    let raw = std::fs::read_to_string(&root_en).expect("read root i18n/en.json");
    let catalog: BTreeMap<String, String> = serde_json::from_str(&raw).expect("parse en.json");

    let required = [
        "cli.history.result.count",
        "cli.history.result.empty",
        "cli.render.result.written",
        "cli.result.invalid_answers",
        "cli.result.invalid_id",
        "cli.result.not_found",
        "cli.result.unknown_field",
        "cli.steps.result.summary",
        "cli.wizard.prompt.list",
        "cli.wizard.prompt.select",
        "cli.wizard.result.answer_yes_no",
        "cli.wizard.result.commands_hint",
        "cli.wizard.result.confirmation_required",
        "cli.wizard.result.draft_saved",
        "cli.wizard.result.intro",
        "cli.wizard.result.invalid_choice",
        "cli.wizard.result.jump_out_of_range",
        "cli.wizard.result.no_draft",
        "cli.wizard.result.no_steps",
        "cli.wizard.result.rate_limited",
        "cli.wizard.result.stored_locally",
        "cli.wizard.result.submitted",
        "cli.wizard.result.unknown_command",
        "cli.wizard.result.validation_error",
        "cli.wizard.result.value_required",
        "cli.wizard.step.examples",
        "cli.wizard.step.header",
    ];

    for key in required {
        assert!(catalog.contains_key(key), "missing i18n key {key}");
    }
}
