use serde_json::json;

use intake_spec::{
    AnswerValue, FileRef, StepCatalog, ValueError, check_value, decode_answers, validate_answers,
};

fn catalog() -> StepCatalog {
    StepCatalog::avatar_intake().expect("catalog")
}

#[test]
fn numeric_range_is_enforced() {
    let catalog = catalog();
    let step = catalog.step("audio-days").expect("step");
    assert!(check_value(step, &AnswerValue::Number(30)).is_ok());
    assert_eq!(
        check_value(step, &AnswerValue::Number(0)),
        Err(ValueError::BelowMinimum { value: 0, min: 1 })
    );
    assert_eq!(
        check_value(step, &AnswerValue::Number(366)),
        Err(ValueError::AboveMaximum {
            value: 366,
            max: 365
        })
    );
}

#[test]
fn shape_must_match_kind() {
    let catalog = catalog();
    let step = catalog.step("store-audio").expect("step");
    let err = check_value(step, &AnswerValue::Text("yes".into())).unwrap_err();
    assert_eq!(err.code(), "type_mismatch");
}

#[test]
fn choices_must_be_declared() {
    let catalog = catalog();
    let step = catalog.step("accent").expect("step");
    assert!(check_value(step, &AnswerValue::Choice("other".into())).is_ok());
    assert!(matches!(
        check_value(step, &AnswerValue::Choice("british".into())),
        Err(ValueError::UnknownChoice { .. })
    ));
}

#[test]
fn links_are_limited_and_parsed() {
    let catalog = catalog();
    let step = catalog.step_for_field("like_links").expect("step");
    let ok = AnswerValue::Links(vec!["https://example.com/voice".into()]);
    assert!(check_value(step, &ok).is_ok());

    let too_many = AnswerValue::Links(vec!["https://a.example".into(); 4]);
    assert_eq!(
        check_value(step, &too_many),
        Err(ValueError::TooManyItems { count: 4, max: 3 })
    );

    let bad = AnswerValue::Links(vec!["ftp://example.com/file".into()]);
    assert!(matches!(
        check_value(step, &bad),
        Err(ValueError::InvalidLink { .. })
    ));
    let garbage = AnswerValue::Links(vec!["not a link".into()]);
    assert!(check_value(step, &garbage).is_err());
}

#[test]
fn files_need_accepted_extensions() {
    let catalog = catalog();
    let step = catalog.step_for_field("reference_images").expect("step");
    let ok = AnswerValue::Files(vec![FileRef::named("face.PNG"), FileRef::named("side.jpeg")]);
    assert!(check_value(step, &ok).is_ok());

    let video = AnswerValue::Files(vec![FileRef::named("clip.mp4")]);
    assert!(matches!(
        check_value(step, &video),
        Err(ValueError::UnsupportedFile { .. })
    ));

    let inspiration = catalog.step_for_field("inspiration_uploads").expect("step");
    assert!(check_value(inspiration, &video).is_ok());
}

#[test]
fn hidden_steps_are_not_validated() {
    let catalog = catalog();
    let mut answers = catalog.default_answers();
    answers.insert("audio_days", AnswerValue::Number(1_000));
    assert!(validate_answers(&catalog, &answers).valid);

    answers.insert("store_audio", AnswerValue::Flag(true));
    let result = validate_answers(&catalog, &answers);
    assert!(!result.valid);
    assert_eq!(result.errors[0].field, "audio_days");
    assert_eq!(result.errors[0].path, "/audio_days");
    assert_eq!(result.errors[0].code, "max");
}

#[test]
fn decodes_plain_json_answers() {
    let catalog = catalog();
    let raw = json!({
        "product_name": "Concierge",
        "concurrent_users": 50,
        "store_video": "yes",
        "video_days": "14",
        "reference_images": ["a.png", {"name": "b.webp", "size_bytes": 1024}],
        "marq_notes": null,
        "legacy_note": 3
    });
    let answers = decode_answers(&catalog, &raw).expect("valid answers");
    assert_eq!(
        answers.get("concurrent_users"),
        Some(&AnswerValue::Choice("50".into()))
    );
    assert_eq!(answers.get("store_video"), Some(&AnswerValue::Flag(true)));
    assert_eq!(answers.get("video_days"), Some(&AnswerValue::Number(14)));
    assert!(answers.get("marq_notes").is_none());
    assert_eq!(answers.get("legacy_note"), Some(&AnswerValue::Text("3".into())));

    let result = validate_answers(&catalog, &answers);
    assert_eq!(result.unknown_fields, vec!["legacy_note".to_string()]);
}

#[test]
fn decode_reports_every_problem() {
    let catalog = catalog();
    let raw = json!({
        "store_audio": "perhaps",
        "avatar_type": "cartoon"
    });
    let result = decode_answers(&catalog, &raw).unwrap_err();
    assert!(!result.valid);
    let fields: Vec<&str> = result.errors.iter().map(|err| err.field.as_str()).collect();
    assert!(fields.contains(&"store_audio"));
    assert!(fields.contains(&"avatar_type"));

    assert!(decode_answers(&catalog, &json!([1, 2])).is_err());
}
