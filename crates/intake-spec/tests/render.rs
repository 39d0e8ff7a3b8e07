use time::macros::datetime;

use intake_spec::{
    AnswerSet, AnswerValue, CatalogSpec, FileRef, InputKind, OTHER_FIELDS_HEADING, ReportLayout,
    StepCatalog, StepSpec, Submission, SubmissionAssembler, render_report,
};

fn submission(catalog: &StepCatalog) -> Submission {
    let mut answers = catalog.default_answers();
    answers.insert("product_name", AnswerValue::Text("Enterprise Sales AI".into()));
    answers.insert(
        "reference_images",
        AnswerValue::Files(vec![FileRef::named("a.png"), FileRef::named("b.jpg")]),
    );
    answers.insert("confirm_defaults", AnswerValue::Flag(true));
    SubmissionAssembler::new(catalog)
        .assemble_at(&answers, 2, datetime!(2024-05-01 09:30 UTC))
        .expect("assemble")
}

fn all_lines(report: &intake_spec::Report) -> Vec<String> {
    report.pages().iter().flatten().cloned().collect()
}

#[test]
fn header_lists_identity() {
    let catalog = StepCatalog::avatar_intake().expect("catalog");
    let submission = submission(&catalog);
    let report = render_report(&catalog, &submission, &ReportLayout::default());
    let lines = all_lines(&report);
    assert_eq!(lines[0], "Avatar Intake Form Submission");
    assert!(lines.contains(&format!("Submission ID: {}", submission.id())));
    assert!(lines.contains(&"Date: 2024-05-01 09:30:00 UTC".to_string()));
    assert!(lines.contains(&"Version: 3".to_string()));
}

#[test]
fn title_underline_counts_characters() {
    let catalog = StepCatalog::from_definition(CatalogSpec {
        id: "umlaut".into(),
        title: "Überblick für Äpfel".into(),
        version: "1".into(),
        confirmation_field: "confirm".into(),
        summary_field: None,
        steps: vec![StepSpec::new(
            "confirm",
            "confirm",
            InputKind::BooleanConfirm,
            "Confirm",
        )],
    })
    .expect("catalog");
    let mut answers = AnswerSet::new();
    answers.insert("confirm", AnswerValue::Flag(true));
    let submission = SubmissionAssembler::new(&catalog)
        .assemble_at(&answers, 0, datetime!(2024-05-01 09:30 UTC))
        .expect("assemble");

    let lines = all_lines(&render_report(&catalog, &submission, &ReportLayout::default()));
    assert_eq!(lines[0], "Überblick für Äpfel");
    assert_eq!(lines[1], "=".repeat(19));
}

#[test]
fn sections_follow_catalog_order() {
    let catalog = StepCatalog::avatar_intake().expect("catalog");
    let report = render_report(&catalog, &submission(&catalog), &ReportLayout::default());
    let lines = all_lines(&report);
    let position = |heading: &str| lines.iter().position(|line| line == heading);
    let product = position("Product Info").expect("product info");
    let appearance = position("Avatar Appearance").expect("appearance");
    let confirmation = position("Confirmation").expect("confirmation");
    assert!(product < appearance && appearance < confirmation);
    assert!(position(OTHER_FIELDS_HEADING).is_none());
}

#[test]
fn values_use_labels_and_readable_forms() {
    let catalog = StepCatalog::avatar_intake().expect("catalog");
    let report = render_report(&catalog, &submission(&catalog), &ReportLayout::default());
    let text = report.to_text();
    assert!(text.contains("Photorealistic"));
    assert!(text.contains("2 file(s): a.png, b.jpg"));
    assert!(text.contains("confirm defaults:"));
    assert!(text.contains("Yes"));
}

#[test]
fn unknown_fields_go_under_other_fields() {
    let catalog = StepCatalog::avatar_intake().expect("catalog");
    let mut answers = catalog.default_answers();
    answers.insert("confirm_defaults", AnswerValue::Flag(true));
    answers.insert("legacy_note", AnswerValue::Text("from an older catalog".into()));
    let submission = SubmissionAssembler::new(&catalog)
        .assemble(&answers, 0)
        .expect("assemble");
    let report = render_report(&catalog, &submission, &ReportLayout::default());
    let lines = all_lines(&report);
    let other = lines
        .iter()
        .position(|line| line == OTHER_FIELDS_HEADING)
        .expect("other fields");
    assert!(lines[other..].iter().any(|line| line.starts_with("legacy note:")));
}

#[test]
fn long_values_wrap_within_width() {
    let catalog = StepCatalog::avatar_intake().expect("catalog");
    let mut answers = catalog.default_answers();
    answers.insert("confirm_defaults", AnswerValue::Flag(true));
    answers.insert(
        "marq_notes",
        AnswerValue::Text(format!("{} {}", "word ".repeat(60), "x".repeat(120))),
    );
    let submission = SubmissionAssembler::new(&catalog)
        .assemble(&answers, 0)
        .expect("assemble");
    let layout = ReportLayout::new(60, 40);
    let report = render_report(&catalog, &submission, &layout);
    for line in all_lines(&report) {
        assert!(line.chars().count() <= 60, "line too wide: {line:?}");
    }
}

#[test]
fn pages_are_numbered_and_headings_keep_their_first_entry() {
    let catalog = StepCatalog::avatar_intake().expect("catalog");
    let layout = ReportLayout::new(60, 12);
    let report = render_report(&catalog, &submission(&catalog), &layout);
    let total = report.page_count();
    assert!(total > 1);

    for (idx, page) in report.pages().iter().enumerate() {
        assert!(page.len() <= 12);
        assert_eq!(page.last(), Some(&format!("Page {} of {}", idx + 1, total)));
        let body = &page[..page.len() - 2];
        if let Some(last) = body.last() {
            assert!(
                !last.chars().all(|ch| ch == '-') || last.is_empty(),
                "heading left at page bottom"
            );
        }
    }

    let bytes = report.to_bytes();
    let feeds = bytes.iter().filter(|byte| **byte == 0x0c).count();
    assert_eq!(feeds, total - 1);
}
