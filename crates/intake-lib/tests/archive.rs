use assert_fs::TempDir;
use assert_fs::prelude::*;
use time::macros::datetime;

use intake_lib::{ArchiveError, DraftSnapshot, LocalArchive};
use intake_spec::{AnswerSet, AnswerValue, StepCatalog, Submission, SubmissionAssembler};

fn submission(prior: usize) -> Submission {
    let catalog = StepCatalog::avatar_intake().expect("catalog");
    let mut answers = AnswerSet::new();
    answers.insert("confirm_defaults", AnswerValue::Flag(true));
    SubmissionAssembler::new(&catalog)
        .assemble_at(&answers, prior, datetime!(2024-05-01 12:00 UTC))
        .expect("assemble")
}

#[tokio::test]
async fn retain_keeps_newest_first_and_drops_duplicates() {
    let temp = TempDir::new().expect("tempdir");
    let archive = LocalArchive::new(temp.path(), 2);
    let first = submission(0);
    let second = submission(1);
    let third = submission(2);

    archive.retain(&first).await.expect("first");
    archive.retain(&second).await.expect("second");
    archive.retain(&second).await.expect("second again");
    assert_eq!(
        archive.load_all().await.expect("load"),
        vec![second.clone(), first]
    );

    archive.retain(&third).await.expect("third");
    let ids: Vec<_> = archive
        .load_all()
        .await
        .expect("load")
        .iter()
        .map(Submission::id)
        .collect();
    assert_eq!(ids, vec![third.id(), second.id()]);
    temp.child("local-submissions.json")
        .assert(predicates::path::is_file());
}

#[tokio::test]
async fn empty_archive_reads_as_nothing() {
    let temp = TempDir::new().expect("tempdir");
    let archive = LocalArchive::new(temp.child("missing").path(), 10);
    assert!(archive.load_all().await.expect("load").is_empty());
    assert!(archive.load_draft().await.expect("draft").is_none());
    archive.clear_draft().await.expect("clearing nothing is fine");
}

#[tokio::test]
async fn drafts_save_load_and_clear() {
    let temp = TempDir::new().expect("tempdir");
    let archive = LocalArchive::new(temp.path(), 10);
    let mut answers = AnswerSet::new();
    answers.insert("product_name", AnswerValue::Text("Greeter".into()));
    let draft = DraftSnapshot {
        answers,
        current_step: 3,
        saved_at: datetime!(2024-05-01 12:30 UTC),
    };

    archive.save_draft(&draft).await.expect("save");
    assert_eq!(archive.load_draft().await.expect("load"), Some(draft));
    archive.clear_draft().await.expect("clear");
    assert!(archive.load_draft().await.expect("load").is_none());
}

#[tokio::test]
async fn corrupt_archive_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    temp.child("local-submissions.json")
        .write_str("{not json")
        .expect("write");
    let archive = LocalArchive::new(temp.path(), 10);
    let err = archive.load_all().await.unwrap_err();
    assert!(matches!(err, ArchiveError::Json(_)));
}
