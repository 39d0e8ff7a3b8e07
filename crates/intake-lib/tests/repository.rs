use std::net::TcpListener;
use std::sync::Arc;

use time::Duration;
use time::macros::datetime;
use url::Url;

use intake_lib::{
    FsRepository, HttpRepository, LocalArchive, MemoryRepository, RepositoryError,
    SubmissionRepository, recover_history,
};
use intake_spec::{
    AnswerSet, AnswerValue, StepCatalog, Submission, SubmissionAssembler, SubmissionHistory,
    SubmissionId,
};

fn submission(catalog: &StepCatalog, name: &str, prior: usize) -> Submission {
    let mut answers = AnswerSet::new();
    answers.insert("confirm_defaults", AnswerValue::Flag(true));
    answers.insert("product_name", AnswerValue::Text(name.into()));
    let at = datetime!(2024-05-01 12:00 UTC) + Duration::minutes(prior as i64);
    SubmissionAssembler::new(catalog)
        .assemble_at(&answers, prior, at)
        .expect("assemble")
}

fn catalog() -> StepCatalog {
    StepCatalog::avatar_intake().expect("catalog")
}

#[tokio::test]
async fn fs_repository_round_trips_and_indexes_newest_first() {
    let catalog = catalog();
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = FsRepository::new(dir.path(), Some("product_name".into()), 200);

    let first = submission(&catalog, "Alpha", 0);
    let second = submission(&catalog, "Beta", 1);
    repo.append(&first).await.expect("append first");
    repo.append(&second).await.expect("append second");

    let listed = repo.list_all().await.expect("list");
    assert_eq!(listed, vec![second.clone(), first.clone()]);

    let summaries = repo.summaries().await.expect("summaries");
    assert_eq!(summaries[0].label, "Beta");
    assert_eq!(summaries[1].version, 1);

    let found = repo.get_by_id(first.id()).await.expect("get");
    assert_eq!(found.as_ref(), Some(&first));
    assert!(
        dir.path()
            .join("submissions")
            .join(format!("{}.json", first.id()))
            .is_file()
    );
}

#[tokio::test]
async fn fs_repository_returns_none_for_unknown_ids() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = FsRepository::new(dir.path(), None, 200);
    assert!(repo.list_all().await.expect("list").is_empty());
    let missing = repo.get_by_id(SubmissionId::new()).await.expect("get");
    assert!(missing.is_none());
}

#[tokio::test]
async fn fs_repository_index_respects_retention() {
    let catalog = catalog();
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = FsRepository::new(dir.path(), Some("product_name".into()), 2);
    for prior in 0..3 {
        repo.append(&submission(&catalog, &format!("Run {prior}"), prior))
            .await
            .expect("append");
    }
    let listed = repo.list_all().await.expect("list");
    let versions: Vec<u32> = listed.iter().map(Submission::version).collect();
    assert_eq!(versions, vec![3, 2]);
}

#[tokio::test]
async fn memory_repository_orders_and_truncates() {
    let catalog = catalog();
    let repo = MemoryRepository::with_retention(2);
    for prior in 0..3 {
        repo.append(&submission(&catalog, "Same", prior))
            .await
            .expect("append");
    }
    let listed = repo.list_all().await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].version(), 3);
}

#[tokio::test]
async fn http_repository_surfaces_connection_errors() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let base = Url::parse(&format!("http://127.0.0.1:{port}/api")).expect("url");
    let repo = HttpRepository::new(base, 200).expect("client");
    let err = repo.list_all().await.unwrap_err();
    assert!(matches!(err, RepositoryError::Http(_)), "{err:?}");
}

#[tokio::test]
async fn recovered_history_falls_back_to_archive() {
    let catalog = catalog();
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = LocalArchive::new(dir.path(), 200);
    let older = submission(&catalog, "Older", 0);
    let newer = submission(&catalog, "Newer", 1);
    archive.retain(&older).await.expect("retain");
    archive.retain(&newer).await.expect("retain");

    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let base = Url::parse(&format!("http://127.0.0.1:{port}/")).expect("url");
    let offline: Arc<dyn SubmissionRepository> =
        Arc::new(HttpRepository::new(base, 200).expect("client"));

    let history = recover_history(offline.as_ref(), Some(&archive)).await;
    assert_eq!(history.len(), 2);
    let entries = history.list_all();
    assert_eq!(entries[0].id(), older.id(), "oldest first");
    assert_eq!(entries[1].id(), newer.id());
}

#[tokio::test]
async fn recovered_history_prefers_repository() {
    let catalog = catalog();
    let repo = MemoryRepository::new();
    repo.append(&submission(&catalog, "Stored", 0))
        .await
        .expect("append");
    let history = recover_history(&repo, None).await;
    assert_eq!(history.len(), 1);
}
