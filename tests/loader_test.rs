//! End-to-end loader tests against a real SQLite database.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use telepulse::loader::{self, LoadOutcome};
use telepulse::repository::{run_migrations, AsyncSqlitePool, MessageRepository};

async fn setup_repo(dir: &TempDir) -> MessageRepository {
    let db_path = dir.path().join("test.db");
    let url = db_path.display().to_string();
    run_migrations(&url).await.unwrap();
    MessageRepository::new(AsyncSqlitePool::new(&url))
}

fn write_batch(dir: &Path, day: &str, channel: &str, body: &str) {
    let day_dir = dir.join(day);
    fs::create_dir_all(&day_dir).unwrap();
    fs::write(day_dir.join(format!("{}.json", channel)), body).unwrap();
}

#[tokio::test]
async fn loading_twice_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let repo = setup_repo(&dir).await;
    let json_dir = dir.path().join("messages");

    write_batch(
        &json_dir,
        "2024-05-05",
        "acme",
        r#"[
            {"message_id": 1, "channel_name": "acme", "message_text": "hello",
             "message_date": "2024-05-05T10:00:00+00:00", "views": 5},
            {"message_id": 2, "channel_name": "acme", "has_media": true,
             "image_path": "data/raw/images/acme/2.jpg"}
        ]"#,
    );

    let first = loader::load(&json_dir, &repo).await.unwrap();
    assert_eq!(first, LoadOutcome::Loaded(2));
    let rows_first = repo.get_all().await.unwrap();

    let second = loader::load(&json_dir, &repo).await.unwrap();
    assert_eq!(second, LoadOutcome::Loaded(2));
    let rows_second = repo.get_all().await.unwrap();

    assert_eq!(rows_first, rows_second);
}

#[tokio::test]
async fn duplicate_across_files_keeps_first_discovered() {
    let dir = TempDir::new().unwrap();
    let repo = setup_repo(&dir).await;
    let json_dir = dir.path().join("messages");

    // Discovery is sorted by path, so 2024-05-05 is read before 2024-05-06.
    write_batch(
        &json_dir,
        "2024-05-05",
        "acme",
        r#"[{"message_id": 1, "channel_name": "acme", "message_text": "first"}]"#,
    );
    write_batch(
        &json_dir,
        "2024-05-06",
        "acme",
        r#"[{"message_id": 1, "channel_name": "acme", "message_text": "second"}]"#,
    );

    let outcome = loader::load(&json_dir, &repo).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded(1));

    let rows = repo.get_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message_text.as_deref(), Some("first"));
}

#[tokio::test]
async fn unparsable_date_loads_as_null() {
    let dir = TempDir::new().unwrap();
    let repo = setup_repo(&dir).await;
    let json_dir = dir.path().join("messages");

    write_batch(
        &json_dir,
        "2024-05-05",
        "acme",
        r#"[{"message_id": 1, "channel_name": "acme", "message_date": "not-a-date"}]"#,
    );

    let outcome = loader::load(&json_dir, &repo).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded(1));

    let rows = repo.get_all().await.unwrap();
    assert_eq!(rows[0].message_date, None);
}

#[tokio::test]
async fn empty_directory_is_noop_and_preserves_table() {
    let dir = TempDir::new().unwrap();
    let repo = setup_repo(&dir).await;
    let json_dir = dir.path().join("messages");

    write_batch(
        &json_dir,
        "2024-05-05",
        "acme",
        r#"[{"message_id": 1, "channel_name": "acme"}]"#,
    );
    loader::load(&json_dir, &repo).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 1);

    // A directory with no JSON files must not touch the database.
    let empty = dir.path().join("empty");
    fs::create_dir_all(&empty).unwrap();
    let outcome = loader::load(&empty, &repo).await.unwrap();
    assert_eq!(outcome, LoadOutcome::NoFiles);
    assert_eq!(repo.count().await.unwrap(), 1);

    // Same for a directory that does not exist at all.
    let outcome = loader::load(&dir.path().join("nonexistent"), &repo)
        .await
        .unwrap();
    assert_eq!(outcome, LoadOutcome::NoFiles);
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn each_load_is_a_full_replace() {
    let dir = TempDir::new().unwrap();
    let repo = setup_repo(&dir).await;

    let first_dir = dir.path().join("run1");
    write_batch(
        &first_dir,
        "2024-05-05",
        "acme",
        r#"[
            {"message_id": 1, "channel_name": "acme"},
            {"message_id": 2, "channel_name": "acme"},
            {"message_id": 3, "channel_name": "acme"}
        ]"#,
    );
    loader::load(&first_dir, &repo).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 3);

    // Second run sees fewer messages; rows absent from the current
    // files are dropped, not merged.
    let second_dir = dir.path().join("run2");
    write_batch(
        &second_dir,
        "2024-05-06",
        "acme",
        r#"[{"message_id": 9, "channel_name": "acme"}]"#,
    );
    loader::load(&second_dir, &repo).await.unwrap();

    let rows = repo.get_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message_id, 9);
}
