use serde_json::json;
use std::fs;
use std::sync::Arc;
use tabkeep::api::TabkeepApi;
use tabkeep::config::StoreConfig;
use tabkeep::model::{PageDraft, PagePatch};
use tabkeep::store::fs_backend::FsBackend;
use tabkeep::store::page_store::{DeleteOutcome, PageStore};
use tempfile::TempDir;

async fn open(dir: &TempDir) -> PageStore<FsBackend> {
    PageStore::open(Arc::new(FsBackend::new(dir.path())), StoreConfig::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_pages_survive_reopening() {
    let dir = TempDir::new().unwrap();
    let saved = {
        let store = open(&dir).await;
        store
            .save(PageDraft::new("https://example.com/a", "A").tag("Rust"))
            .await
            .unwrap()
    };

    let store = open(&dir).await;
    let all = store.get_all().await.unwrap();
    assert_eq!(all, vec![saved]);
    assert_eq!(all[0].tags, vec!["rust"]);
}

#[tokio::test]
async fn test_delete_leaves_snapshot_file() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;
    let page = store
        .save(PageDraft::new("https://example.com/a", "A"))
        .await
        .unwrap();

    assert!(matches!(
        store.delete(&page.id).await.unwrap(),
        DeleteOutcome::Deleted(_)
    ));

    let snapshots: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("backup_"))
        .collect();
    assert_eq!(snapshots.len(), 1);

    let recovered = store.recover(None).await.unwrap();
    assert_eq!(recovered.recovered_page_count, 1);
    assert_eq!(store.get_all().await.unwrap()[0].id, page.id);
}

#[tokio::test]
async fn test_truncated_collection_file_recovers_from_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir).await;
    let a = store
        .save(PageDraft::new("https://example.com/a", "A"))
        .await
        .unwrap();
    let b = store
        .save(PageDraft::new("https://example.com/b", "B"))
        .await
        .unwrap();
    store
        .update(&a.id, PagePatch {
            summary: Some("kept".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    // Simulate a crash mid-write by an older, non-atomic writer.
    fs::write(dir.path().join("savedPages.json"), "[{\"id\": \"").unwrap();

    let all = store.get_all().await.unwrap();
    let ids: Vec<&str> = all.iter().map(|p| p.id.as_str()).collect();
    assert!(ids.contains(&a.id.as_str()));
    assert!(ids.contains(&b.id.as_str()));
}

#[tokio::test]
async fn test_legacy_extension_data_is_migrated() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("savedPages.json"),
        json!([
            {"id": "1", "url": "https://old.example/1", "title": "One", "timestamp": 1_600_000_000_000_i64},
            {"id": "2", "url": "https://old.example/2", "title": "Two", "timestamp": 1_700_000_000_000_i64, "tags": null}
        ])
        .to_string(),
    )
    .unwrap();

    let api = TabkeepApi::open(Arc::new(FsBackend::new(dir.path())), StoreConfig::default())
        .await
        .unwrap();
    let response = api.get_all().await;
    assert!(response.success);
    let pages = response.data.unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].id, "2");

    let meta: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("storageMetadata.json")).unwrap())
            .unwrap();
    assert_eq!(meta["schemaVersion"], 2);
}

#[tokio::test]
async fn test_export_file_imports_into_fresh_store() {
    let source_dir = TempDir::new().unwrap();
    let source = open(&source_dir).await;
    for i in 0..3 {
        source
            .save(PageDraft::new(format!("https://example.com/{}", i), format!("P{}", i)))
            .await
            .unwrap();
    }
    let export = source.export_all().await.unwrap();
    let text = serde_json::to_string_pretty(&export).unwrap();

    let target_dir = TempDir::new().unwrap();
    let target = open(&target_dir).await;
    let report = target
        .import_all(serde_json::from_str(&text).unwrap())
        .await
        .unwrap();
    assert_eq!(report.imported, 3);
    assert_eq!(target.get_all().await.unwrap(), export.pages);
}
