use std::sync::Arc;

use shared::{domain::FieldId, protocol::StoredSnapshot};
use storage::{KeyValueStore, MemoryStore, SnapshotPersistence, Storage};

fn sample_snapshot() -> StoredSnapshot {
    let mut snapshot = StoredSnapshot::default();
    for (field, value) in [
        (FieldId::NewLeads, "10"),
        (FieldId::LeadsToDeals, "4"),
        (FieldId::DealAmount, "1500.50"),
        (FieldId::Comments, "Неделя прошла спокойно"),
        (FieldId::PaidOrders, ""),
    ] {
        snapshot
            .fields
            .insert(field.as_str().to_string(), value.to_string());
    }
    snapshot.uploaded_file_names = vec!["receipt-1.pdf".into(), "photo.png".into()];
    snapshot
}

#[tokio::test]
async fn save_then_load_round_trips_every_value() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let persistence = SnapshotPersistence::new(Arc::new(storage));
    let snapshot = sample_snapshot();

    persistence.save(&snapshot).await.expect("save");
    let loaded = persistence.load().await.expect("snapshot present");

    assert_eq!(loaded, snapshot);
}

#[tokio::test]
async fn save_replaces_the_whole_document() {
    let persistence = SnapshotPersistence::new(Arc::new(MemoryStore::new()));
    persistence.save(&sample_snapshot()).await.expect("save");

    let mut smaller = StoredSnapshot::default();
    smaller
        .fields
        .insert(FieldId::ActiveChats.as_str().to_string(), "7".to_string());
    persistence.save(&smaller).await.expect("save");

    let loaded = persistence.load().await.expect("snapshot present");
    assert_eq!(loaded, smaller);
    assert!(loaded.value(FieldId::NewLeads).is_none());
}

#[tokio::test]
async fn malformed_snapshot_loads_as_nothing() {
    let store = Arc::new(MemoryStore::new());
    store
        .set("managerReportData", "{not json")
        .await
        .expect("seed");
    let persistence = SnapshotPersistence::new(store);

    assert!(persistence.load().await.is_none());
}

#[tokio::test]
async fn clear_removes_the_snapshot() {
    let persistence = SnapshotPersistence::new(Arc::new(MemoryStore::new()));
    persistence.save(&sample_snapshot()).await.expect("save");
    persistence.clear().await.expect("clear");

    assert!(persistence.load().await.is_none());
}

#[tokio::test]
async fn snapshots_survive_reopening_the_database() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("report.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    {
        let storage = Storage::new(&database_url).await.expect("db");
        SnapshotPersistence::new(Arc::new(storage))
            .save(&sample_snapshot())
            .await
            .expect("save");
    }

    let storage = Storage::new(&database_url).await.expect("reopen");
    let loaded = SnapshotPersistence::new(Arc::new(storage))
        .load()
        .await
        .expect("snapshot present");
    assert_eq!(loaded.uploaded_file_names, vec!["receipt-1.pdf", "photo.png"]);
}
