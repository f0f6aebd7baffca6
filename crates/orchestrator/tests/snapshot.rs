#![forbid(unsafe_code)]

use kernel::hmi::{HmiAppId, HmiLevel};
use kernel::resumption::{RESUMPTION_SCHEMA_VERSION, ResumptionSnapshot, StoredRecord};
use orchestrator::StateRepository;
use orchestrator::persistence::{
    SNAPSHOT_SCHEMA_VERSION, SnapshotMeta, SqliteRepository, StoresSnapshot,
};
use pretty_assertions::assert_eq;
use sqlx::SqlitePool;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn record(mobile_app_id: &str, level: Option<HmiLevel>, ign_off_count: u32) -> StoredRecord {
    StoredRecord {
        schema_version: RESUMPTION_SCHEMA_VERSION,
        mobile_app_id: mobile_app_id.into(),
        device_id: "dev-1".into(),
        hmi_app_id: Some(HmiAppId(17)),
        hmi_level: level,
        hash_id: Some("00000011".into()),
        ign_off_count,
        time_stamp: Some(1_700_000_000),
    }
}

fn snapshot() -> StoresSnapshot {
    StoresSnapshot {
        meta: SnapshotMeta {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            app_version: Some("test".into()),
            created_at: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_100)),
        },
        state: ResumptionSnapshot {
            last_ign_off_time: 1_700_000_050,
            last_awake_time: 1_700_000_060,
            records: vec![
                record("com.example.radio", Some(HmiLevel::Full), 0),
                record("com.example.nav", Some(HmiLevel::Limited), 2),
                record("com.example.broken", None, 1),
            ],
        },
    }
}

#[tokio::test]
async fn sqlite_roundtrip_snapshot() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("state.db");

    let repo = SqliteRepository::new(db_path).await.unwrap();
    repo.save(&snapshot()).await.unwrap();
    let loaded = repo.load().await.unwrap();

    assert_eq!(loaded, snapshot());
}

#[tokio::test]
async fn empty_database_loads_as_empty_snapshot() {
    let dir = tempdir().unwrap();
    let repo = SqliteRepository::new(dir.path().join("nested/state.db"))
        .await
        .unwrap();

    let loaded = repo.load().await.unwrap();
    assert_eq!(loaded.meta.schema_version, SNAPSHOT_SCHEMA_VERSION);
    assert_eq!(loaded.state, ResumptionSnapshot::default());
}

#[tokio::test]
async fn later_save_replaces_earlier_one() {
    let dir = tempdir().unwrap();
    let repo = SqliteRepository::new(dir.path().join("state.db"))
        .await
        .unwrap();

    repo.save(&snapshot()).await.unwrap();
    let mut smaller = snapshot();
    smaller.state.records.truncate(1);
    repo.save(&smaller).await.unwrap();

    let loaded = repo.load().await.unwrap();
    assert_eq!(loaded.state.records.len(), 1);
    assert_eq!(loaded.state.records[0].mobile_app_id, "com.example.radio");
}

#[tokio::test]
async fn unknown_level_string_loads_as_missing() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("state.db");
    let repo = SqliteRepository::new(db_path.clone()).await.unwrap();
    repo.save(&snapshot()).await.unwrap();

    let pool = SqlitePool::connect(&format!("sqlite://{}", db_path.display()))
        .await
        .unwrap();
    sqlx::query("UPDATE applications SET hmi_level = 'HALF' WHERE mobile_app_id = ?")
        .bind("com.example.radio")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let loaded = repo.load().await.unwrap();
    let radio = &loaded.state.records[0];
    assert_eq!(radio.mobile_app_id, "com.example.radio");
    assert_eq!(radio.hmi_level, None);
    assert!(!radio.is_valid());
}
