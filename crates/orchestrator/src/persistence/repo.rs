#![forbid(unsafe_code)]

use crate::error::Error;
use crate::persistence::{SnapshotMeta, StoresSnapshot};
use async_trait::async_trait;
use kernel::hmi::{HmiAppId, HmiLevel};
use kernel::resumption::{ResumptionSnapshot, StoredRecord};
use sqlx::Row;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Load a snapshot from persistence.
    async fn load(&self) -> Result<StoresSnapshot, Error>;
    /// Persist a snapshot.
    async fn save(&self, snapshot: &StoresSnapshot) -> Result<(), Error>;
}

/// Keeps nothing. Used when no state path is configured.
#[derive(Debug, Default)]
pub struct NoopRepository;

#[async_trait]
impl StateRepository for NoopRepository {
    async fn load(&self) -> Result<StoresSnapshot, Error> {
        Ok(StoresSnapshot::empty())
    }

    async fn save(&self, _snapshot: &StoresSnapshot) -> Result<(), Error> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SqliteRepository {
    path: PathBuf,
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Create a repository backed by a SQLite database file.
    pub async fn new(path: PathBuf) -> Result<Self, Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;

        Ok(Self { path, pool })
    }

    /// Replace everything in one transaction. A failure leaves the
    /// previous snapshot untouched.
    async fn save_snapshot(&self, snapshot: &StoresSnapshot) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM state").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM applications")
            .execute(&mut *tx)
            .await?;

        let meta = &snapshot.meta;
        let created_at = meta
            .created_at
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_secs().to_string());

        sqlx::query(
            "INSERT INTO state (id, schema_version, app_version, created_at, last_ign_off_time, last_awake_time) \
             VALUES (1, ?, ?, ?, ?, ?)",
        )
        .bind(i64::from(meta.schema_version))
        .bind(meta.app_version.as_deref())
        .bind(created_at.as_deref())
        .bind(to_db(snapshot.state.last_ign_off_time))
        .bind(to_db(snapshot.state.last_awake_time))
        .execute(&mut *tx)
        .await?;

        for (position, record) in snapshot.state.records.iter().enumerate() {
            sqlx::query(
                "INSERT INTO applications \
                 (mobile_app_id, device_id, schema_version, hmi_app_id, hmi_level, hash_id, ign_off_count, time_stamp, position) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(record.mobile_app_id.as_str())
            .bind(record.device_id.as_str())
            .bind(i64::from(record.schema_version))
            .bind(record.hmi_app_id.map(|id| i64::from(id.0)))
            .bind(record.hmi_level.map(|level| level.as_str()))
            .bind(record.hash_id.as_deref())
            .bind(i64::from(record.ign_off_count))
            .bind(record.time_stamp.map(to_db))
            .bind(to_db(position as u64))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(
            path = %self.path.display(),
            records = snapshot.state.records.len(),
            "snapshot persisted"
        );
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<StoresSnapshot, Error> {
        let mut meta = SnapshotMeta::default();
        let mut state = ResumptionSnapshot::default();

        let row = sqlx::query(
            "SELECT schema_version, app_version, created_at, last_ign_off_time, last_awake_time \
             FROM state WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            let schema_version: i64 = row.try_get("schema_version")?;
            let app_version: Option<String> = row.try_get("app_version")?;
            let created_at: Option<String> = row.try_get("created_at")?;
            let last_ign_off_time: i64 = row.try_get("last_ign_off_time")?;
            let last_awake_time: i64 = row.try_get("last_awake_time")?;

            meta.schema_version = from_db("schema_version", schema_version)?;
            meta.app_version = app_version;
            meta.created_at = created_at
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs));
            state.last_ign_off_time = from_db("last_ign_off_time", last_ign_off_time)?;
            state.last_awake_time = from_db("last_awake_time", last_awake_time)?;
        }

        let rows = sqlx::query(
            "SELECT mobile_app_id, device_id, schema_version, hmi_app_id, hmi_level, hash_id, ign_off_count, time_stamp \
             FROM applications ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            let mobile_app_id: String = row.try_get("mobile_app_id")?;
            let device_id: String = row.try_get("device_id")?;
            let schema_version: i64 = row.try_get("schema_version")?;
            let hmi_app_id: Option<i64> = row.try_get("hmi_app_id")?;
            let hmi_level: Option<String> = row.try_get("hmi_level")?;
            let hash_id: Option<String> = row.try_get("hash_id")?;
            let ign_off_count: i64 = row.try_get("ign_off_count")?;
            let time_stamp: Option<i64> = row.try_get("time_stamp")?;

            // Values that do not fit leave the field empty; the store drops
            // such records as invalid on first access.
            let hmi_level = hmi_level.and_then(|level| match level.parse::<HmiLevel>() {
                Ok(level) => Some(level),
                Err(err) => {
                    warn!(%mobile_app_id, %err, "unreadable stored HMI level");
                    None
                }
            });
            state.records.push(StoredRecord {
                schema_version: u32::try_from(schema_version).unwrap_or_default(),
                hmi_app_id: hmi_app_id
                    .and_then(|id| u32::try_from(id).ok())
                    .map(HmiAppId),
                hmi_level,
                hash_id,
                ign_off_count: u32::try_from(ign_off_count.max(0)).unwrap_or(u32::MAX),
                time_stamp: time_stamp.and_then(|t| u64::try_from(t).ok()),
                mobile_app_id,
                device_id,
            });
        }

        Ok(StoresSnapshot { meta, state })
    }
}

#[async_trait]
impl StateRepository for SqliteRepository {
    async fn load(&self) -> Result<StoresSnapshot, Error> {
        self.load_snapshot().await
    }

    async fn save(&self, snapshot: &StoresSnapshot) -> Result<(), Error> {
        self.save_snapshot(snapshot).await
    }
}

/// SQLite integers are signed; times past `i64::MAX` are clamped.
fn to_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db<T: TryFrom<i64>>(column: &'static str, value: i64) -> Result<T, Error> {
    T::try_from(value).map_err(|_| Error::OutOfRange { column, value })
}
