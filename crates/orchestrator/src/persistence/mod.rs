#![forbid(unsafe_code)]

mod repo;
mod snapshot;
mod worker;

pub use repo::{NoopRepository, SqliteRepository, StateRepository};
pub use snapshot::{SNAPSHOT_SCHEMA_VERSION, SnapshotMeta, StoresSnapshot};
pub use worker::Persister;
