#![forbid(unsafe_code)]

use kernel::resumption::ResumptionSnapshot;
use std::time::SystemTime;

/// Version of the persisted layout as a whole. A database written under
/// another version is ignored at load.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct StoresSnapshot {
    pub meta: SnapshotMeta,
    pub state: ResumptionSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotMeta {
    pub schema_version: u32,
    pub app_version: Option<String>,
    pub created_at: Option<SystemTime>,
}

impl Default for SnapshotMeta {
    fn default() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            app_version: None,
            created_at: None,
        }
    }
}

impl StoresSnapshot {
    /// Wrap the current store contents, stamped with this build's version.
    pub fn capture(state: ResumptionSnapshot) -> Self {
        Self {
            meta: SnapshotMeta {
                schema_version: SNAPSHOT_SCHEMA_VERSION,
                app_version: Some(env!("CARGO_PKG_VERSION").to_owned()),
                created_at: Some(SystemTime::now()),
            },
            state,
        }
    }

    pub fn empty() -> Self {
        Self {
            meta: SnapshotMeta::default(),
            state: ResumptionSnapshot::default(),
        }
    }
}
