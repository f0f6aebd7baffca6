use crate::hmi::{HmiAppId, HmiLevel};
use serde::{Deserialize, Serialize};

/// Bumped whenever the record layout changes. Records written under another
/// version are treated as structurally invalid and dropped on access.
pub const RESUMPTION_SCHEMA_VERSION: u32 = 1;

/// A record as it sits in the persisted document.
///
/// Everything that may be missing in a damaged or outdated document is
/// optional here, so such a record can be loaded and healed later instead of
/// failing the whole load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub schema_version: u32,
    pub mobile_app_id: String,
    pub device_id: String,
    pub hmi_app_id: Option<HmiAppId>,
    pub hmi_level: Option<HmiLevel>,
    pub hash_id: Option<String>,
    pub ign_off_count: u32,
    pub time_stamp: Option<u64>,
}

impl StoredRecord {
    pub fn matches(&self, mobile_app_id: &str, device_id: &str) -> bool {
        self.mobile_app_id == mobile_app_id && self.device_id == device_id
    }

    pub fn is_valid(&self) -> bool {
        self.validated().is_some()
    }

    /// The typed view of this record, if it is structurally complete.
    pub fn validated(&self) -> Option<ResumptionRecord> {
        if self.schema_version != RESUMPTION_SCHEMA_VERSION
            || self.mobile_app_id.is_empty()
            || self.device_id.is_empty()
        {
            return None;
        }
        Some(ResumptionRecord {
            mobile_app_id: self.mobile_app_id.clone(),
            device_id: self.device_id.clone(),
            hmi_app_id: self.hmi_app_id?,
            hmi_level: self.hmi_level?,
            hash_id: self.hash_id.clone()?,
            ign_off_count: self.ign_off_count,
            time_stamp: self.time_stamp?,
        })
    }
}

/// Durable projection of an application, keyed by
/// `(mobile_app_id, device_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumptionRecord {
    pub mobile_app_id: String,
    pub device_id: String,
    pub hmi_app_id: HmiAppId,
    pub hmi_level: HmiLevel,
    pub hash_id: String,
    /// Ignition cycles since the application last registered.
    pub ign_off_count: u32,
    /// When the record was last saved, seconds since the Unix epoch.
    pub time_stamp: u64,
}

impl From<ResumptionRecord> for StoredRecord {
    fn from(record: ResumptionRecord) -> Self {
        Self {
            schema_version: RESUMPTION_SCHEMA_VERSION,
            mobile_app_id: record.mobile_app_id,
            device_id: record.device_id,
            hmi_app_id: Some(record.hmi_app_id),
            hmi_level: Some(record.hmi_level),
            hash_id: Some(record.hash_id),
            ign_off_count: record.ign_off_count,
            time_stamp: Some(record.time_stamp),
        }
    }
}

/// Everything the store persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumptionSnapshot {
    pub last_ign_off_time: u64,
    pub last_awake_time: u64,
    pub records: Vec<StoredRecord>,
}
