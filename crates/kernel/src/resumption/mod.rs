mod inner;
mod record;

pub use record::{RESUMPTION_SCHEMA_VERSION, ResumptionRecord, ResumptionSnapshot, StoredRecord};

use crate::{
    app::Application,
    hmi::{HmiAppId, HmiLevel},
};
use inner::ResumptionData;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Durable per-application state, keyed by `(mobile_app_id, device_id)`.
///
/// Writers are serialized, readers run concurrently. The store itself only
/// holds memory; persisting [`snapshot`](ResumptionStore::snapshot)s whenever
/// [`revision`](ResumptionStore::revision) moves is up to the owner.
#[derive(Debug, Clone, Default)]
pub struct ResumptionStore(Arc<RwLock<ResumptionData>>);

impl ResumptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: ResumptionSnapshot) -> Self {
        Self(Arc::new(RwLock::new(ResumptionData::from_snapshot(snapshot))))
    }

    pub fn snapshot(&self) -> ResumptionSnapshot {
        self.0.read().snapshot()
    }

    /// Replace the whole content, e.g. after loading from disk.
    pub fn restore(&self, snapshot: ResumptionSnapshot) {
        let mut data = self.0.write();
        // keep moving forward so persisters notice
        let revision = data.revision().wrapping_add(1);
        *data = ResumptionData::from_snapshot(snapshot).with_revision(revision);
    }

    pub fn revision(&self) -> u64 {
        self.0.read().revision()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or overwrite the record of `app` with its current durable
    /// fields. The ignition-off counter starts over.
    pub fn save_application(&self, app: &Application, now: u64) {
        let Some(hmi_app_id) = app.hmi_app_id() else {
            warn!(app_id = %app.app_id(), "application has no HMI app id, not saved");
            return;
        };
        let record = ResumptionRecord {
            mobile_app_id: app.mobile_app_id(),
            device_id: app.device_id(),
            hmi_app_id,
            hmi_level: app.hmi_level(),
            hash_id: app.hash_id(),
            ign_off_count: 0,
            time_stamp: now,
        };
        debug!(?record, "saving application");
        self.0.write().save(record);
    }

    /// `true` if a structurally valid record exists. An invalid record is
    /// removed on the way.
    pub fn check_saved_application(&self, mobile_app_id: &str, device_id: &str) -> bool {
        self.0.write().check(mobile_app_id, device_id)
    }

    pub fn get_saved_application(
        &self,
        mobile_app_id: &str,
        device_id: &str,
    ) -> Option<ResumptionRecord> {
        self.0.read().get(mobile_app_id, device_id)
    }

    /// `None` means there is no usable record and the default level applies.
    pub fn get_stored_hmi_level(&self, mobile_app_id: &str, device_id: &str) -> Option<HmiLevel> {
        self.get_saved_application(mobile_app_id, device_id)
            .map(|record| record.hmi_level)
    }

    pub fn is_hmi_application_id_exist(&self, hmi_app_id: HmiAppId) -> bool {
        self.0.read().hmi_app_id_exists(hmi_app_id)
    }

    pub fn get_hmi_application_id(&self, mobile_app_id: &str, device_id: &str) -> Option<HmiAppId> {
        self.get_saved_application(mobile_app_id, device_id)
            .map(|record| record.hmi_app_id)
    }

    pub fn get_hash_id(&self, mobile_app_id: &str, device_id: &str) -> Option<String> {
        self.get_saved_application(mobile_app_id, device_id)
            .map(|record| record.hash_id)
    }

    /// Position of the record in the collection, if saved.
    pub fn is_application_saved(&self, mobile_app_id: &str, device_id: &str) -> Option<usize> {
        self.0.read().object_index(mobile_app_id, device_id)
    }

    pub fn remove_application_from_saved(&self, mobile_app_id: &str, device_id: &str) -> bool {
        self.0.write().remove(mobile_app_id, device_id)
    }

    /// Ignition off: every saved application ages by one cycle.
    pub fn on_suspend(&self, now: u64) {
        self.0.write().on_suspend(now);
    }

    /// Ignition on. Counters are left alone.
    pub fn on_awake(&self, now: u64) {
        self.0.write().on_awake(now);
    }

    /// Store `level` for an existing record. Unknown keys are ignored;
    /// records are only created by [`save_application`](Self::save_application).
    pub fn update_hmi_level(&self, mobile_app_id: &str, device_id: &str, level: HmiLevel) {
        self.0.write().update_hmi_level(mobile_app_id, device_id, level);
    }

    pub fn get_ign_off_time(&self) -> u64 {
        self.0.read().last_ign_off_time()
    }

    pub fn get_ign_on_time(&self) -> u64 {
        self.0.read().last_awake_time()
    }

    /// Drop invalid records and those that outlived `max_ignition_cycles`.
    /// Returns how many were dropped.
    pub fn load_resume_data(&self, max_ignition_cycles: u32) -> usize {
        self.0.write().prune(max_ignition_cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmi::{AppHmiTypes, AppId, HmiState};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn app(app_id: u32, mobile_app_id: &str, hmi_app_id: u32) -> Application {
        let app = Application::new(AppId(app_id), mobile_app_id, "dev-1")
            .with_types(AppHmiTypes::MEDIA)
            .with_hash_id("hash-1");
        app.set_hmi_app_id(HmiAppId(hmi_app_id));
        app
    }

    fn invalid_record(mobile_app_id: &str) -> StoredRecord {
        StoredRecord {
            schema_version: RESUMPTION_SCHEMA_VERSION,
            mobile_app_id: mobile_app_id.into(),
            device_id: "dev-1".into(),
            hmi_app_id: Some(HmiAppId(9)),
            hmi_level: None,
            hash_id: Some("h".into()),
            ign_off_count: 0,
            time_stamp: Some(1),
        }
    }

    #[test]
    fn save_then_get_returns_durable_fields() {
        let store = ResumptionStore::new();
        let radio = app(1, "radio", 100);
        radio.transition(|_| HmiState::for_level(HmiLevel::Limited, AppHmiTypes::MEDIA));

        store.save_application(&radio, 42);
        assert_eq!(
            store.get_saved_application("radio", "dev-1"),
            Some(ResumptionRecord {
                mobile_app_id: "radio".into(),
                device_id: "dev-1".into(),
                hmi_app_id: HmiAppId(100),
                hmi_level: HmiLevel::Limited,
                hash_id: "hash-1".into(),
                ign_off_count: 0,
                time_stamp: 42,
            })
        );
        assert_eq!(store.get_hash_id("radio", "dev-1").as_deref(), Some("hash-1"));
        assert_eq!(store.get_hmi_application_id("radio", "dev-1"), Some(HmiAppId(100)));
        assert!(store.is_hmi_application_id_exist(HmiAppId(100)));
        assert!(!store.is_hmi_application_id_exist(HmiAppId(101)));
    }

    #[test]
    fn save_overwrites_only_its_own_record() {
        let store = ResumptionStore::new();
        store.save_application(&app(1, "radio", 100), 1);
        store.save_application(&app(2, "nav", 101), 1);
        store.save_application(&app(3, "radio", 100), 2);

        assert_eq!(store.len(), 2);
        assert_eq!(store.is_application_saved("radio", "dev-1"), Some(0));
        assert_eq!(store.is_application_saved("nav", "dev-1"), Some(1));
        assert_eq!(store.get_saved_application("radio", "dev-1").unwrap().time_stamp, 2);
    }

    #[test]
    fn unknown_key_has_no_level() {
        let store = ResumptionStore::new();
        assert_eq!(store.get_stored_hmi_level("radio", "dev-1"), None);
        assert_eq!(store.is_application_saved("radio", "dev-1"), None);
        assert_eq!(store.get_hash_id("radio", "dev-1"), None);
    }

    #[test]
    fn keys_match_exactly() {
        let store = ResumptionStore::new();
        store.save_application(&app(1, "radio", 100), 1);
        assert!(store.get_saved_application("radio", "dev-2").is_none());
        assert!(store.get_saved_application("Radio", "dev-1").is_none());
    }

    #[test]
    fn check_removes_invalid_record() {
        let store = ResumptionStore::from_snapshot(ResumptionSnapshot {
            records: vec![invalid_record("broken")],
            ..Default::default()
        });
        store.save_application(&app(1, "radio", 100), 1);
        assert_eq!(store.len(), 2);

        assert_eq!(store.get_stored_hmi_level("broken", "dev-1"), None);
        assert!(!store.check_saved_application("broken", "dev-1"));
        assert_eq!(store.len(), 1);
        assert!(store.check_saved_application("radio", "dev-1"));
        assert_eq!(store.len(), 1);
        assert!(!store.check_saved_application("missing", "dev-1"));
    }

    #[test]
    fn remove_unknown_key_leaves_store_alone() {
        let store = ResumptionStore::new();
        store.save_application(&app(1, "radio", 100), 1);
        let revision = store.revision();

        assert!(!store.remove_application_from_saved("nav", "dev-1"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.revision(), revision);

        assert!(store.remove_application_from_saved("radio", "dev-1"));
        assert!(store.is_empty());
    }

    #[test]
    fn update_hmi_level_never_creates_records() {
        let store = ResumptionStore::new();
        store.update_hmi_level("radio", "dev-1", HmiLevel::Full);
        assert!(store.is_empty());

        store.save_application(&app(1, "radio", 100), 1);
        store.update_hmi_level("radio", "dev-1", HmiLevel::Full);
        assert_eq!(store.get_stored_hmi_level("radio", "dev-1"), Some(HmiLevel::Full));
    }

    #[test]
    fn suspend_records_ignition_off_time() {
        let store = ResumptionStore::new();
        store.on_suspend(1000);
        store.on_awake(1060);
        assert_eq!(store.get_ign_off_time(), 1000);
        assert_eq!(store.get_ign_on_time(), 1060);
    }

    #[test]
    fn saving_again_resets_the_counter() {
        let store = ResumptionStore::new();
        let radio = app(1, "radio", 100);
        store.save_application(&radio, 1);
        store.on_suspend(2);
        store.on_suspend(3);
        assert_eq!(store.get_saved_application("radio", "dev-1").unwrap().ign_off_count, 2);

        store.save_application(&radio, 4);
        assert_eq!(store.get_saved_application("radio", "dev-1").unwrap().ign_off_count, 0);
    }

    #[test]
    fn load_resume_data_prunes_old_and_invalid() {
        let store = ResumptionStore::from_snapshot(ResumptionSnapshot {
            records: vec![invalid_record("broken")],
            ..Default::default()
        });
        store.save_application(&app(1, "old", 100), 1);
        store.on_suspend(2);
        store.on_suspend(3);
        store.save_application(&app(2, "fresh", 101), 4);
        store.on_suspend(5);

        assert_eq!(store.load_resume_data(3), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get_saved_application("fresh", "dev-1").is_some());
    }

    #[test]
    fn restore_moves_revision_forward() {
        let store = ResumptionStore::new();
        store.save_application(&app(1, "radio", 100), 1);
        let before = store.revision();

        store.restore(ResumptionSnapshot::default());
        assert!(store.revision() > before);
        assert!(store.is_empty());
    }

    proptest! {
        #[test]
        fn ignition_cycles_count_monotonically(cycles in 0u32..50, apps in 1u32..5) {
            let store = ResumptionStore::new();
            for i in 0..apps {
                store.save_application(&app(i, &format!("app-{i}"), 100 + i), 0);
            }

            let mut previous = 0;
            for cycle in 0..cycles {
                store.on_suspend(u64::from(cycle) * 2);
                store.on_awake(u64::from(cycle) * 2 + 1);
                for i in 0..apps {
                    let count = store
                        .get_saved_application(&format!("app-{i}"), "dev-1")
                        .unwrap()
                        .ign_off_count;
                    prop_assert_eq!(count, cycle + 1);
                    prop_assert!(count >= previous);
                    previous = count;
                }
            }
        }
    }
}
