use super::{ResumptionRecord, ResumptionSnapshot, StoredRecord};
use crate::hmi::{HmiAppId, HmiLevel};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub(crate) struct ResumptionData {
    records: Vec<StoredRecord>,

    last_ign_off_time: u64,

    last_awake_time: u64,

    /// Changes on every mutation so persisters can tell when to write.
    revision: u64,
}

impl ResumptionData {
    pub(crate) fn from_snapshot(snapshot: ResumptionSnapshot) -> Self {
        Self {
            records: snapshot.records,
            last_ign_off_time: snapshot.last_ign_off_time,
            last_awake_time: snapshot.last_awake_time,
            revision: 0,
        }
    }

    pub(crate) fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    pub(crate) fn snapshot(&self) -> ResumptionSnapshot {
        ResumptionSnapshot {
            last_ign_off_time: self.last_ign_off_time,
            last_awake_time: self.last_awake_time,
            records: self.records.clone(),
        }
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Linear search on exact key equality.
    pub(crate) fn object_index(&self, mobile_app_id: &str, device_id: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.matches(mobile_app_id, device_id))
    }

    fn valid(&self, mobile_app_id: &str, device_id: &str) -> Option<ResumptionRecord> {
        let index = self.object_index(mobile_app_id, device_id)?;
        self.records[index].validated()
    }

    pub(crate) fn save(&mut self, record: ResumptionRecord) {
        let stored = StoredRecord::from(record);
        match self.object_index(&stored.mobile_app_id, &stored.device_id) {
            Some(index) => self.records[index] = stored,
            None => self.records.push(stored),
        }
        self.touch();
    }

    pub(crate) fn check(&mut self, mobile_app_id: &str, device_id: &str) -> bool {
        let Some(index) = self.object_index(mobile_app_id, device_id) else {
            return false;
        };
        if self.records[index].is_valid() {
            return true;
        }
        warn!(
            mobile_app_id,
            device_id, "resumption record is invalid, removing it"
        );
        self.records.remove(index);
        self.touch();
        false
    }

    pub(crate) fn get(&self, mobile_app_id: &str, device_id: &str) -> Option<ResumptionRecord> {
        self.valid(mobile_app_id, device_id)
    }

    pub(crate) fn hmi_app_id_exists(&self, hmi_app_id: HmiAppId) -> bool {
        self.records
            .iter()
            .any(|record| record.hmi_app_id == Some(hmi_app_id))
    }

    pub(crate) fn remove(&mut self, mobile_app_id: &str, device_id: &str) -> bool {
        let Some(index) = self.object_index(mobile_app_id, device_id) else {
            return false;
        };
        self.records.remove(index);
        self.touch();
        true
    }

    pub(crate) fn on_suspend(&mut self, now: u64) {
        for record in &mut self.records {
            record.ign_off_count = record.ign_off_count.saturating_add(1);
        }
        self.last_ign_off_time = now;
        self.touch();
        debug!(records = self.records.len(), now, "ignition off recorded");
    }

    pub(crate) fn on_awake(&mut self, now: u64) {
        self.last_awake_time = now;
        self.touch();
        debug!(records = self.records.len(), now, "ignition on recorded");
    }

    pub(crate) fn update_hmi_level(&mut self, mobile_app_id: &str, device_id: &str, level: HmiLevel) {
        let Some(index) = self.object_index(mobile_app_id, device_id) else {
            debug!(mobile_app_id, device_id, "no saved application, level not stored");
            return;
        };
        let record = &mut self.records[index];
        if record.hmi_level != Some(level) {
            record.hmi_level = Some(level);
            self.touch();
        }
    }

    pub(crate) fn last_ign_off_time(&self) -> u64 {
        self.last_ign_off_time
    }

    pub(crate) fn last_awake_time(&self) -> u64 {
        self.last_awake_time
    }

    pub(crate) fn prune(&mut self, max_ignition_cycles: u32) -> usize {
        let before = self.records.len();
        self.records.retain(|record| {
            let keep = record.is_valid() && record.ign_off_count < max_ignition_cycles;
            if !keep {
                debug!(
                    mobile_app_id = %record.mobile_app_id,
                    device_id = %record.device_id,
                    ign_off_count = record.ign_off_count,
                    "dropping resumption record"
                );
            }
            keep
        });
        let removed = before - self.records.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }
}
