use super::{ArbitratorInner, duration_ms};
use crate::{hmi::AppId, notifier::HmiMessage};
use tokio::time::Instant;
use tracing::{debug, info};

impl ArbitratorInner {
    /// Give `app_id` until the configured timeout to send its own TTS
    /// global properties.
    pub(super) fn arm_tts_deadline(&self, app_id: AppId) {
        let (timeout, interval) = {
            let hmi = self.hmi.read();
            (hmi.tts_global_properties_timeout, hmi.tts_check_interval)
        };
        // Insert and restart under the list lock; a check that found the
        // list empty suspends under it too, so the restart always wins.
        let mut deadlines = self.tts_deadlines.lock();
        deadlines.insert(app_id, Instant::now() + timeout);
        self.tts_timer.start(duration_ms(interval));
    }

    pub(super) fn forget_tts_deadline(&self, app_id: AppId) {
        if self.tts_deadlines.lock().remove(&app_id).is_some() {
            debug!(%app_id, "TTS global properties deadline dropped");
        }
    }

    /// Runs on every tick of the TTS timer.
    pub(super) fn check_tts_deadlines(&self) {
        let now = Instant::now();
        let expired = {
            let mut deadlines = self.tts_deadlines.lock();
            let expired: Vec<AppId> = deadlines
                .iter()
                .filter(|(_, deadline)| **deadline <= now)
                .map(|(app_id, _)| *app_id)
                .collect();
            for app_id in &expired {
                deadlines.remove(app_id);
            }
            if deadlines.is_empty() {
                self.tts_timer.suspend();
            }
            expired
        };

        for app_id in expired {
            if self.services.registry.application(app_id).is_some() {
                info!(%app_id, "sending default TTS global properties");
                self.services
                    .notifier
                    .send(HmiMessage::TtsGlobalProperties { app_id });
            }
        }
    }
}
