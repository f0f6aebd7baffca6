use super::{Arbitrator, ArbitratorInner, duration_ms};
use crate::{
    Error,
    app::Application,
    hmi::{AppId, HmiAppId, HmiLevel, HmiState, UnregisterReason},
    notifier::HmiMessage,
    timer::Timer,
};
use std::sync::{Arc, atomic::Ordering};
use tracing::{debug, info};

impl Arbitrator {
    /// Admit a freshly registered application.
    ///
    /// A known application gets its old HMI app id back. If its saved data
    /// qualifies, its old HMI level is restored once the resumption timeout
    /// elapses.
    pub fn register(&self, app: Application) -> Result<(), Error> {
        let inner = &self.0;
        let app_id = app.app_id();

        let resume_level = {
            let _transitions = inner.transitions.lock();
            if !inner.services.registry.insert(app.clone()) {
                return Err(Error::AlreadyRegistered(app_id));
            }

            let mobile_app_id = app.mobile_app_id();
            let device_id = app.device_id();
            let saved = inner
                .store
                .check_saved_application(&mobile_app_id, &device_id);
            if let Some(stored) = saved
                .then(|| inner.store.get_hash_id(&mobile_app_id, &device_id))
                .flatten()
            {
                app.seed_hash(&stored);
            }
            let hmi_app_id = saved
                .then(|| inner.store.get_hmi_application_id(&mobile_app_id, &device_id))
                .flatten()
                .unwrap_or_else(|| inner.allocate_hmi_app_id());
            app.set_hmi_app_id(hmi_app_id);

            let resume_level = if saved { inner.resumable_level(&app) } else { None };
            inner.store.save_application(&app, inner.now());
            info!(%app_id, %hmi_app_id, %mobile_app_id, ?resume_level, "registered");
            resume_level
        };

        // The timer is swapped in outside the transition lock: dropping a
        // replaced timer waits for its callback, which takes that lock.
        if let Some(level) = resume_level {
            let timer = inner.resume_timer(app_id, level);
            let replaced = inner.resume_timers.lock().insert(app_id, timer);
            drop(replaced);
        }
        Ok(())
    }

    /// Remove an application and update what is remembered about it.
    pub fn unregister(&self, app_id: AppId, reason: UnregisterReason) -> Result<(), Error> {
        let inner = &self.0;

        let app = {
            let _transitions = inner.transitions.lock();
            let app = inner
                .services
                .registry
                .remove(app_id)
                .ok_or(Error::AppNotFound(app_id))?;

            match reason {
                UnregisterReason::Explicit => {
                    inner
                        .store
                        .remove_application_from_saved(&app.mobile_app_id(), &app.device_id());
                }
                UnregisterReason::ConnectionLost | UnregisterReason::IgnitionOff => {
                    inner.store.save_application(&app, inner.now());
                }
            }
            app
        };

        let resume_timer = inner.resume_timers.lock().remove(&app_id);
        drop(resume_timer);
        inner.forget_tts_deadline(app_id);

        if let Some(hmi_app_id) = app.hmi_app_id() {
            for button in app.subscribed_buttons() {
                inner.services.notifier.send(HmiMessage::OnButtonSubscription {
                    hmi_app_id,
                    button,
                    subscribed: false,
                });
            }
            inner.services.notifier.send(HmiMessage::OnAppUnregistered {
                hmi_app_id,
                unexpected_disconnect: reason == UnregisterReason::ConnectionLost,
            });
        }
        info!(%app_id, ?reason, "unregistered");
        Ok(())
    }

    /// Unregister everything, as on ignition off. Returns how many
    /// applications were removed.
    pub fn unregister_all(&self, reason: UnregisterReason) -> usize {
        let apps = self.0.services.registry.applications();
        apps.iter()
            .filter(|app| self.unregister(app.app_id(), reason).is_ok())
            .count()
    }
}

impl ArbitratorInner {
    /// Smallest unused HMI app id, unknown both to the store and to
    /// registered applications.
    fn allocate_hmi_app_id(&self) -> HmiAppId {
        loop {
            let candidate = HmiAppId(self.next_hmi_app_id.fetch_add(1, Ordering::SeqCst));
            if candidate.0 == 0 || self.store.is_hmi_application_id_exist(candidate) {
                continue;
            }
            let in_use = self
                .services
                .registry
                .applications()
                .iter()
                .any(|app| app.hmi_app_id() == Some(candidate));
            if !in_use {
                return candidate;
            }
        }
    }

    /// The saved level to restore for `app`, if its saved data allows it.
    fn resumable_level(&self, app: &Application) -> Option<HmiLevel> {
        let record = self
            .store
            .get_saved_application(&app.mobile_app_id(), &app.device_id())?;
        let settings = self.resumption.read();
        let app_id = app.app_id();

        if record.hash_id.is_empty() || record.hash_id != app.hash_id() {
            debug!(%app_id, "hash mismatch, no resumption");
            return None;
        }
        if record.ign_off_count >= settings.max_ignition_cycles {
            debug!(%app_id, cycles = record.ign_off_count, "saved too many cycles ago");
            return None;
        }
        if record.ign_off_count > 0 {
            let since_awake = self.now().saturating_sub(self.store.get_ign_on_time());
            if since_awake > settings.resumption_window.as_secs() {
                debug!(%app_id, since_awake, "registered outside the resumption window");
                return None;
            }
        }
        (record.hmi_level != HmiLevel::None).then_some(record.hmi_level)
    }

    fn resume_timer(self: &Arc<Self>, app_id: AppId, level: HmiLevel) -> Timer {
        let weak = Arc::downgrade(self);
        let timer = Timer::new(
            "ResumeHmiLevel",
            move || {
                if let Some(inner) = weak.upgrade() {
                    inner.resume_hmi_level(app_id, level);
                }
            },
            false,
        );
        timer.start(duration_ms(self.resumption.read().resuming_timeout));
        timer
    }

    /// Put `app_id` back at its saved `level`, as far as the current HMI
    /// allows.
    fn resume_hmi_level(&self, app_id: AppId, level: HmiLevel) {
        let _transitions = self.transitions.lock();
        let Some(app) = self.services.registry.application(app_id) else {
            debug!(%app_id, "gone before its level could be resumed");
            return;
        };
        if app.hmi_level() != HmiLevel::None {
            debug!(%app_id, level = %app.hmi_level(), "already placed, not resuming");
            return;
        }

        let types = app.types();
        let target = match level {
            HmiLevel::None => return,
            HmiLevel::Full if self.services.registry.active_application().is_none() => {
                HmiLevel::Full
            }
            HmiLevel::Full | HmiLevel::Limited if types.is_audio() => HmiLevel::Limited,
            _ => HmiLevel::Background,
        };

        info!(%app_id, saved = %level, resumed = %target, "resuming HMI level");
        self.apply(&app, |_| HmiState::for_level(target, types));
        if target == HmiLevel::Full {
            self.arm_tts_deadline(app_id);
        }
        if types.is_audio() && matches!(target, HmiLevel::Full | HmiLevel::Limited) {
            self.services
                .notifier
                .send(HmiMessage::OnResumeAudioSource { app_id });
        }
    }
}
