use super::{Arbitrator, ArbitratorInner};
use crate::{
    Error,
    app::Application,
    hmi::{AppHmiTypes, AppId, DeactivateReason, HmiLevel, HmiState},
};
use std::sync::atomic::Ordering;
use tracing::{debug, trace};

impl Arbitrator {
    /// Take the HMI away from an application.
    ///
    /// An AUDIO or PHONECALL event naming an application in LIMITED is
    /// meant for the one in FULL; if that is not the named application the
    /// event is stale and [`Error::StaleEvent`] is returned.
    pub fn deactivate(&self, app_id: AppId, reason: DeactivateReason) -> Result<(), Error> {
        let inner = &self.0;
        let _transitions = inner.transitions.lock();

        let mut app = inner.lookup(app_id)?;
        if matches!(reason, DeactivateReason::Audio | DeactivateReason::PhoneCall)
            && app.hmi_level() == HmiLevel::Limited
        {
            app = inner
                .services
                .registry
                .active_application()
                .ok_or(Error::NoActiveApp)?;
            if app.app_id() != app_id {
                return Err(Error::StaleEvent {
                    requested: app_id,
                    active: app.app_id(),
                });
            }
        }

        let level = app.hmi_level();
        if level == HmiLevel::None {
            debug!(%app_id, "not on the HMI, nothing to deactivate");
            return Ok(());
        }

        let types = app.types();
        if reason == DeactivateReason::Audio && app.is_media_application() && !app.is_navi() {
            let attenuate = inner.hmi.read().mixing_audio_supported
                && (inner.vr_session_started.load(Ordering::SeqCst) || app.tts_speak_state());
            if !attenuate {
                // LIMITED would be the candidate here, but media apps losing
                // audio always end up in BACKGROUND.
                trace!(%app_id, candidate = %HmiLevel::Limited, "candidate level not applied");
            }
            inner.apply(&app, |_| {
                let background = HmiState::for_level(HmiLevel::Background, types);
                if attenuate {
                    background.attenuated()
                } else {
                    background
                }
            });
            inner.forget_tts_deadline(app.app_id());
            return Ok(());
        }

        let target = inner.deactivated_level(&app, reason).min(level);
        if target != level {
            inner.apply(&app, |_| HmiState::for_level(target, types));
            inner.forget_tts_deadline(app.app_id());
        }
        Ok(())
    }

    /// Another audio source became active or inactive. Becoming active
    /// silences media applications holding the speaker.
    pub fn audio_source_changed(&self, active: bool) {
        if !active {
            debug!("audio source released");
            return;
        }

        let inner = &self.0;
        let _transitions = inner.transitions.lock();
        for app in inner.services.registry.applications() {
            if app.is_media_application()
                && !app.is_navi()
                && matches!(app.hmi_level(), HmiLevel::Full | HmiLevel::Limited)
            {
                let types = app.types();
                inner.apply(&app, |_| HmiState::for_level(HmiLevel::Background, types));
                inner.forget_tts_deadline(app.app_id());
            }
        }
    }
}

impl ArbitratorInner {
    /// Level an application falls to when deactivated for `reason`.
    fn deactivated_level(&self, app: &Application, reason: DeactivateReason) -> HmiLevel {
        let level = app.hmi_level();
        match reason {
            DeactivateReason::PhoneCall => HmiLevel::Background,
            DeactivateReason::Audio => match level {
                HmiLevel::Full | HmiLevel::Limited => HmiLevel::Background,
                other => other,
            },
            DeactivateReason::User | DeactivateReason::Sync | DeactivateReason::Other => {
                if app.is_audio_application() && !self.audio_type_taken(app) {
                    HmiLevel::Limited
                } else {
                    HmiLevel::Background
                }
            }
        }
    }

    /// Whether another application of the same audio type already holds
    /// FULL or LIMITED.
    fn audio_type_taken(&self, app: &Application) -> bool {
        let audio = AppHmiTypes::MEDIA | AppHmiTypes::NAVIGATION | AppHmiTypes::COMMUNICATION;
        let types = app.types() & audio;
        self.services.registry.applications().iter().any(|other| {
            other.app_id() != app.app_id()
                && matches!(other.hmi_level(), HmiLevel::Full | HmiLevel::Limited)
                && other.types().intersects(types)
        })
    }
}
