mod activation;
mod deactivation;
mod event;
mod registration;
mod tts;

pub use event::HmiEvent;

use crate::{
    Error,
    app::Application,
    clock::Clock,
    hmi::{AppId, HmiState},
    notifier::{HmiMessage, HmiNotifier, HmiStatusNotification},
    policy::PolicyCheck,
    registry::ApplicationRegistry,
    resumption::ResumptionStore,
    timer::Timer,
};
use config::Config;
use parking_lot::{Mutex, RwLock};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Duration,
};
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// External collaborators the arbitrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub registry: Arc<dyn ApplicationRegistry>,
    pub notifier: Arc<dyn HmiNotifier>,
    pub policy: Arc<dyn PolicyCheck>,
    pub clock: Arc<dyn Clock>,
}

pub(crate) struct ArbitratorInner {
    services: Collaborators,

    store: ResumptionStore,

    hmi: RwLock<config::Hmi>,

    resumption: RwLock<config::Resumption>,

    vr_session_started: AtomicBool,

    /// Held by every operation that changes HMI state, so rules spanning
    /// several applications (one FULL at a time) see a consistent registry.
    transitions: Mutex<()>,

    next_hmi_app_id: AtomicU32,

    /// One-shot timers restoring a resumed HMI level.
    resume_timers: Mutex<HashMap<AppId, Timer>>,

    /// When each app in FULL gets default TTS global properties.
    tts_deadlines: Mutex<HashMap<AppId, Instant>>,

    tts_timer: Timer,
}

/// Decides which application holds which part of the HMI.
///
/// Cheap to clone. Every handler is total: failures are logged and the
/// event is discarded.
#[derive(Clone)]
pub struct Arbitrator(Arc<ArbitratorInner>);

impl Arbitrator {
    pub fn new(config: &Config, store: ResumptionStore, services: Collaborators) -> Self {
        let inner = Arc::new_cyclic(|weak: &std::sync::Weak<ArbitratorInner>| {
            let weak = weak.clone();
            let tts_timer = Timer::new(
                "TTSGLPRTimer",
                move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.check_tts_deadlines();
                    }
                },
                true,
            );
            ArbitratorInner {
                services,
                store,
                hmi: RwLock::new(config.hmi.clone()),
                resumption: RwLock::new(config.resumption.clone()),
                vr_session_started: AtomicBool::new(false),
                transitions: Mutex::new(()),
                next_hmi_app_id: AtomicU32::new(1),
                resume_timers: Mutex::new(HashMap::new()),
                tts_deadlines: Mutex::new(HashMap::new()),
                tts_timer,
            }
        });
        Self(inner)
    }

    /// Dispatch one inbound event. Never fails; problems are logged.
    pub fn handle(&self, event: HmiEvent) {
        let span = tracing::debug_span!("hmi_event");
        let _enter = span.enter();
        debug!(?event, "handling event");

        let result = match event {
            HmiEvent::AppRegistered { app } => self.register(app),
            HmiEvent::AppUnregistered { app_id, reason } => self.unregister(app_id, reason),
            HmiEvent::ActivateApp { app_id } => self.activate(app_id),
            HmiEvent::DeactivateApp { app_id, reason } => self.deactivate(app_id, reason),
            HmiEvent::AudioSourceChanged { active } => {
                self.audio_source_changed(active);
                Ok(())
            }
            HmiEvent::VrSessionChanged { started } => {
                self.set_vr_session_started(started);
                Ok(())
            }
            HmiEvent::TtsSpeakChanged { app_id, speaking } => self.set_tts_speak_state(app_id, speaking),
            HmiEvent::TtsGlobalPropertiesSet { app_id } => {
                self.0.forget_tts_deadline(app_id);
                Ok(())
            }
            HmiEvent::AppDataChanged { app_id } => self.app_data_changed(app_id),
        };

        match result {
            Ok(()) => {}
            Err(err @ Error::StaleEvent { .. }) => debug!(%err, "discarding stale event"),
            Err(err @ Error::PolicyDenied { .. }) => warn!(%err, "event refused"),
            Err(err) => error!(%err, "event discarded"),
        }
    }

    pub fn set_vr_session_started(&self, started: bool) {
        debug!(started, "VR session");
        self.0.vr_session_started.store(started, Ordering::SeqCst);
    }

    pub fn vr_session_started(&self) -> bool {
        self.0.vr_session_started.load(Ordering::SeqCst)
    }

    pub fn set_tts_speak_state(&self, app_id: AppId, speaking: bool) -> Result<(), Error> {
        let app = self.0.lookup(app_id)?;
        app.set_tts_speak_state(speaking);
        Ok(())
    }

    /// Issue a new hash for the application, persist it and tell the
    /// mobile side.
    pub fn app_data_changed(&self, app_id: AppId) -> Result<(), Error> {
        let app = self.0.lookup(app_id)?;
        let hash_id = app.update_hash();
        self.0.store.save_application(&app, self.0.services.clock.unix_time());
        self.0
            .services
            .notifier
            .send(HmiMessage::HashUpdate { app_id, hash_id });
        Ok(())
    }

    /// Swap the HMI and resumption settings.
    pub fn update_config(&self, config: &Config) {
        *self.0.hmi.write() = config.hmi.clone();
        *self.0.resumption.write() = config.resumption.clone();
        debug!("arbitrator settings updated");
    }

    /// Applications still waiting for their TTS global properties.
    pub fn pending_tts_deadlines(&self) -> usize {
        self.0.tts_deadlines.lock().len()
    }

    pub fn store(&self) -> &ResumptionStore {
        &self.0.store
    }

    pub fn registry(&self) -> &Arc<dyn ApplicationRegistry> {
        &self.0.services.registry
    }
}

impl ArbitratorInner {
    fn lookup(&self, app_id: AppId) -> Result<Application, Error> {
        self.services
            .registry
            .application(app_id)
            .ok_or(Error::AppNotFound(app_id))
    }

    fn now(&self) -> u64 {
        self.services.clock.unix_time()
    }

    /// Apply one state transition: replace the state, send exactly one
    /// status notification and persist the level. Returns whether anything
    /// changed.
    fn apply(&self, app: &Application, f: impl FnOnce(HmiState) -> HmiState) -> bool {
        let Some((old, new)) = app.transition(f) else {
            return false;
        };
        let app_id = app.app_id();
        debug!(%app_id, ?old, ?new, "HMI state changed");
        self.services
            .notifier
            .send(HmiMessage::HmiStatus(HmiStatusNotification::new(app_id, new)));
        self.store
            .update_hmi_level(&app.mobile_app_id(), &app.device_id(), new.level());
        true
    }
}

fn duration_ms(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
