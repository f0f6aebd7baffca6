use crate::{
    app::Application,
    hmi::{AppId, DeactivateReason, UnregisterReason},
};

/// Inbound events from the HMI and the mobile side.
#[derive(Debug, Clone)]
pub enum HmiEvent {
    AppRegistered {
        app: Application,
    },
    AppUnregistered {
        app_id: AppId,
        reason: UnregisterReason,
    },
    ActivateApp {
        app_id: AppId,
    },
    DeactivateApp {
        app_id: AppId,
        reason: DeactivateReason,
    },
    /// Another audio source (radio, CD, ...) took or released the speaker.
    AudioSourceChanged {
        active: bool,
    },
    VrSessionChanged {
        started: bool,
    },
    TtsSpeakChanged {
        app_id: AppId,
        speaking: bool,
    },
    /// The application sent its own TTS help/timeout prompts.
    TtsGlobalPropertiesSet {
        app_id: AppId,
    },
    /// Something in the application's persisted data changed.
    AppDataChanged {
        app_id: AppId,
    },
}
