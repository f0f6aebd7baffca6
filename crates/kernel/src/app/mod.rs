mod inner;

use crate::hmi::{AppHmiTypes, AppId, HmiAppId, HmiLevel, HmiState};
use inner::ApplicationInner;
use parking_lot::Mutex;
use std::sync::Arc;

/// A registered mobile application.
///
/// Cheap to clone; all clones share the same record. The registry owns the
/// collection, the arbitrator mutates the HMI state through
/// [`transition`](Application::transition).
#[derive(Debug, Clone)]
pub struct Application(Arc<Mutex<ApplicationInner>>);

impl Application {
    pub fn new(app_id: AppId, mobile_app_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self(Arc::new(Mutex::new(ApplicationInner::new(
            app_id,
            mobile_app_id,
            device_id,
        ))))
    }

    /// HMI types are fixed at registration.
    pub fn with_types(self, types: AppHmiTypes) -> Self {
        self.0.lock().types = types;
        self
    }

    /// Hash the mobile side presented when registering.
    pub fn with_hash_id(self, hash_id: impl Into<String>) -> Self {
        self.0.lock().hash_id = hash_id.into();
        self
    }

    pub fn app_id(&self) -> AppId {
        self.0.lock().app_id
    }

    pub fn mobile_app_id(&self) -> String {
        self.0.lock().mobile_app_id.clone()
    }

    pub fn device_id(&self) -> String {
        self.0.lock().device_id.clone()
    }

    pub fn hmi_app_id(&self) -> Option<HmiAppId> {
        self.0.lock().hmi_app_id
    }

    pub fn set_hmi_app_id(&self, hmi_app_id: HmiAppId) {
        self.0.lock().hmi_app_id = Some(hmi_app_id);
    }

    pub fn types(&self) -> AppHmiTypes {
        self.0.lock().types
    }

    pub fn is_media_application(&self) -> bool {
        self.types().contains(AppHmiTypes::MEDIA)
    }

    pub fn is_navi(&self) -> bool {
        self.types().contains(AppHmiTypes::NAVIGATION)
    }

    pub fn is_audio_application(&self) -> bool {
        self.types().is_audio()
    }

    pub fn state(&self) -> HmiState {
        self.0.lock().state
    }

    pub fn hmi_level(&self) -> HmiLevel {
        self.0.lock().state.level()
    }

    /// Atomically replace the HMI state with `f(current)`.
    ///
    /// Returns `(old, new)` if the state changed, `None` otherwise.
    pub fn transition(&self, f: impl FnOnce(HmiState) -> HmiState) -> Option<(HmiState, HmiState)> {
        self.0.lock().transition(f)
    }

    pub fn tts_speak_state(&self) -> bool {
        self.0.lock().tts_speak_state
    }

    pub fn set_tts_speak_state(&self, speaking: bool) {
        self.0.lock().tts_speak_state = speaking;
    }

    pub fn hash_id(&self) -> String {
        self.0.lock().hash_id.clone()
    }

    /// Make later hash ids follow `token`, one issued in an earlier session.
    pub fn seed_hash(&self, token: &str) {
        self.0.lock().seed_hash_seq(token);
    }

    /// Generate a fresh hash id and return it.
    pub fn update_hash(&self) -> String {
        self.0.lock().update_hash()
    }

    pub fn subscribe_button(&self, button: impl Into<String>) -> bool {
        self.0.lock().subscribed_buttons.insert(button.into())
    }

    pub fn unsubscribe_button(&self, button: &str) -> bool {
        self.0.lock().subscribed_buttons.remove(button)
    }

    pub fn subscribed_buttons(&self) -> Vec<String> {
        self.0.lock().subscribed_buttons.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmi::AudioStreamingState;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_application_has_no_focus() {
        let app = Application::new(AppId(1), "com.example.radio", "dev-1")
            .with_types(AppHmiTypes::MEDIA);
        assert_eq!(app.state(), HmiState::NONE);
        assert!(app.is_media_application());
        assert!(!app.is_navi());
        assert_eq!(app.hmi_app_id(), None);
        assert_eq!(app.hash_id(), "");
    }

    #[test]
    fn transition_reports_only_changes() {
        let app = Application::new(AppId(1), "a", "d").with_types(AppHmiTypes::MEDIA);
        let full = HmiState::for_level(HmiLevel::Full, app.types());

        let (old, new) = app.transition(|_| full).unwrap();
        assert_eq!(old, HmiState::NONE);
        assert_eq!(new.audio(), AudioStreamingState::Audible);
        assert_eq!(app.transition(|_| full), None);
    }

    #[test]
    fn clones_share_state() {
        let app = Application::new(AppId(7), "a", "d");
        let other = app.clone();
        other.set_tts_speak_state(true);
        assert!(app.tts_speak_state());
    }

    #[test]
    fn update_hash_changes_token() {
        let app = Application::new(AppId(7), "a", "d");
        app.set_hmi_app_id(HmiAppId(42));
        let first = app.update_hash();
        let second = app.update_hash();
        assert_ne!(first, second);
        assert_eq!(app.hash_id(), second);
    }

    #[test]
    fn button_subscriptions() {
        let app = Application::new(AppId(7), "a", "d");
        assert!(app.subscribe_button("OK"));
        assert!(!app.subscribe_button("OK"));
        assert!(app.subscribe_button("SEEKLEFT"));
        assert_eq!(app.subscribed_buttons(), vec!["OK", "SEEKLEFT"]);
        assert!(app.unsubscribe_button("OK"));
        assert_eq!(app.subscribed_buttons(), vec!["SEEKLEFT"]);
    }
}
