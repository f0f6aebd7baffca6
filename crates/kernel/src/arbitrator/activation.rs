use super::Arbitrator;
use crate::{
    Error,
    hmi::{AppId, HmiLevel, HmiState, SystemAction},
};
use tracing::info;

impl Arbitrator {
    /// Bring `app_id` to FULL. Whoever held FULL before drops to BACKGROUND.
    pub fn activate(&self, app_id: AppId) -> Result<(), Error> {
        let inner = &self.0;
        let _transitions = inner.transitions.lock();

        let app = inner.lookup(app_id)?;
        let mobile_app_id = app.mobile_app_id();
        if !inner
            .services
            .policy
            .is_action_allowed(SystemAction::StealFocus, &mobile_app_id)
        {
            return Err(Error::PolicyDenied {
                action: SystemAction::StealFocus,
                mobile_app_id,
            });
        }

        for other in inner.services.registry.applications() {
            if other.app_id() != app_id && other.hmi_level() == HmiLevel::Full {
                let types = other.types();
                inner.apply(&other, |_| HmiState::for_level(HmiLevel::Background, types));
                inner.forget_tts_deadline(other.app_id());
            }
        }

        let types = app.types();
        if inner.apply(&app, |_| HmiState::for_level(HmiLevel::Full, types)) {
            info!(%app_id, "activated");
            inner.arm_tts_deadline(app_id);
        }
        Ok(())
    }
}
