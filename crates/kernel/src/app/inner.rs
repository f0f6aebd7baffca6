use crate::hmi::{AppHmiTypes, AppId, HmiAppId, HmiState};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub(crate) struct ApplicationInner {
    pub(crate) app_id: AppId,

    pub(crate) mobile_app_id: String,

    pub(crate) device_id: String,

    /// Assigned at registration, from resumption data when there is some.
    pub(crate) hmi_app_id: Option<HmiAppId>,

    pub(crate) types: AppHmiTypes,

    pub(crate) state: HmiState,

    pub(crate) tts_speak_state: bool,

    pub(crate) hash_id: String,

    hash_seq: u64,

    pub(crate) subscribed_buttons: BTreeSet<String>,
}

impl ApplicationInner {
    pub(crate) fn new(
        app_id: AppId,
        mobile_app_id: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            app_id,
            mobile_app_id: mobile_app_id.into(),
            device_id: device_id.into(),
            hmi_app_id: None,
            types: AppHmiTypes::empty(),
            state: HmiState::NONE,
            tts_speak_state: false,
            hash_id: String::new(),
            hash_seq: 0,
            subscribed_buttons: BTreeSet::new(),
        }
    }

    /// Produce a new opaque hash token; any change of persisted data
    /// invalidates the previous one.
    ///
    /// The sequence continues from the token presented at registration, so
    /// a reconnecting application never gets an earlier token again.
    pub(crate) fn update_hash(&mut self) -> String {
        let presented = token_seq(&self.hash_id).unwrap_or(0);
        self.hash_seq = self.hash_seq.max(presented).wrapping_add(1);
        let hmi_app_id = self.hmi_app_id.map_or(0, |id| id.0);
        self.hash_id = format!("{hmi_app_id:08x}{:08x}", self.hash_seq);
        self.hash_id.clone()
    }

    /// Never issue a token at or below the one in `token`.
    pub(crate) fn seed_hash_seq(&mut self, token: &str) {
        if let Some(seq) = token_seq(token) {
            self.hash_seq = self.hash_seq.max(seq);
        }
    }

    /// Replace the state with `f(state)`. Returns `(old, new)` when it
    /// actually changed.
    pub(crate) fn transition(
        &mut self,
        f: impl FnOnce(HmiState) -> HmiState,
    ) -> Option<(HmiState, HmiState)> {
        let old = self.state;
        let new = f(old);
        if new == old {
            return None;
        }
        self.state = new;
        Some((old, new))
    }
}

/// Sequence part of a token issued by [`ApplicationInner::update_hash`].
/// Tokens the mobile side made up have none.
fn token_seq(token: &str) -> Option<u64> {
    if token.len() < 16 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(&token[8..], 16).ok()
}
