use crate::hmi::{
    AppId, AudioStreamingState, HmiAppId, HmiLevel, HmiState, VideoStreamingState,
};
use flume::Sender;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Body of `OnHMIStatus`: the full HMI state of one application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmiStatusNotification {
    pub app_id: AppId,
    pub hmi_level: HmiLevel,
    pub audio_streaming_state: AudioStreamingState,
    pub video_streaming_state: VideoStreamingState,
}

impl HmiStatusNotification {
    pub fn new(app_id: AppId, state: HmiState) -> Self {
        Self {
            app_id,
            hmi_level: state.level(),
            audio_streaming_state: state.audio(),
            video_streaming_state: state.video(),
        }
    }
}

/// Outbound messages towards the HMI and the mobile side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HmiMessage {
    HmiStatus(HmiStatusNotification),
    OnButtonSubscription {
        hmi_app_id: HmiAppId,
        button: String,
        subscribed: bool,
    },
    OnAppUnregistered {
        hmi_app_id: HmiAppId,
        unexpected_disconnect: bool,
    },
    /// Ask the HMI to switch the audio source back to a resumed app.
    OnResumeAudioSource { app_id: AppId },
    /// Tell the mobile side its persisted data changed.
    HashUpdate { app_id: AppId, hash_id: String },
    /// Default TTS help/timeout prompts for an app that never set its own.
    TtsGlobalProperties { app_id: AppId },
}

/// The generic "send to HMI/mobile" primitive. Encoding and transport live
/// on the other side of this trait.
pub trait HmiNotifier: Send + Sync {
    fn send(&self, message: HmiMessage);
}

/// Hands messages to whatever drains the channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier(Sender<HmiMessage>);

impl ChannelNotifier {
    pub fn new(tx: Sender<HmiMessage>) -> Self {
        Self(tx)
    }
}

impl HmiNotifier for ChannelNotifier {
    fn send(&self, message: HmiMessage) {
        if let Err(err) = self.0.send(message) {
            warn!(message = ?err.into_inner(), "outbound channel closed, message dropped");
        }
    }
}
