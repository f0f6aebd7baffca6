#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Hmi {
    /// Whether the head unit can mix a media stream under voice prompts.
    ///
    /// When enabled, a media application losing audio focus to a VR session
    /// or a TTS prompt is attenuated instead of silenced.
    pub mixing_audio_supported: bool,

    /// Seconds an application in FULL has to send its own TTS global
    /// properties before defaults are pushed to the HMI.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub tts_global_properties_timeout: Duration,

    /// How often pending TTS global property deadlines are checked.
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    pub tts_check_interval: Duration,
}

impl Default for Hmi {
    fn default() -> Self {
        Self {
            mixing_audio_supported: false,
            tts_global_properties_timeout: Duration::from_secs(20),
            tts_check_interval: Duration::from_millis(1000),
        }
    }
}
