use super::{AppHmiTypes, AudioStreamingState, HmiLevel, VideoStreamingState};
use serde::{Deserialize, Serialize};

/// The `{level, audio, video}` triple of one application.
///
/// The triple is always replaced as a whole, so a half-applied transition is
/// never observable. Construction normalizes the value so that an
/// application in NONE is never audible nor streamable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HmiState {
    level: HmiLevel,
    audio: AudioStreamingState,
    video: VideoStreamingState,
}

impl Default for HmiState {
    fn default() -> Self {
        Self::NONE
    }
}

impl HmiState {
    pub const NONE: Self = Self {
        level: HmiLevel::None,
        audio: AudioStreamingState::NotAudible,
        video: VideoStreamingState::NotStreamable,
    };

    pub fn new(level: HmiLevel, audio: AudioStreamingState, video: VideoStreamingState) -> Self {
        match level {
            HmiLevel::None => Self::NONE,
            _ => Self {
                level,
                audio,
                video,
            },
        }
    }

    /// Canonical state of an application of `types` placed at `level`.
    pub fn for_level(level: HmiLevel, types: AppHmiTypes) -> Self {
        match level {
            HmiLevel::None => Self::NONE,
            HmiLevel::Background => Self::new(
                level,
                AudioStreamingState::NotAudible,
                VideoStreamingState::NotStreamable,
            ),
            HmiLevel::Limited | HmiLevel::Full => {
                let audio = if types.is_audio() {
                    AudioStreamingState::Audible
                } else {
                    AudioStreamingState::NotAudible
                };
                let video = if types.contains(AppHmiTypes::NAVIGATION) {
                    VideoStreamingState::Streamable
                } else {
                    VideoStreamingState::NotStreamable
                };
                Self::new(level, audio, video)
            }
        }
    }

    /// Same level, audio attenuated.
    pub fn attenuated(self) -> Self {
        self.with_audio(AudioStreamingState::Attenuated)
    }

    pub fn with_audio(self, audio: AudioStreamingState) -> Self {
        Self::new(self.level, audio, self.video)
    }

    pub const fn level(&self) -> HmiLevel {
        self.level
    }

    pub const fn audio(&self) -> AudioStreamingState {
        self.audio
    }

    pub const fn video(&self) -> VideoStreamingState {
        self.video
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn none_is_never_audible() {
        let state = HmiState::new(
            HmiLevel::None,
            AudioStreamingState::Audible,
            VideoStreamingState::Streamable,
        );
        assert_eq!(state, HmiState::NONE);
        assert_eq!(HmiState::NONE.attenuated(), HmiState::NONE);
    }

    #[test]
    fn canonical_states() {
        let media = HmiState::for_level(HmiLevel::Full, AppHmiTypes::MEDIA);
        assert_eq!(media.audio(), AudioStreamingState::Audible);
        assert_eq!(media.video(), VideoStreamingState::NotStreamable);

        let navi = HmiState::for_level(HmiLevel::Limited, AppHmiTypes::NAVIGATION);
        assert_eq!(navi.audio(), AudioStreamingState::Audible);
        assert_eq!(navi.video(), VideoStreamingState::Streamable);

        let plain = HmiState::for_level(HmiLevel::Full, AppHmiTypes::empty());
        assert_eq!(plain.audio(), AudioStreamingState::NotAudible);

        let background = HmiState::for_level(HmiLevel::Background, AppHmiTypes::MEDIA);
        assert_eq!(background.audio(), AudioStreamingState::NotAudible);
    }
}
