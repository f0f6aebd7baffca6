use bitflags::bitflags;

bitflags! {
    /// HMI types declared by an application at registration.
    #[repr(transparent)]
    #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct AppHmiTypes: u8 {
        const MEDIA = 0b001;
        const NAVIGATION = 0b010;
        const COMMUNICATION = 0b100;
    }
}

impl AppHmiTypes {
    /// Audio applications may keep the speaker in LIMITED.
    pub const fn is_audio(self) -> bool {
        self.intersects(Self::MEDIA.union(Self::NAVIGATION).union(Self::COMMUNICATION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_types() {
        assert!(AppHmiTypes::MEDIA.is_audio());
        assert!(AppHmiTypes::NAVIGATION.is_audio());
        assert!((AppHmiTypes::MEDIA | AppHmiTypes::COMMUNICATION).is_audio());
        assert!(!AppHmiTypes::empty().is_audio());
    }
}
