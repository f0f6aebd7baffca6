mod ids;
mod state;
mod types;

pub use ids::{AppId, HmiAppId};
pub use state::HmiState;
pub use types::AppHmiTypes;

use crate::Error;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Coarse-grained focus of an application on the head unit.
///
/// Ordered by how much of the HMI the application holds, so `Full` compares
/// greater than `Limited` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HmiLevel {
    None,
    Background,
    Limited,
    Full,
}

impl HmiLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Background => "BACKGROUND",
            Self::Limited => "LIMITED",
            Self::Full => "FULL",
        }
    }
}

impl fmt::Display for HmiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HmiLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Self::None),
            "BACKGROUND" => Ok(Self::Background),
            "LIMITED" => Ok(Self::Limited),
            "FULL" => Ok(Self::Full),
            other => Err(Error::InvalidHmiLevel(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioStreamingState {
    Audible,
    Attenuated,
    NotAudible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStreamingState {
    Streamable,
    NotStreamable,
}

/// Why the HMI took focus away from an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeactivateReason {
    User,
    Audio,
    PhoneCall,
    Sync,
    Other,
}

/// Why an application left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnregisterReason {
    /// The application asked to be unregistered; its resumption data goes.
    Explicit,
    ConnectionLost,
    IgnitionOff,
}

/// Actions the policy collaborator is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemAction {
    DefaultAction,
    StealFocus,
    KeepContext,
}
