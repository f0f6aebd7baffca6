#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Resumption {
    /// Delay between registration and restoring the saved HMI level.
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    pub resuming_timeout: Duration,

    /// Ignition cycles after which a saved application is forgotten.
    pub max_ignition_cycles: u32,

    /// After an ignition cycle, the HMI level is only resumed if the
    /// application registers within this window after ignition on.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub resumption_window: Duration,
}

impl Default for Resumption {
    fn default() -> Self {
        Self {
            resuming_timeout: Duration::from_millis(3000),
            max_ignition_cycles: 3,
            resumption_window: Duration::from_secs(30),
        }
    }
}
