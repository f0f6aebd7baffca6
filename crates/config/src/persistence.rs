#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::{path::PathBuf, time::Duration};

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Persistence {
    /// Optional path to the resumption database.
    pub state_path: Option<PathBuf>,

    pub save_on_shutdown: bool,

    /// Interval at which store changes made outside the event loop (timer
    /// callbacks) are handed to the persistence worker.
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    pub flush_interval: Duration,
}

impl Default for Persistence {
    fn default() -> Self {
        Self {
            state_path: None,
            save_on_shutdown: true,
            flush_interval: Duration::from_millis(1000),
        }
    }
}
