#![forbid(unsafe_code)]

mod error;
mod hmi;
mod persistence;
mod resumption;

pub use error::Error;
pub use hmi::Hmi;
pub use persistence::Persistence;
pub use resumption::Resumption;

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub hmi: Hmi,
    pub resumption: Resumption,
    pub persistence: Persistence,
}

impl Config {
    /// Configuration with every value at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file, falling back to defaults for
    /// anything the file leaves out.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_path_buf()));
        }
        let config = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .extract()?;
        Ok(config)
    }

    /// Render the configuration as a TOML document.
    pub fn to_toml(&self) -> Result<String, Error> {
        Ok(toml_edit::ser::to_string_pretty(self)?)
    }
}
