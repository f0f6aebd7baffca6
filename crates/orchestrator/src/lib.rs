#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod persistence;

pub use engine::{ControlEvent, Engine, Services};
pub use error::Error;
pub use persistence::{NoopRepository, SqliteRepository, StateRepository};
